use serde::{Deserialize, Serialize};

use crate::domain::entities::filters::{
    choice_constraint, text_constraint, DomainFilters, EmptyConstraints, FilterFragment,
    FilterMapping, LabelTable,
};
use crate::domain::entities::query::PriorityTier;

pub const EMPLOYEE_ID_KEY: &str = "employeeId";

/// Status ranking used while the status filter is unset.
pub const EMPLOYEE_STATUS_PRIORITY: &[&str] = &["Active", "On Leave", "Resigned", "Terminated"];

const STATUS_LABELS: LabelTable = LabelTable::new(&[
    ("active", "Active"),
    ("on leave", "On Leave"),
    ("on_leave", "On Leave"),
    ("onleave", "On Leave"),
    ("resigned", "Resigned"),
    ("terminated", "Terminated"),
]);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EmployeeFilters {
    pub search: Option<String>,
    pub status: Option<String>,
    pub department: Option<String>,
}

impl EmployeeFilters {
    pub const SEARCH: &'static str = "search";
    pub const STATUS: &'static str = "status";
    pub const DEPARTMENT: &'static str = "department";
}

impl DomainFilters for EmployeeFilters {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            Self::SEARCH => self.search.clone(),
            Self::STATUS => self.status.clone(),
            Self::DEPARTMENT => self.department.clone(),
            _ => None,
        }
    }
}

/// Filter-bar shape; an empty string selects "All".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeUiFilters {
    pub search: String,
    pub status: String,
    pub department: String,
}

/// The employee directory service expects every filter key on every request,
/// with `""` standing for "no constraint".
pub struct EmployeeMapping;

impl FilterMapping for EmployeeMapping {
    type Domain = EmployeeFilters;
    type Ui = EmployeeUiFilters;

    const EMPTY_CONSTRAINTS: EmptyConstraints = EmptyConstraints::Sentinel;

    fn simplify(domain: &EmployeeFilters) -> EmployeeUiFilters {
        EmployeeUiFilters {
            search: domain.search.clone().unwrap_or_default(),
            status: domain.status.clone().unwrap_or_default(),
            department: domain.department.clone().unwrap_or_default(),
        }
    }

    fn densify(ui: Option<&EmployeeUiFilters>) -> EmployeeFilters {
        let Some(ui) = ui else {
            return EmployeeFilters::default();
        };
        EmployeeFilters {
            search: text_constraint(&ui.search),
            status: choice_constraint(&ui.status),
            department: choice_constraint(&ui.department),
        }
    }

    fn materialize(domain: &EmployeeFilters) -> FilterFragment {
        let policy = Self::EMPTY_CONSTRAINTS;
        let mut fragment = FilterFragment::new();
        policy.put(
            &mut fragment,
            EmployeeFilters::SEARCH,
            domain.search.as_deref().map(Into::into),
        );
        policy.put(
            &mut fragment,
            EmployeeFilters::STATUS,
            domain
                .status
                .as_deref()
                .map(|status| STATUS_LABELS.canonicalize(status)),
        );
        policy.put(
            &mut fragment,
            EmployeeFilters::DEPARTMENT,
            domain.department.as_deref().map(Into::into),
        );
        fragment
    }
}

pub fn employee_priority_tier() -> PriorityTier {
    PriorityTier::new(EmployeeFilters::STATUS, EMPLOYEE_ID_KEY)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn densify_of_nothing_is_unconstrained() {
        assert_eq!(EmployeeMapping::densify(None), EmployeeFilters::default());
    }

    #[test]
    fn simplify_supplies_bindable_defaults() {
        let ui = EmployeeMapping::simplify(&EmployeeFilters::default());
        assert_eq!(ui, EmployeeUiFilters::default());
    }

    #[test]
    fn densify_drops_empty_and_all_choices() {
        let domain = EmployeeMapping::densify(Some(&EmployeeUiFilters {
            search: "  ".to_string(),
            status: "All Status".to_string(),
            department: "Finance".to_string(),
        }));

        assert_eq!(
            domain,
            EmployeeFilters {
                search: None,
                status: None,
                department: Some("Finance".to_string()),
            }
        );
    }

    #[test]
    fn materialize_sends_sentinel_empties() {
        let fragment = EmployeeMapping::materialize(&EmployeeFilters::default());

        let expected: FilterFragment = [("department", ""), ("search", ""), ("status", "")]
            .into_iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        assert_eq!(fragment, expected);
    }

    #[test]
    fn blank_domain_values_materialize_as_sentinels() {
        let fragment = EmployeeMapping::materialize(&EmployeeFilters {
            search: Some(" ".to_string()),
            department: Some(String::new()),
            ..Default::default()
        });

        assert_eq!(fragment, EmployeeMapping::materialize(&EmployeeFilters::default()));
    }

    #[test]
    fn materialize_canonicalizes_status_labels() {
        let fragment = EmployeeMapping::materialize(&EmployeeFilters {
            status: Some("on_leave".to_string()),
            ..Default::default()
        });
        assert_eq!(fragment.get("status").map(String::as_str), Some("On Leave"));

        let fragment = EmployeeMapping::materialize(&EmployeeFilters {
            status: Some("Contractor".to_string()),
            ..Default::default()
        });
        assert_eq!(fragment.get("status").map(String::as_str), Some("Contractor"));
    }

    proptest! {
        #[test]
        fn round_trip_through_filter_bar(
            search in ".{0,12}",
            status in prop_oneof![Just(String::new()), Just("All Status".to_string()), "[A-Za-z ]{0,10}"],
            department in "[A-Za-z]{0,8}",
        ) {
            let reachable = EmployeeMapping::densify(Some(&EmployeeUiFilters { search, status, department }));
            let round_tripped = EmployeeMapping::densify(Some(&EmployeeMapping::simplify(&reachable)));
            prop_assert_eq!(round_tripped, reachable);
        }
    }
}
