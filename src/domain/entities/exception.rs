use serde::{Deserialize, Serialize};

use crate::domain::entities::filters::{
    choice_constraint, text_constraint, DomainFilters, EmptyConstraints, FilterFragment,
    FilterMapping, LabelTable,
};

pub const EXCEPTION_ID_KEY: &str = "exceptionId";

const STATUS_LABELS: LabelTable = LabelTable::new(&[
    ("open", "Open"),
    ("in review", "In Review"),
    ("in_review", "In Review"),
    ("approved", "Approved"),
    ("rejected", "Rejected"),
    ("expired", "Expired"),
]);

const SEVERITY_LABELS: LabelTable = LabelTable::new(&[
    ("low", "Low"),
    ("medium", "Medium"),
    ("high", "High"),
    ("critical", "Critical"),
]);

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExceptionFilters {
    pub search: Option<String>,
    pub status: Option<String>,
    pub severity: Option<String>,
    pub owner: Option<String>,
}

impl ExceptionFilters {
    pub const SEARCH: &'static str = "search";
    pub const STATUS: &'static str = "status";
    pub const SEVERITY: &'static str = "severity";
    pub const OWNER: &'static str = "owner";
}

impl DomainFilters for ExceptionFilters {
    fn field(&self, name: &str) -> Option<String> {
        match name {
            Self::SEARCH => self.search.clone(),
            Self::STATUS => self.status.clone(),
            Self::SEVERITY => self.severity.clone(),
            Self::OWNER => self.owner.clone(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExceptionUiFilters {
    pub search: String,
    pub status: String,
    pub severity: String,
    pub owner: String,
}

/// The exceptions service treats a missing key as "no constraint", so unset
/// filters never appear in the query.
pub struct ExceptionMapping;

impl FilterMapping for ExceptionMapping {
    type Domain = ExceptionFilters;
    type Ui = ExceptionUiFilters;

    const EMPTY_CONSTRAINTS: EmptyConstraints = EmptyConstraints::Omit;

    fn simplify(domain: &ExceptionFilters) -> ExceptionUiFilters {
        ExceptionUiFilters {
            search: domain.search.clone().unwrap_or_default(),
            status: domain.status.clone().unwrap_or_default(),
            severity: domain.severity.clone().unwrap_or_default(),
            owner: domain.owner.clone().unwrap_or_default(),
        }
    }

    fn densify(ui: Option<&ExceptionUiFilters>) -> ExceptionFilters {
        let Some(ui) = ui else {
            return ExceptionFilters::default();
        };
        ExceptionFilters {
            search: text_constraint(&ui.search),
            status: choice_constraint(&ui.status),
            severity: choice_constraint(&ui.severity),
            owner: text_constraint(&ui.owner),
        }
    }

    fn materialize(domain: &ExceptionFilters) -> FilterFragment {
        let policy = Self::EMPTY_CONSTRAINTS;
        let mut fragment = FilterFragment::new();
        policy.put(
            &mut fragment,
            ExceptionFilters::SEARCH,
            domain.search.as_deref().map(Into::into),
        );
        policy.put(
            &mut fragment,
            ExceptionFilters::STATUS,
            domain
                .status
                .as_deref()
                .map(|status| STATUS_LABELS.canonicalize(status)),
        );
        policy.put(
            &mut fragment,
            ExceptionFilters::SEVERITY,
            domain
                .severity
                .as_deref()
                .map(|severity| SEVERITY_LABELS.canonicalize(severity)),
        );
        policy.put(
            &mut fragment,
            ExceptionFilters::OWNER,
            domain.owner.as_deref().map(Into::into),
        );
        fragment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn materialize_omits_unset_constraints() {
        let domain = ExceptionMapping::densify(Some(&ExceptionUiFilters {
            search: String::new(),
            status: String::new(),
            ..Default::default()
        }));

        assert!(ExceptionMapping::materialize(&domain).is_empty());
    }

    #[test]
    fn materialize_keeps_only_active_constraints() {
        let fragment = ExceptionMapping::materialize(&ExceptionFilters {
            severity: Some("HIGH".to_string()),
            owner: Some("jlee".to_string()),
            ..Default::default()
        });

        assert_eq!(fragment.len(), 2);
        assert_eq!(fragment.get("severity").map(String::as_str), Some("High"));
        assert_eq!(fragment.get("owner").map(String::as_str), Some("jlee"));
    }

    #[test]
    fn blank_domain_values_are_not_active_constraints() {
        let blank = ExceptionFilters {
            search: Some(String::new()),
            owner: Some("  ".to_string()),
            ..Default::default()
        };

        assert!(ExceptionMapping::materialize(&blank).is_empty());
        assert_eq!(
            ExceptionMapping::densify(Some(&ExceptionMapping::simplify(&blank))),
            ExceptionFilters::default()
        );
    }

    proptest! {
        #[test]
        fn round_trip_through_filter_bar(
            search in ".{0,12}",
            status in prop_oneof![Just("All".to_string()), "[a-z_ ]{0,10}"],
            severity in prop_oneof![Just(String::new()), Just("critical".to_string())],
            owner in "[a-z ]{0,6}",
        ) {
            let reachable = ExceptionMapping::densify(Some(&ExceptionUiFilters { search, status, severity, owner }));
            let round_tripped = ExceptionMapping::densify(Some(&ExceptionMapping::simplify(&reachable)));
            prop_assert_eq!(round_tripped, reachable);
        }
    }
}
