//! Filter mapping between the domain, the filter bar and the data source.
//!
//! Every entity supplies three total functions through [`FilterMapping`]:
//! `simplify` projects domain filters into the bindable filter-bar shape,
//! `densify` maps the filter-bar shape back into domain filters, and
//! `materialize` produces the exact key/value fragment a remote query carries.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Materialized filter keys and their string values.
pub type FilterFragment = BTreeMap<String, String>;

/// How an entity represents "no constraint" when materializing filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyConstraints {
    /// Unset constraints are left out of the fragment.
    Omit,
    /// Every filter key is always present; unset constraints are sent as `""`.
    Sentinel,
}

impl EmptyConstraints {
    /// Writes one constraint into `fragment` following this policy.
    ///
    /// Blank values are treated as unset.
    pub fn put(self, fragment: &mut FilterFragment, key: &str, value: Option<Cow<'_, str>>) {
        let value = value.filter(|value| !value.trim().is_empty());
        match (self, value) {
            (_, Some(value)) => {
                fragment.insert(key.to_string(), value.into_owned());
            }
            (EmptyConstraints::Sentinel, None) => {
                fragment.insert(key.to_string(), String::new());
            }
            (EmptyConstraints::Omit, None) => {}
        }
    }
}

/// Domain filters expose their fields by name so reset policies can compare
/// individual values.
pub trait DomainFilters: Clone + Debug + Default + PartialEq + Send + Sync + 'static {
    /// Value of `field`, `None` when unconstrained or unknown.
    fn field(&self, name: &str) -> Option<String>;
}

pub trait FilterMapping: Send + Sync + 'static {
    type Domain: DomainFilters;
    type Ui: Clone + Debug + Default + PartialEq + Send + Sync + 'static;

    const EMPTY_CONSTRAINTS: EmptyConstraints;

    fn simplify(domain: &Self::Domain) -> Self::Ui;

    /// `None` yields the all-unset domain filters.
    fn densify(ui: Option<&Self::Ui>) -> Self::Domain;

    fn materialize(domain: &Self::Domain) -> FilterFragment;
}

/// Closed table of canonical labels keyed by their lowercase spellings.
///
/// Labels missing from the table pass through unchanged.
#[derive(Debug, Clone, Copy)]
pub struct LabelTable {
    entries: &'static [(&'static str, &'static str)],
}

impl LabelTable {
    pub const fn new(entries: &'static [(&'static str, &'static str)]) -> Self {
        Self { entries }
    }

    pub fn canonicalize<'a>(&self, value: &'a str) -> Cow<'a, str> {
        let lowered = value.trim().to_lowercase();
        match self.entries.iter().find(|(key, _)| *key == lowered) {
            Some((_, canonical)) => Cow::Borrowed(*canonical),
            None => Cow::Borrowed(value),
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        let lowered = value.trim().to_lowercase();
        self.entries.iter().any(|(key, _)| *key == lowered)
    }
}

/// Free-text filter value: blank input means no constraint.
pub fn text_constraint(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Select-style filter value: blank input and the "All ..." choices mean no constraint.
pub fn choice_constraint(value: &str) -> Option<String> {
    text_constraint(value).filter(|value| !is_all_choice(value))
}

fn is_all_choice(value: &str) -> bool {
    let lowered = value.to_lowercase();
    lowered == "all" || lowered.starts_with("all ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELS: LabelTable =
        LabelTable::new(&[("active", "Active"), ("on leave", "On Leave"), ("on_leave", "On Leave")]);

    #[test]
    fn label_table_canonicalizes_case_insensitively() {
        assert_eq!(LABELS.canonicalize("ACTIVE"), "Active");
        assert_eq!(LABELS.canonicalize("on_leave"), "On Leave");
        assert!(LABELS.contains(" On Leave "));
    }

    #[test]
    fn unknown_labels_pass_through() {
        assert_eq!(LABELS.canonicalize("Sabbatical"), "Sabbatical");
        assert!(!LABELS.contains("Sabbatical"));
    }

    #[test]
    fn all_choices_are_unconstrained() {
        assert_eq!(choice_constraint("All Status"), None);
        assert_eq!(choice_constraint("all"), None);
        assert_eq!(choice_constraint("  "), None);
        assert_eq!(choice_constraint("Active"), Some("Active".to_string()));
        assert_eq!(text_constraint("All hands"), Some("All hands".to_string()));
    }

    #[test]
    fn empty_constraint_policies() {
        let mut omitted = FilterFragment::new();
        EmptyConstraints::Omit.put(&mut omitted, "status", None);
        assert!(omitted.is_empty());

        let mut sentinel = FilterFragment::new();
        EmptyConstraints::Sentinel.put(&mut sentinel, "status", None);
        assert_eq!(sentinel.get("status").map(String::as_str), Some(""));
    }

    #[test]
    fn blank_values_follow_the_unset_policy() {
        let mut omitted = FilterFragment::new();
        EmptyConstraints::Omit.put(&mut omitted, "search", Some("".into()));
        EmptyConstraints::Omit.put(&mut omitted, "owner", Some("  ".into()));
        assert!(omitted.is_empty());

        let mut sentinel = FilterFragment::new();
        EmptyConstraints::Sentinel.put(&mut sentinel, "search", Some(" \t".into()));
        assert_eq!(sentinel.get("search").map(String::as_str), Some(""));
    }
}
