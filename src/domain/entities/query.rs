//! Pagination, sorting and the query shape sent to a paged data source.

use serde::{Deserialize, Serialize};

use crate::domain::entities::filters::FilterFragment;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Sort key understood by data sources as "rank by status priority".
pub const STATUS_PRIORITY_KEY: &str = "status_priority";

/// Zero-based page position plus page size of one list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    pub page_index: u32,
    pub page_size: u32,
}

impl PaginationState {
    /// `page_size` is clamped to at least one row.
    pub fn new(page_index: u32, page_size: u32) -> Self {
        Self {
            page_index,
            page_size: page_size.max(1),
        }
    }

    pub fn first_page(page_size: u32) -> Self {
        Self::new(0, page_size)
    }

    pub fn with_page_index(self, page_index: u32) -> Self {
        Self::new(page_index, self.page_size)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page_index) * u64::from(self.page_size)
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::first_page(DEFAULT_PAGE_SIZE)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_descending(descending: bool) -> Self {
        if descending {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortEntry {
    pub key: String,
    pub descending: bool,
}

impl SortEntry {
    pub fn asc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: false,
        }
    }

    pub fn desc(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            descending: true,
        }
    }
}

/// Ordered sort keys; the first entry is the primary one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SortDescriptor(Vec<SortEntry>);

impl SortDescriptor {
    pub fn new(entries: Vec<SortEntry>) -> Self {
        Self(entries)
    }

    pub fn single(entry: SortEntry) -> Self {
        Self(vec![entry])
    }

    pub fn primary(&self) -> Option<&SortEntry> {
        self.0.first()
    }

    pub fn entries(&self) -> &[SortEntry] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<Vec<SortEntry>> for SortDescriptor {
    fn from(entries: Vec<SortEntry>) -> Self {
        Self(entries)
    }
}

/// Two-tier sort installed while a view's status filter is unset.
///
/// With no status constraint rows are ranked by status priority and then by
/// the stable identifier; once a status is picked only the identifier is left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriorityTier {
    pub status_field: &'static str,
    pub id_key: String,
}

impl PriorityTier {
    pub fn new(status_field: &'static str, id_key: impl Into<String>) -> Self {
        Self {
            status_field,
            id_key: id_key.into(),
        }
    }

    pub fn sort_for(&self, status: Option<&str>) -> SortDescriptor {
        match status {
            None => SortDescriptor::new(vec![
                SortEntry::asc(STATUS_PRIORITY_KEY),
                SortEntry::asc(self.id_key.clone()),
            ]),
            Some(_) => SortDescriptor::single(SortEntry::asc(self.id_key.clone())),
        }
    }
}

/// Query shape handed to a paged data source.
///
/// Serializes as `{ page, pageSize, sortBy?, sortOrder?, ...filters }` with a
/// one-based `page`. Two descriptors that compare equal describe the same
/// request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteQuery {
    pub page: u32,
    pub page_size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
    #[serde(flatten)]
    pub filters: FilterFragment,
}

impl RemoteQuery {
    pub fn build(
        pagination: &PaginationState,
        sorting: &SortDescriptor,
        filters: FilterFragment,
    ) -> Self {
        let primary = sorting.primary();
        Self {
            page: pagination.page_index.saturating_add(1),
            page_size: pagination.page_size,
            sort_by: primary.map(|entry| entry.key.clone()),
            sort_order: primary.map(|entry| SortOrder::from_descending(entry.descending)),
            filters,
        }
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Row offset of the requested page; page numbers below one count as the first page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.page_size)
    }
}

/// One page of rows plus the size of the whole filtered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult<R> {
    pub items: Vec<R>,
    pub total_count: u64,
}

impl<R> FetchResult<R> {
    pub fn new(items: Vec<R>, total_count: u64) -> Self {
        Self { items, total_count }
    }

    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            total_count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pagination_clamps_page_size() {
        let pagination = PaginationState::new(3, 0);
        assert_eq!(pagination.page_size, 1);
        assert_eq!(pagination.offset(), 3);
    }

    #[test]
    fn remote_query_is_one_based_and_uses_primary_sort() {
        let sorting = SortDescriptor::new(vec![
            SortEntry::desc("hireDate"),
            SortEntry::asc("employeeId"),
        ]);
        let mut filters = FilterFragment::new();
        filters.insert("status".to_string(), "Active".to_string());

        let query = RemoteQuery::build(&PaginationState::new(2, 25), &sorting, filters);

        assert_eq!(query.page, 3);
        assert_eq!(query.page_size, 25);
        assert_eq!(query.sort_by.as_deref(), Some("hireDate"));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
        assert_eq!(query.offset(), 50);
        assert_eq!(
            serde_json::to_value(&query).expect("query should serialize"),
            json!({
                "page": 3,
                "pageSize": 25,
                "sortBy": "hireDate",
                "sortOrder": "desc",
                "status": "Active"
            })
        );
    }

    #[test]
    fn remote_query_without_sort_omits_sort_fields() {
        let query = RemoteQuery::build(
            &PaginationState::default(),
            &SortDescriptor::default(),
            FilterFragment::new(),
        );

        assert_eq!(
            serde_json::to_value(&query).expect("query should serialize"),
            json!({ "page": 1, "pageSize": DEFAULT_PAGE_SIZE })
        );
    }

    #[test]
    fn priority_tier_collapses_when_status_is_selected() {
        let tier = PriorityTier::new("status", "employeeId");

        assert_eq!(
            tier.sort_for(None).entries(),
            &[
                SortEntry::asc(STATUS_PRIORITY_KEY),
                SortEntry::asc("employeeId")
            ]
        );
        assert_eq!(
            tier.sort_for(Some("Active")).entries(),
            &[SortEntry::asc("employeeId")]
        );
    }
}
