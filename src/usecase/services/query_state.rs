//! Pagination, sort and filter state of one list view.

use std::marker::PhantomData;

use tracing::debug;

use crate::domain::entities::filters::{DomainFilters, FilterMapping};
use crate::domain::entities::query::{PaginationState, PriorityTier, RemoteQuery, SortDescriptor};

/// A change that sends the view back to its first page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetTrigger {
    /// A domain filter field, compared by value.
    Filter(&'static str),
    PageSize,
}

/// What a single state transition changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    pub filters_changed: bool,
    pub sort_changed: bool,
    pub page_reset: bool,
    pub query_changed: bool,
}

pub struct QueryStateController<M: FilterMapping> {
    pagination: PaginationState,
    sorting: SortDescriptor,
    domain_filters: M::Domain,
    reset_triggers: Vec<ResetTrigger>,
    priority_tier: Option<PriorityTier>,
    remote_query: RemoteQuery,
    mapping: PhantomData<M>,
}

impl<M: FilterMapping> QueryStateController<M> {
    pub fn new(pagination: PaginationState) -> Self {
        let domain_filters = M::densify(None);
        let sorting = SortDescriptor::default();
        let remote_query = RemoteQuery::build(&pagination, &sorting, M::materialize(&domain_filters));
        Self {
            pagination,
            sorting,
            domain_filters,
            reset_triggers: Vec::new(),
            priority_tier: None,
            remote_query,
            mapping: PhantomData,
        }
    }

    pub fn with_reset_triggers(mut self, triggers: impl IntoIterator<Item = ResetTrigger>) -> Self {
        self.reset_triggers = triggers.into_iter().collect();
        self
    }

    pub fn with_sorting(mut self, sorting: SortDescriptor) -> Self {
        self.sorting = sorting;
        self.rebuild_query();
        self
    }

    /// Initial filters; setting them here never resets pagination.
    pub fn with_domain_filters(mut self, domain_filters: M::Domain) -> Self {
        self.domain_filters = normalized::<M>(&domain_filters);
        if let Some(tier) = &self.priority_tier {
            self.sorting = tier.sort_for(self.domain_filters.field(tier.status_field).as_deref());
        }
        self.rebuild_query();
        self
    }

    /// Enables the status-priority sort and installs the tier matching the
    /// current status filter.
    pub fn with_priority_tier(mut self, tier: PriorityTier) -> Self {
        self.sorting = tier.sort_for(self.domain_filters.field(tier.status_field).as_deref());
        self.priority_tier = Some(tier);
        self.rebuild_query();
        self
    }

    pub fn pagination(&self) -> PaginationState {
        self.pagination
    }

    pub fn sorting(&self) -> &SortDescriptor {
        &self.sorting
    }

    pub fn domain_filters(&self) -> &M::Domain {
        &self.domain_filters
    }

    pub fn ui_filters(&self) -> M::Ui {
        M::simplify(&self.domain_filters)
    }

    /// Memoized query; only rebuilt when a transition changes its inputs.
    pub fn remote_query(&self) -> &RemoteQuery {
        &self.remote_query
    }

    /// Number of pages for `total_rows`, never less than one.
    pub fn page_count(&self, total_rows: u64) -> u32 {
        let page_size = u64::from(self.pagination.page_size);
        let pages = total_rows.div_ceil(page_size).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    /// Replaces the domain filters in one transition, applying the declared
    /// reset triggers and the priority-tier switch together.
    ///
    /// Blank values are stored as unset.
    pub fn set_domain_filters(&mut self, next: M::Domain) -> Transition {
        let next = normalized::<M>(&next);
        if next == self.domain_filters {
            return Transition::default();
        }

        let mut transition = Transition {
            filters_changed: true,
            ..Transition::default()
        };
        let mut reset = self.reset_triggers.iter().any(|trigger| match trigger {
            ResetTrigger::Filter(field) => self.domain_filters.field(field) != next.field(field),
            ResetTrigger::PageSize => false,
        });

        if let Some(tier) = &self.priority_tier {
            let previous_status = self.domain_filters.field(tier.status_field);
            let next_status = next.field(tier.status_field);
            if previous_status != next_status {
                // Moving between "all statuses" and a specific one always starts over.
                if previous_status.is_some() != next_status.is_some() {
                    reset = true;
                }
                let next_sorting = tier.sort_for(next_status.as_deref());
                if next_sorting != self.sorting {
                    debug!(
                        status = next_status.as_deref().unwrap_or("all"),
                        tiers = next_sorting.len(),
                        "switching priority sort"
                    );
                    self.sorting = next_sorting;
                    transition.sort_changed = true;
                    reset = true;
                }
            }
        }

        self.domain_filters = next;
        if reset && self.pagination.page_index != 0 {
            debug!(from = self.pagination.page_index, "filter change resets pagination");
            self.pagination = self.pagination.with_page_index(0);
            transition.page_reset = true;
        }
        transition.query_changed = self.rebuild_query();
        transition
    }

    pub fn set_ui_filters(&mut self, ui: &M::Ui) -> Transition {
        self.set_domain_filters(M::densify(Some(ui)))
    }

    pub fn set_sorting(&mut self, next: SortDescriptor) -> Transition {
        if next == self.sorting {
            return Transition::default();
        }
        self.sorting = next;
        Transition {
            sort_changed: true,
            query_changed: self.rebuild_query(),
            ..Transition::default()
        }
    }

    pub fn set_pagination(&mut self, next: PaginationState) -> Transition {
        let mut next = PaginationState::new(next.page_index, next.page_size);
        if next == self.pagination {
            return Transition::default();
        }

        let mut transition = Transition::default();
        let size_changed = next.page_size != self.pagination.page_size;
        if size_changed
            && next.page_index != 0
            && self.reset_triggers.contains(&ResetTrigger::PageSize)
        {
            debug!(page_size = next.page_size, "page size change resets pagination");
            next = next.with_page_index(0);
            transition.page_reset = true;
        }

        self.pagination = next;
        transition.query_changed = self.rebuild_query();
        transition
    }

    pub fn set_page_index(&mut self, page_index: u32) -> Transition {
        self.set_pagination(self.pagination.with_page_index(page_index))
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Transition {
        self.set_pagination(PaginationState::new(self.pagination.page_index, page_size))
    }

    fn rebuild_query(&mut self) -> bool {
        let next = RemoteQuery::build(
            &self.pagination,
            &self.sorting,
            M::materialize(&self.domain_filters),
        );
        if next == self.remote_query {
            return false;
        }
        self.remote_query = next;
        true
    }
}

/// Domain filters as the filter bar would hand them back.
fn normalized<M: FilterMapping>(domain: &M::Domain) -> M::Domain {
    M::densify(Some(&M::simplify(domain)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::employee::{
        employee_priority_tier, EmployeeFilters, EmployeeMapping, EmployeeUiFilters,
        EMPLOYEE_ID_KEY,
    };
    use crate::domain::entities::exception::{ExceptionFilters, ExceptionMapping};
    use crate::domain::entities::query::{SortEntry, SortOrder, STATUS_PRIORITY_KEY};

    fn employees() -> QueryStateController<EmployeeMapping> {
        QueryStateController::new(PaginationState::new(4, 20))
            .with_reset_triggers([
                ResetTrigger::Filter(EmployeeFilters::SEARCH),
                ResetTrigger::Filter(EmployeeFilters::DEPARTMENT),
            ])
            .with_priority_tier(employee_priority_tier())
    }

    #[test]
    fn construction_never_resets_pagination() {
        let controller = employees().with_domain_filters(EmployeeFilters {
            search: Some("kim".to_string()),
            ..Default::default()
        });

        assert_eq!(controller.pagination(), PaginationState::new(4, 20));
        assert_eq!(controller.remote_query().page, 5);
    }

    #[test]
    fn declared_field_change_resets_page_index_only() {
        let mut controller = employees();

        let transition = controller.set_domain_filters(EmployeeFilters {
            search: Some("kim".to_string()),
            ..Default::default()
        });

        assert!(transition.page_reset);
        assert_eq!(controller.pagination(), PaginationState::new(0, 20));
        assert_eq!(controller.remote_query().page, 1);
        assert_eq!(controller.remote_query().page_size, 20);
    }

    #[test]
    fn repeated_value_resets_once() {
        let mut controller = employees();
        let filters = EmployeeFilters {
            department: Some("Finance".to_string()),
            ..Default::default()
        };

        assert!(controller.set_domain_filters(filters.clone()).page_reset);
        controller.set_page_index(3);
        let again = controller.set_domain_filters(filters);

        assert_eq!(again, Transition::default());
        assert_eq!(controller.pagination().page_index, 3);
    }

    #[test]
    fn undeclared_field_change_keeps_page() {
        let mut controller = QueryStateController::<ExceptionMapping>::new(PaginationState::new(2, 10))
            .with_reset_triggers([ResetTrigger::Filter(ExceptionFilters::STATUS)]);

        let transition = controller.set_domain_filters(ExceptionFilters {
            owner: Some("jlee".to_string()),
            ..Default::default()
        });

        assert!(transition.filters_changed);
        assert!(transition.query_changed);
        assert!(!transition.page_reset);
        assert_eq!(controller.pagination().page_index, 2);
    }

    #[test]
    fn page_size_change_resets_only_when_declared() {
        let mut plain = QueryStateController::<ExceptionMapping>::new(PaginationState::new(3, 10));
        assert!(!plain.set_page_size(50).page_reset);
        assert_eq!(plain.pagination(), PaginationState::new(3, 50));

        let mut declared = QueryStateController::<ExceptionMapping>::new(PaginationState::new(3, 10))
            .with_reset_triggers([ResetTrigger::PageSize]);
        assert!(declared.set_page_size(50).page_reset);
        assert_eq!(declared.pagination(), PaginationState::new(0, 50));
    }

    #[test]
    fn status_selection_collapses_priority_sort_and_resets() {
        let mut controller = employees();
        assert_eq!(
            controller.sorting().entries(),
            &[
                SortEntry::asc(STATUS_PRIORITY_KEY),
                SortEntry::asc(EMPLOYEE_ID_KEY)
            ]
        );
        assert_eq!(controller.remote_query().sort_by.as_deref(), Some(STATUS_PRIORITY_KEY));

        let transition = controller.set_ui_filters(&EmployeeUiFilters {
            status: "Active".to_string(),
            ..Default::default()
        });

        assert!(transition.sort_changed);
        assert!(transition.page_reset);
        assert_eq!(controller.sorting().entries(), &[SortEntry::asc(EMPLOYEE_ID_KEY)]);
        assert_eq!(controller.pagination().page_index, 0);
        assert_eq!(controller.remote_query().sort_by.as_deref(), Some(EMPLOYEE_ID_KEY));
        assert_eq!(controller.remote_query().sort_order, Some(SortOrder::Asc));
        assert_eq!(controller.remote_query().filter("status"), Some("Active"));
    }

    #[test]
    fn status_selection_resets_even_when_sort_already_collapsed() {
        let mut controller = employees();
        controller.set_sorting(SortDescriptor::single(SortEntry::asc(EMPLOYEE_ID_KEY)));
        controller.set_page_index(3);

        let transition = controller.set_ui_filters(&EmployeeUiFilters {
            status: "Active".to_string(),
            ..Default::default()
        });

        assert!(transition.filters_changed);
        assert!(!transition.sort_changed);
        assert!(transition.page_reset);
        assert_eq!(controller.pagination().page_index, 0);
        assert_eq!(controller.remote_query().page, 1);
    }

    #[test]
    fn clearing_status_reinstalls_tiers_and_resets() {
        let mut controller = employees();
        controller.set_ui_filters(&EmployeeUiFilters {
            status: "Active".to_string(),
            ..Default::default()
        });
        controller.set_page_index(2);

        let transition = controller.set_ui_filters(&EmployeeUiFilters {
            status: "All Status".to_string(),
            ..Default::default()
        });

        assert!(transition.sort_changed);
        assert!(transition.page_reset);
        assert_eq!(controller.sorting().len(), 2);
        assert_eq!(controller.pagination().page_index, 0);
    }

    #[test]
    fn blank_domain_values_are_stored_as_unset() {
        let mut controller = QueryStateController::<ExceptionMapping>::new(PaginationState::new(2, 10))
            .with_reset_triggers([ResetTrigger::Filter(ExceptionFilters::SEARCH)]);

        let transition = controller.set_domain_filters(ExceptionFilters {
            search: Some(String::new()),
            owner: Some("  ".to_string()),
            ..Default::default()
        });

        assert_eq!(transition, Transition::default());
        assert_eq!(controller.domain_filters(), &ExceptionFilters::default());
        assert!(controller.remote_query().filters.is_empty());
        assert_eq!(controller.pagination().page_index, 2);
    }

    #[test]
    fn switching_between_specific_statuses_keeps_single_tier() {
        let mut controller = employees();
        controller.set_ui_filters(&EmployeeUiFilters {
            status: "Active".to_string(),
            ..Default::default()
        });
        controller.set_page_index(2);

        let transition = controller.set_ui_filters(&EmployeeUiFilters {
            status: "Resigned".to_string(),
            ..Default::default()
        });

        assert!(!transition.sort_changed);
        assert!(!transition.page_reset);
        assert_eq!(controller.pagination().page_index, 2);
    }

    #[test]
    fn sorting_changes_do_not_touch_pagination() {
        let mut controller = employees();

        let transition = controller.set_sorting(SortDescriptor::single(SortEntry::desc("hireDate")));

        assert!(transition.sort_changed);
        assert!(!transition.page_reset);
        assert_eq!(controller.remote_query().sort_order, Some(SortOrder::Desc));
        assert_eq!(controller.pagination().page_index, 4);
    }

    #[test]
    fn unchanged_inputs_keep_the_same_query() {
        let mut controller = employees();
        let before = controller.remote_query().clone();

        let transition = controller.set_pagination(PaginationState::new(4, 20));

        assert!(!transition.query_changed);
        assert_eq!(controller.remote_query(), &before);
    }

    #[test]
    fn page_count_rounds_up() {
        let controller = employees();
        assert_eq!(controller.page_count(0), 1);
        assert_eq!(controller.page_count(41), 3);
    }
}
