pub mod fetch_orchestrator;
pub mod list_view;
pub mod priority_sort;
pub mod query_state;
