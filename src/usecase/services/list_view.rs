use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::entities::filters::FilterMapping;
use crate::domain::entities::query::{PaginationState, SortDescriptor};
use crate::ui::state::list_state::ListViewState;
use crate::usecase::ports::fetch::PageFetcher;
use crate::usecase::services::fetch_orchestrator::FetchOrchestrator;
use crate::usecase::services::query_state::{QueryStateController, Transition};

/// A list view: query state plus the fetches it drives.
///
/// Every transition that changes the remote query hands the new query to the
/// orchestrator, which drops it when structurally identical to the last one.
pub struct ListView<M: FilterMapping, R: Clone + Send + Sync + 'static> {
    controller: QueryStateController<M>,
    orchestrator: FetchOrchestrator<R>,
    last_fetch: Option<JoinHandle<()>>,
}

impl<M: FilterMapping, R: Clone + Send + Sync + 'static> ListView<M, R> {
    pub fn new(controller: QueryStateController<M>, fetcher: Arc<dyn PageFetcher<Row = R>>) -> Self {
        Self {
            controller,
            orchestrator: FetchOrchestrator::new(fetcher),
            last_fetch: None,
        }
    }

    pub fn with_orchestrator(controller: QueryStateController<M>, orchestrator: FetchOrchestrator<R>) -> Self {
        Self {
            controller,
            orchestrator,
            last_fetch: None,
        }
    }

    pub fn controller(&self) -> &QueryStateController<M> {
        &self.controller
    }

    pub fn state(&self) -> ListViewState<R> {
        self.orchestrator.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListViewState<R>> {
        self.orchestrator.subscribe()
    }

    /// Issues the first fetch for the current query.
    pub fn load(&mut self) {
        self.sync();
    }

    pub fn refresh(&mut self) {
        if let Some(handle) = self.orchestrator.refetch() {
            self.last_fetch = Some(handle);
        }
    }

    pub fn set_domain_filters(&mut self, next: M::Domain) -> Transition {
        let transition = self.controller.set_domain_filters(next);
        self.after(transition)
    }

    pub fn set_ui_filters(&mut self, ui: &M::Ui) -> Transition {
        let transition = self.controller.set_ui_filters(ui);
        self.after(transition)
    }

    pub fn set_sorting(&mut self, next: SortDescriptor) -> Transition {
        let transition = self.controller.set_sorting(next);
        self.after(transition)
    }

    pub fn set_pagination(&mut self, next: PaginationState) -> Transition {
        let transition = self.controller.set_pagination(next);
        self.after(transition)
    }

    pub fn set_page_index(&mut self, page_index: u32) -> Transition {
        let transition = self.controller.set_page_index(page_index);
        self.after(transition)
    }

    pub fn set_page_size(&mut self, page_size: u32) -> Transition {
        let transition = self.controller.set_page_size(page_size);
        self.after(transition)
    }

    /// Waits until the most recent fetch has settled and returns the state.
    pub async fn settled(&mut self) -> ListViewState<R> {
        if let Some(handle) = self.last_fetch.take() {
            // Only a panicking data source makes the task fail; its state update is lost either way.
            let _ = handle.await;
        }
        self.state()
    }

    fn after(&mut self, transition: Transition) -> Transition {
        if transition.query_changed {
            self.sync();
        }
        transition
    }

    fn sync(&mut self) {
        if let Some(handle) = self.orchestrator.sync(self.controller.remote_query()) {
            self.last_fetch = Some(handle);
        }
    }
}
