//! Cancellable, stale-safe fetching for one list view.
//!
//! Every started fetch gets a new generation number and its own cancellation
//! token; starting another fetch cancels the previous token. A result is only
//! applied when its generation is still the latest, so a slow response can
//! never overwrite a newer one even if the data source ignores cancellation.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::domain::entities::query::{FetchResult, RemoteQuery};
use crate::ui::state::list_state::ListViewState;
use crate::usecase::ports::fetch::{FetchError, PageFetcher};

#[derive(Default)]
struct Tracker {
    generation: u64,
    last_query: Option<RemoteQuery>,
    in_flight: Option<CancellationToken>,
}

struct Shared<R> {
    state: watch::Sender<ListViewState<R>>,
    tracker: Mutex<Tracker>,
}

impl<R> Shared<R> {
    fn tracker(&self) -> MutexGuard<'_, Tracker> {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn settle(&self, generation: u64, outcome: Result<FetchResult<R>, FetchError>) {
        let mut tracker = self.tracker();
        if tracker.generation != generation {
            debug!(
                generation,
                latest = tracker.generation,
                "discarding superseded fetch"
            );
            return;
        }
        tracker.in_flight = None;

        match outcome {
            Ok(result) => {
                debug!(generation, rows = result.items.len(), total = result.total_count, "fetch settled");
                self.state
                    .send_modify(|state| state.apply_success(result.items, result.total_count));
            }
            Err(err) if err.is_cancellation() => {
                debug!(generation, "fetch cancelled by data source");
                self.state.send_modify(ListViewState::stop_loading);
            }
            Err(err) => {
                warn!(generation, error = %err, "fetch failed");
                let message = err.user_message();
                self.state
                    .send_modify(|state| state.apply_failure(message));
            }
        }
    }
}

pub struct FetchOrchestrator<R: Clone + Send + Sync + 'static> {
    fetcher: Arc<dyn PageFetcher<Row = R>>,
    shared: Arc<Shared<R>>,
    timeout: Option<Duration>,
}

impl<R: Clone + Send + Sync + 'static> FetchOrchestrator<R> {
    pub fn new(fetcher: Arc<dyn PageFetcher<Row = R>>) -> Self {
        let (state, _) = watch::channel(ListViewState::default());
        Self {
            fetcher,
            shared: Arc::new(Shared {
                state,
                tracker: Mutex::new(Tracker::default()),
            }),
            timeout: None,
        }
    }

    /// Fetches that outlive `timeout` are cancelled and reported as errors.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> ListViewState<R> {
        self.shared.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ListViewState<R>> {
        self.shared.state.subscribe()
    }

    /// Starts a fetch when `query` differs from the last one requested.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn sync(&self, query: &RemoteQuery) -> Option<JoinHandle<()>> {
        if self.shared.tracker().last_query.as_ref() == Some(query) {
            return None;
        }
        Some(self.start(query.clone()))
    }

    /// Fetches the last requested query again.
    pub fn refetch(&self) -> Option<JoinHandle<()>> {
        let query = self.shared.tracker().last_query.clone()?;
        Some(self.start(query))
    }

    /// Abandons the in-flight fetch, if any, without touching loaded rows.
    ///
    /// The abandoned query is forgotten, so syncing it again fetches it.
    pub fn cancel(&self) {
        let mut tracker = self.shared.tracker();
        if let Some(token) = tracker.in_flight.take() {
            token.cancel();
            tracker.generation += 1;
            tracker.last_query = None;
            self.shared.state.send_modify(ListViewState::stop_loading);
        }
    }

    fn start(&self, query: RemoteQuery) -> JoinHandle<()> {
        let (generation, token) = {
            let mut tracker = self.shared.tracker();
            if let Some(previous) = tracker.in_flight.take() {
                previous.cancel();
            }
            tracker.generation += 1;
            let token = CancellationToken::new();
            tracker.in_flight = Some(token.clone());
            tracker.last_query = Some(query.clone());
            self.shared.state.send_modify(ListViewState::begin_loading);
            (tracker.generation, token)
        };
        debug!(generation, page = query.page, sort_by = ?query.sort_by, "starting fetch");

        let fetcher = Arc::clone(&self.fetcher);
        let shared = Arc::clone(&self.shared);
        let timeout = self.timeout;
        tokio::spawn(async move {
            let request = fetcher.fetch_page(&query, token.clone());
            let outcome = match timeout {
                Some(limit) => match tokio::time::timeout(limit, request).await {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        token.cancel();
                        Err(FetchError::TimedOut)
                    }
                },
                None => request.await,
            };
            shared.settle(generation, outcome);
        })
    }
}

impl<R: Clone + Send + Sync + 'static> Drop for FetchOrchestrator<R> {
    fn drop(&mut self) {
        let mut tracker = self.shared.tracker();
        if let Some(token) = tracker.in_flight.take() {
            token.cancel();
        }
        tracker.generation += 1;
    }
}
