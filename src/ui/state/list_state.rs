/// Coarse lifecycle of a list view's data, as a consumer sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Success,
    Error,
}

/// Rows and fetch status bound by a list view.
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState<R> {
    pub rows: Vec<R>,
    pub total_rows: u64,
    pub is_loading: bool,
    pub is_error: bool,
    pub error_message: Option<String>,
    /// Whether any fetch has settled with data yet.
    pub loaded: bool,
}

impl<R> Default for ListViewState<R> {
    fn default() -> Self {
        Self {
            rows: Vec::new(),
            total_rows: 0,
            is_loading: false,
            is_error: false,
            error_message: None,
            loaded: false,
        }
    }
}

impl<R> ListViewState<R> {
    pub fn phase(&self) -> FetchPhase {
        if self.is_loading {
            FetchPhase::Loading
        } else if self.is_error {
            FetchPhase::Error
        } else if self.loaded {
            FetchPhase::Success
        } else {
            FetchPhase::Idle
        }
    }

    pub(crate) fn begin_loading(&mut self) {
        self.is_loading = true;
    }

    pub(crate) fn apply_success(&mut self, items: Vec<R>, total_count: u64) {
        self.rows = items;
        self.total_rows = total_count;
        self.is_loading = false;
        self.is_error = false;
        self.error_message = None;
        self.loaded = true;
    }

    /// Previous rows stay on screen; only the error flags change.
    pub(crate) fn apply_failure(&mut self, message: String) {
        self.is_loading = false;
        self.is_error = true;
        self.error_message = Some(message);
    }

    pub(crate) fn stop_loading(&mut self) {
        self.is_loading = false;
    }
}
