use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::dataset::Row;
use crate::domain::entities::query::{FetchResult, RemoteQuery};
use crate::infra::sqlite::queries::{query_page, PrioritySortKey, SourceOptions};
use crate::platform::blocking::run_blocking;
use crate::usecase::ports::fetch::{FetchError, PageFetcher};

/// Paged data source over one dataset of the local inventory database.
pub struct SqlitePageSource {
    pub db_path: PathBuf,
    pub dataset: String,
    options: Arc<SourceOptions>,
}

impl SqlitePageSource {
    pub fn new(db_path: impl Into<PathBuf>, dataset: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            dataset: dataset.into(),
            options: Arc::new(SourceOptions::default()),
        }
    }

    pub fn with_options(mut self, options: SourceOptions) -> Self {
        self.options = Arc::new(options);
        self
    }

    /// Serves `sort_key` by ranking `status_column` through `order`, ties
    /// broken by `secondary_column`.
    pub fn with_priority_key(
        mut self,
        sort_key: impl Into<String>,
        status_column: impl Into<String>,
        order: &[&str],
        secondary_column: impl Into<String>,
    ) -> Self {
        let mut options = (*self.options).clone();
        options.priority_keys.insert(
            sort_key.into(),
            PrioritySortKey {
                status_column: status_column.into(),
                order: order.iter().map(|status| status.to_string()).collect(),
                secondary_column: secondary_column.into(),
            },
        );
        self.options = Arc::new(options);
        self
    }
}

#[async_trait]
impl PageFetcher for SqlitePageSource {
    type Row = Row;

    async fn fetch_page(
        &self,
        query: &RemoteQuery,
        cancel: CancellationToken,
    ) -> Result<FetchResult<Row>, FetchError> {
        let db_path = self.db_path.clone();
        let dataset = self.dataset.clone();
        let options = Arc::clone(&self.options);
        let query = query.clone();
        run_blocking(&cancel, move || {
            query_page(&db_path, &dataset, &query, &options)
        })
        .await
    }
}
