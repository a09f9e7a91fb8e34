use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::entities::query::{FetchResult, RemoteQuery};

/// Message shown when a failing data source gives no explanation of its own.
pub const GENERIC_FETCH_ERROR: &str = "Failed to load data";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request was superseded or aborted; never shown to users.
    #[error("request cancelled")]
    Cancelled,
    #[error("request timed out")]
    TimedOut,
    #[error("{0}")]
    Failed(String),
}

impl FetchError {
    pub fn failed(message: impl Into<String>) -> Self {
        FetchError::Failed(message.into())
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, FetchError::Cancelled)
    }

    /// Human-readable text for the view's error banner.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Failed(message) if message.trim().is_empty() => {
                GENERIC_FETCH_ERROR.to_string()
            }
            other => other.to_string(),
        }
    }
}

impl From<anyhow::Error> for FetchError {
    fn from(err: anyhow::Error) -> Self {
        FetchError::Failed(format!("{err:#}"))
    }
}

/// Paged query capability a list view is wired to.
///
/// Cancellation is advisory: an implementation may abort its physical request
/// when `cancel` fires, or finish it and let the caller discard the result.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    type Row: Clone + Send + Sync + 'static;

    async fn fetch_page(
        &self,
        query: &RemoteQuery,
        cancel: CancellationToken,
    ) -> Result<FetchResult<Self::Row>, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_failures_fall_back_to_generic_message() {
        assert_eq!(FetchError::failed("").user_message(), GENERIC_FETCH_ERROR);
        assert_eq!(
            FetchError::failed("connection refused").user_message(),
            "connection refused"
        );
        assert_eq!(FetchError::TimedOut.user_message(), "request timed out");
    }

    #[test]
    fn only_cancellation_is_classified_as_cancellation() {
        assert!(FetchError::Cancelled.is_cancellation());
        assert!(!FetchError::TimedOut.is_cancellation());
        assert!(!FetchError::failed("boom").is_cancellation());
    }
}
