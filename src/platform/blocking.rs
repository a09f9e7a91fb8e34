use tokio_util::sync::CancellationToken;

use crate::usecase::ports::fetch::FetchError;

/// Runs blocking storage work off the async executor.
///
/// The cancellation token is checked before the work starts and again once it
/// finishes; the work itself always runs to completion.
pub async fn run_blocking<F, T>(cancel: &CancellationToken, f: F) -> Result<T, FetchError>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    let outcome = tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| FetchError::failed(format!("storage task failed: {err}")))?;
    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    outcome.map_err(FetchError::from)
}
