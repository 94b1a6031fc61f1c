use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;

/// Runs one store operation under its own timeout, resolving early with
/// `Cancelled` once `cancel` fires. An elapsed timeout fails only this operation.
pub(crate) async fn guarded<T, F>(
    operation: F,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<T, CoreError>
where
    F: Future<Output = Result<T, CoreError>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(CoreError::Cancelled),
        result = tokio::time::timeout(limit, operation) => {
            result.unwrap_or(Err(CoreError::Timeout(limit)))
        }
    }
}
