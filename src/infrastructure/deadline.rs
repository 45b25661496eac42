//! Per-call deadlines for remote store operations

use crate::error::{BlobError, StoreError};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Default deadline for a single store call
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors that can express an exceeded deadline
pub trait TimedOut {
    fn timed_out(operation: &str, limit: Duration) -> Self;
}

impl TimedOut for StoreError {
    fn timed_out(operation: &str, limit: Duration) -> Self {
        StoreError::Unavailable(format!("{} timed out after {:?}", operation, limit))
    }
}

impl TimedOut for BlobError {
    fn timed_out(operation: &str, limit: Duration) -> Self {
        BlobError::Unavailable(format!("{} timed out after {:?}", operation, limit))
    }
}

/// Run `fut`, turning an exceeded deadline into the error's unavailable case
pub async fn within<T, E, F>(limit: Duration, operation: &str, fut: F) -> Result<T, E>
where
    F: Future<Output = Result<T, E>>,
    E: TimedOut,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, ?limit, "store call exceeded deadline");
            Err(E::timed_out(operation, limit))
        }
    }
}
