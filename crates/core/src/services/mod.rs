//! Engine services.
//!
//! Each service is constructed with the shared `CoreConfig` and a store handle and is cheap
//! to clone. Services never retry on their own; retry policy belongs to the caller.

pub mod analytics;
pub mod assessments;
pub mod audit;
pub mod intake;
pub mod visits;

use crate::{TriageError, TriageResult};
use std::future::Future;
use std::time::Duration;

/// Await `fut` for at most `timeout`, converting the outcome into a `TriageResult`.
///
/// Dropping the returned future cancels the underlying call; no partial state is written
/// by this helper itself.
pub(crate) async fn bounded<T, E, F>(
    timeout: Duration,
    operation: &'static str,
    fut: F,
) -> TriageResult<T>
where
    F: Future<Output = Result<T, E>>,
    TriageError: From<E>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result.map_err(TriageError::from),
        Err(_) => {
            tracing::warn!(operation, "operation exceeded its time budget");
            Err(TriageError::Timeout {
                operation,
                timeout_ms: timeout.as_millis(),
            })
        }
    }
}

/// Map a blank actor or creator reference to `InvalidInput`.
pub(crate) fn require_actor(actor: &str) -> TriageResult<triage_types::NonEmptyText> {
    triage_types::NonEmptyText::new(actor)
        .map_err(|_| TriageError::InvalidInput("actor reference is required".into()))
}
