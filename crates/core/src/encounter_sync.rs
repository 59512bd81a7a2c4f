//! Outbound push of a visit to the downstream clinical record system.
//!
//! The transport (FHIR, vendor API) lives outside the engine. Implementations return the
//! encounter id the downstream system assigned; the state machine persists it together
//! with the status change.

use crate::records::Visit;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    #[error("downstream rejected the encounter: {0}")]
    Rejected(String),
    #[error("downstream unavailable: {0}")]
    Unavailable(String),
    #[error("downstream returned an empty encounter id")]
    EmptyEncounterId,
}

#[async_trait]
pub trait EncounterSync: Send + Sync {
    /// Push the visit and return the downstream encounter id.
    async fn push_encounter(&self, visit: &Visit) -> Result<String, SyncError>;
}
