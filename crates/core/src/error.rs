use crate::encounter_sync::SyncError;
use crate::store::StoreError;
use serde::Serialize;
use triage_types::{TypesError, VisitStatus};

/// Coarse error category exposed across the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    InvalidTransition,
    AlreadyTriaged,
    DependencyFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot move visit from {from} to {to}")]
    InvalidTransition { from: VisitStatus, to: VisitStatus },
    #[error("visit already triaged (current status {current})")]
    AlreadyTriaged { current: VisitStatus },

    #[error("store operation failed: {0}")]
    Store(#[source] StoreError),
    #[error("clinical record sync failed: {0}")]
    EncounterSync(#[source] SyncError),
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u128,
    },
    #[error("audit log write failed: {0}")]
    AuditWrite(#[source] StoreError),
}

impl TriageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::AlreadyTriaged { .. } => ErrorKind::AlreadyTriaged,
            Self::Store(_) | Self::EncounterSync(_) | Self::Timeout { .. } | Self::AuditWrite(_) => {
                ErrorKind::DependencyFailure
            }
        }
    }

    /// `AlreadyTriaged` is the idempotent-conflict subtype of an invalid transition.
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::InvalidTransition | ErrorKind::AlreadyTriaged
        )
    }

    /// Generic description safe to show outside the engine.
    ///
    /// Never includes identifiers, notes or any other value taken from a record.
    pub fn public_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::NotFound => "The requested record does not exist",
            ErrorKind::InvalidInput => "The request contains missing or malformed fields",
            ErrorKind::InvalidTransition => "The visit cannot move to the requested status",
            ErrorKind::AlreadyTriaged => "The visit has already been triaged",
            ErrorKind::DependencyFailure => "A dependent service failed; try again later",
        }
    }
}

impl From<StoreError> for TriageError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::VisitNotFound(_) => TriageError::NotFound("visit"),
            other => TriageError::Store(other),
        }
    }
}

impl From<SyncError> for TriageError {
    fn from(err: SyncError) -> Self {
        TriageError::EncounterSync(err)
    }
}

impl From<TypesError> for TriageError {
    fn from(err: TypesError) -> Self {
        TriageError::InvalidInput(err.to_string())
    }
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn already_triaged_is_an_invalid_transition_with_its_own_kind() {
        let err = TriageError::AlreadyTriaged {
            current: VisitStatus::InTriage,
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyTriaged);
        assert!(err.is_invalid_transition());
    }

    #[test]
    fn missing_visit_in_store_maps_to_not_found() {
        let err = TriageError::from(StoreError::VisitNotFound(Uuid::new_v4()));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn store_failures_are_dependency_failures() {
        let err = TriageError::from(StoreError::Unavailable("connection reset".into()));
        assert_eq!(err.kind(), ErrorKind::DependencyFailure);
        assert!(!err.is_invalid_transition());
    }

    #[test]
    fn public_message_never_echoes_input() {
        let err = TriageError::InvalidInput("patient Jane Doe".into());
        assert!(!err.public_message().contains("Jane"));
    }

    #[test]
    fn types_error_maps_to_invalid_input() {
        let err = TriageError::from(TypesError::Empty);
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
