//! Visit store adapter.
//!
//! The engine never talks to a database directly. Every component receives an
//! `Arc<dyn VisitStore>` at construction and performs all reads and writes through it.
//!
//! Contract highlights:
//! - Visit status updates are conditional on an expected current status and are applied
//!   atomically, which serialises concurrent transitions on the same visit.
//! - Assessments, vitals and audit entries are append-only.
//! - Reads return owned snapshots; a visit never appears in two states within one read.

mod memory;

pub use memory::InMemoryVisitStore;

use crate::records::{
    AuditLogEntry, EwsAssessment, Visit, VisitCorrection, VisitUpdate, VitalsRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use triage_types::VisitStatus;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("visit {0} does not exist")]
    VisitNotFound(Uuid),
    #[error("visit {0} already exists")]
    DuplicateVisit(Uuid),
    #[error("status precondition failed: expected {expected}, found {actual}")]
    StatusConflict {
        expected: VisitStatus,
        actual: VisitStatus,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait VisitStore: Send + Sync {
    async fn insert_visit(&self, visit: Visit) -> StoreResult<()>;

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<Visit>>;

    /// Set the status of a visit.
    ///
    /// When `expected_current` is given the write only happens if the stored status still
    /// equals it; otherwise `StoreError::StatusConflict` is returned and nothing changes.
    async fn update_visit_status(
        &self,
        id: Uuid,
        status: VisitStatus,
        expected_current: Option<VisitStatus>,
    ) -> StoreResult<VisitUpdate>;

    /// Persist an external encounter id and a new status in one atomic write.
    async fn assign_encounter(
        &self,
        id: Uuid,
        encounter_id: String,
        status: VisitStatus,
        expected_current: VisitStatus,
    ) -> StoreResult<VisitUpdate>;

    /// Apply a registrar correction unconditionally.
    async fn apply_correction(
        &self,
        id: Uuid,
        correction: &VisitCorrection,
    ) -> StoreResult<VisitUpdate>;

    async fn list_visits_by_status(&self, statuses: &[VisitStatus]) -> StoreResult<Vec<Visit>>;

    /// Visits that arrived at or after `since`, oldest first.
    async fn list_visits_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Visit>>;

    async fn append_assessment(&self, record: EwsAssessment) -> StoreResult<()>;

    /// All assessments for a visit in append order.
    async fn list_assessments_for_visit(&self, visit_id: Uuid) -> StoreResult<Vec<EwsAssessment>>;

    async fn append_vitals(&self, record: VitalsRecord) -> StoreResult<()>;

    async fn earliest_vitals_for_visit(&self, visit_id: Uuid)
        -> StoreResult<Option<VitalsRecord>>;

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> StoreResult<()>;

    /// Audit entries for one entity in append order.
    async fn list_audit_entries(&self, entity_ref: &str) -> StoreResult<Vec<AuditLogEntry>>;
}
