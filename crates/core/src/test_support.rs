//! Shared fixtures for unit tests across the services.

use crate::records::{
    AuditLogEntry, EwsAssessment, Visit, VisitCorrection, VisitUpdate, VitalsRecord,
};
use crate::store::{InMemoryVisitStore, StoreError, StoreResult, VisitStore};
use crate::CoreConfig;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use triage_types::{ArrivalPath, NonEmptyText, VisitStatus};
use uuid::Uuid;

pub(crate) fn test_config() -> Arc<CoreConfig> {
    Arc::new(
        CoreConfig::new(
            Duration::from_secs(2),
            chrono::Duration::hours(24),
            "test-ed".to_string(),
        )
        .unwrap(),
    )
}

pub(crate) fn visit(arrived_at: DateTime<Utc>, path: ArrivalPath, status: VisitStatus) -> Visit {
    Visit {
        id: Uuid::new_v4(),
        patient_ref: NonEmptyText::new("MRN-0001").unwrap(),
        arrived_at,
        arrival_path: path,
        status,
        notes: None,
        external_encounter_id: None,
    }
}

/// Wraps the in-memory store and fails selected operations on demand.
#[derive(Default)]
pub(crate) struct FaultyStore {
    pub inner: InMemoryVisitStore,
    pub fail_audit: AtomicBool,
    pub fail_reads: AtomicBool,
    pub fail_assessment_reads: AtomicBool,
}

impl FaultyStore {
    fn read_guard(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read replica offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl VisitStore for FaultyStore {
    async fn insert_visit(&self, visit: Visit) -> StoreResult<()> {
        self.inner.insert_visit(visit).await
    }

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<Visit>> {
        self.read_guard()?;
        self.inner.get_visit(id).await
    }

    async fn update_visit_status(
        &self,
        id: Uuid,
        status: VisitStatus,
        expected_current: Option<VisitStatus>,
    ) -> StoreResult<VisitUpdate> {
        self.inner
            .update_visit_status(id, status, expected_current)
            .await
    }

    async fn assign_encounter(
        &self,
        id: Uuid,
        encounter_id: String,
        status: VisitStatus,
        expected_current: VisitStatus,
    ) -> StoreResult<VisitUpdate> {
        self.inner
            .assign_encounter(id, encounter_id, status, expected_current)
            .await
    }

    async fn apply_correction(
        &self,
        id: Uuid,
        correction: &VisitCorrection,
    ) -> StoreResult<VisitUpdate> {
        self.inner.apply_correction(id, correction).await
    }

    async fn list_visits_by_status(&self, statuses: &[VisitStatus]) -> StoreResult<Vec<Visit>> {
        self.read_guard()?;
        self.inner.list_visits_by_status(statuses).await
    }

    async fn list_visits_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Visit>> {
        self.read_guard()?;
        self.inner.list_visits_since(since).await
    }

    async fn append_assessment(&self, record: EwsAssessment) -> StoreResult<()> {
        self.inner.append_assessment(record).await
    }

    async fn list_assessments_for_visit(&self, visit_id: Uuid) -> StoreResult<Vec<EwsAssessment>> {
        if self.fail_assessment_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("assessment table locked".into()));
        }
        self.inner.list_assessments_for_visit(visit_id).await
    }

    async fn append_vitals(&self, record: VitalsRecord) -> StoreResult<()> {
        self.inner.append_vitals(record).await
    }

    async fn earliest_vitals_for_visit(
        &self,
        visit_id: Uuid,
    ) -> StoreResult<Option<VitalsRecord>> {
        self.inner.earliest_vitals_for_visit(visit_id).await
    }

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> StoreResult<()> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit table unavailable".into()));
        }
        self.inner.append_audit_entry(entry).await
    }

    async fn list_audit_entries(&self, entity_ref: &str) -> StoreResult<Vec<AuditLogEntry>> {
        self.inner.list_audit_entries(entity_ref).await
    }
}
