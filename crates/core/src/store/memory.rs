use super::{StoreError, StoreResult, VisitStore};
use crate::records::{
    AuditLogEntry, EwsAssessment, Visit, VisitCorrection, VisitUpdate, VitalsRecord,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use triage_types::VisitStatus;
use uuid::Uuid;

/// Process-local store backed by `tokio` read/write locks.
///
/// Each table has its own lock. Conditional status updates check and write while holding
/// the visits write lock, so two racing transitions on one visit cannot both apply.
#[derive(Debug, Default)]
pub struct InMemoryVisitStore {
    visits: RwLock<HashMap<Uuid, Visit>>,
    assessments: RwLock<HashMap<Uuid, Vec<EwsAssessment>>>,
    vitals: RwLock<HashMap<Uuid, Vec<VitalsRecord>>>,
    audit: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryVisitStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn mutate_visit<F>(&self, id: Uuid, mutate: F) -> StoreResult<VisitUpdate>
    where
        F: FnOnce(&Visit) -> StoreResult<Visit>,
    {
        let mut visits = self.visits.write().await;
        let stored = visits.get_mut(&id).ok_or(StoreError::VisitNotFound(id))?;
        let after = mutate(stored)?;
        let before = std::mem::replace(stored, after.clone());
        Ok(VisitUpdate { before, after })
    }
}

fn check_expected(visit: &Visit, expected: Option<VisitStatus>) -> StoreResult<()> {
    match expected {
        Some(expected) if visit.status != expected => Err(StoreError::StatusConflict {
            expected,
            actual: visit.status,
        }),
        _ => Ok(()),
    }
}

fn sorted_by_arrival(mut visits: Vec<Visit>) -> Vec<Visit> {
    visits.sort_by(|a, b| a.arrived_at.cmp(&b.arrived_at).then(a.id.cmp(&b.id)));
    visits
}

#[async_trait]
impl VisitStore for InMemoryVisitStore {
    async fn insert_visit(&self, visit: Visit) -> StoreResult<()> {
        let mut visits = self.visits.write().await;
        if visits.contains_key(&visit.id) {
            return Err(StoreError::DuplicateVisit(visit.id));
        }
        visits.insert(visit.id, visit);
        Ok(())
    }

    async fn get_visit(&self, id: Uuid) -> StoreResult<Option<Visit>> {
        Ok(self.visits.read().await.get(&id).cloned())
    }

    async fn update_visit_status(
        &self,
        id: Uuid,
        status: VisitStatus,
        expected_current: Option<VisitStatus>,
    ) -> StoreResult<VisitUpdate> {
        self.mutate_visit(id, |visit| {
            check_expected(visit, expected_current)?;
            let mut next = visit.clone();
            next.status = status;
            Ok(next)
        })
        .await
    }

    async fn assign_encounter(
        &self,
        id: Uuid,
        encounter_id: String,
        status: VisitStatus,
        expected_current: VisitStatus,
    ) -> StoreResult<VisitUpdate> {
        self.mutate_visit(id, |visit| {
            check_expected(visit, Some(expected_current))?;
            let mut next = visit.clone();
            next.status = status;
            next.external_encounter_id = Some(encounter_id);
            Ok(next)
        })
        .await
    }

    async fn apply_correction(
        &self,
        id: Uuid,
        correction: &VisitCorrection,
    ) -> StoreResult<VisitUpdate> {
        self.mutate_visit(id, |visit| Ok(correction.apply_to(visit)))
            .await
    }

    async fn list_visits_by_status(&self, statuses: &[VisitStatus]) -> StoreResult<Vec<Visit>> {
        let visits = self.visits.read().await;
        let matching = visits
            .values()
            .filter(|v| statuses.contains(&v.status))
            .cloned()
            .collect();
        Ok(sorted_by_arrival(matching))
    }

    async fn list_visits_since(&self, since: DateTime<Utc>) -> StoreResult<Vec<Visit>> {
        let visits = self.visits.read().await;
        let matching = visits
            .values()
            .filter(|v| v.arrived_at >= since)
            .cloned()
            .collect();
        Ok(sorted_by_arrival(matching))
    }

    async fn append_assessment(&self, record: EwsAssessment) -> StoreResult<()> {
        self.assessments
            .write()
            .await
            .entry(record.visit_id)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn list_assessments_for_visit(&self, visit_id: Uuid) -> StoreResult<Vec<EwsAssessment>> {
        Ok(self
            .assessments
            .read()
            .await
            .get(&visit_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_vitals(&self, record: VitalsRecord) -> StoreResult<()> {
        self.vitals
            .write()
            .await
            .entry(record.visit_id)
            .or_default()
            .push(record);
        Ok(())
    }

    async fn earliest_vitals_for_visit(
        &self,
        visit_id: Uuid,
    ) -> StoreResult<Option<VitalsRecord>> {
        Ok(self.vitals.read().await.get(&visit_id).and_then(|records| {
            records
                .iter()
                .min_by_key(|record| record.recorded_at)
                .cloned()
        }))
    }

    async fn append_audit_entry(&self, entry: AuditLogEntry) -> StoreResult<()> {
        self.audit.write().await.push(entry);
        Ok(())
    }

    async fn list_audit_entries(&self, entity_ref: &str) -> StoreResult<Vec<AuditLogEntry>> {
        Ok(self
            .audit
            .read()
            .await
            .iter()
            .filter(|entry| entry.entity_ref.as_str() == entity_ref)
            .cloned()
            .collect())
    }
}
