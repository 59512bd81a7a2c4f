//! Visit State Machine.
//!
//! ```text
//! WAITING ──complete_triage──▶ IN_TRIAGE ──room──▶ ROOMED
//!    │                            │                  │
//!    └────────────────────────────┴──────────────────┴──▶ DISCHARGED | LEFT_WITHOUT_BEING_SEEN
//! ```
//!
//! Two entry points mutate status:
//! - [`VisitStateMachine::transition`] and its named wrappers validate the guard and write
//!   with a compare-and-set on the status that was validated.
//! - [`VisitStateMachine::force_set`] is the registrar correction path. It applies status
//!   and notes without guard checks and is expected to sit behind stricter authorisation.
//!
//! [`VisitStateMachine::sync_encounter`] pushes a visit downstream and, only when the push
//! succeeds, stores the encounter id and `IN_TRIAGE` in one write.
//!
//! Every change is written to the audit log, one entry per field.

use super::audit::AuditLog;
use super::{bounded, require_actor};
use crate::config::CoreConfig;
use crate::constants::{
    FIELD_EXTERNAL_ENCOUNTER_ID, FIELD_NOTES, FIELD_STATUS, MAX_STATUS_CAS_ATTEMPTS,
};
use crate::encounter_sync::{EncounterSync, SyncError};
use crate::records::{Visit, VisitCorrection, VisitUpdate};
use crate::store::{StoreError, VisitStore};
use crate::{TriageError, TriageResult};
use std::future::Future;
use std::sync::Arc;
use triage_types::{NonEmptyText, VisitStatus};
use uuid::Uuid;

/// Validate a guarded transition from `from` to `to`.
///
/// # Errors
///
/// - [`TriageError::AlreadyTriaged`] when triage completion is requested for a visit that
///   is already `IN_TRIAGE` or `ROOMED`.
/// - [`TriageError::InvalidTransition`] for any move out of a terminal status, back to
///   `WAITING`, or from `ROOMED` to `ROOMED`.
pub fn check_transition(from: VisitStatus, to: VisitStatus) -> TriageResult<()> {
    use VisitStatus::*;

    let invalid = TriageError::InvalidTransition { from, to };
    if from.is_terminal() {
        return Err(invalid);
    }

    match to {
        Waiting => Err(invalid),
        InTriage if from.is_triaged() => Err(TriageError::AlreadyTriaged { current: from }),
        InTriage => Ok(()),
        Roomed if from == Roomed => Err(invalid),
        Roomed | Discharged | LeftWithoutBeingSeen => Ok(()),
    }
}

/// The downstream sync may advance any open visit to `IN_TRIAGE`.
fn check_sync(from: VisitStatus) -> TriageResult<()> {
    if from.is_terminal() {
        return Err(TriageError::InvalidTransition {
            from,
            to: VisitStatus::InTriage,
        });
    }
    Ok(())
}

#[derive(Clone)]
pub struct VisitStateMachine {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn VisitStore>,
    audit: AuditLog,
}

impl VisitStateMachine {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        let audit = AuditLog::new(cfg.clone(), store.clone());
        Self { cfg, store, audit }
    }

    /// Nurse has completed the clinical triage exam: `WAITING → IN_TRIAGE`.
    pub async fn complete_triage(&self, visit_id: Uuid, actor: &str) -> TriageResult<Visit> {
        self.transition(visit_id, VisitStatus::InTriage, actor)
            .await
    }

    /// Patient moved to a treatment space.
    pub async fn room(&self, visit_id: Uuid, actor: &str) -> TriageResult<Visit> {
        self.transition(visit_id, VisitStatus::Roomed, actor).await
    }

    pub async fn discharge(&self, visit_id: Uuid, actor: &str) -> TriageResult<Visit> {
        self.transition(visit_id, VisitStatus::Discharged, actor)
            .await
    }

    pub async fn mark_left_without_being_seen(
        &self,
        visit_id: Uuid,
        actor: &str,
    ) -> TriageResult<Visit> {
        self.transition(visit_id, VisitStatus::LeftWithoutBeingSeen, actor)
            .await
    }

    /// Guarded transition to `target`.
    ///
    /// Validation happens before any write. The write is conditional on the status that was
    /// validated; if another writer got there first the guard is re-evaluated against the
    /// status it committed, so of two racing triage completions exactly one succeeds and the
    /// other fails with `AlreadyTriaged`.
    pub async fn transition(
        &self,
        visit_id: Uuid,
        target: VisitStatus,
        actor: &str,
    ) -> TriageResult<Visit> {
        let actor = require_actor(actor)?;
        let visit = self.load(visit_id).await?;

        let result = self
            .apply_guarded(visit.status, |from| check_transition(from, target), |from| {
                self.store.update_visit_status(visit_id, target, Some(from))
            })
            .await;

        let update = match result {
            Ok(update) => update,
            Err(e) => {
                if e.is_invalid_transition() {
                    tracing::warn!(visit_id = %visit_id, target = %target, "transition rejected: {e}");
                }
                return Err(e);
            }
        };

        tracing::info!(
            visit_id = %visit_id,
            from = %update.before.status,
            to = %update.after.status,
            "visit transitioned"
        );
        self.audit_update(&update, &actor).await?;
        Ok(update.after)
    }

    /// Registrar correction of status and/or notes.
    ///
    /// This path does not validate the transition guard and may move a visit out of a
    /// terminal status.
    pub async fn force_set(
        &self,
        visit_id: Uuid,
        correction: VisitCorrection,
        actor: &str,
    ) -> TriageResult<Visit> {
        let actor = require_actor(actor)?;
        if correction.is_empty() {
            return Err(TriageError::InvalidInput(
                "correction must set status or notes".into(),
            ));
        }

        let update = bounded(
            self.cfg.store_timeout(),
            "apply_correction",
            self.store.apply_correction(visit_id, &correction),
        )
        .await?;

        if update.before.status != update.after.status {
            tracing::warn!(
                visit_id = %visit_id,
                from = %update.before.status,
                to = %update.after.status,
                "status corrected outside the guarded transition path"
            );
        }
        self.audit_update(&update, &actor).await?;
        Ok(update.after)
    }

    /// Push the visit to the downstream clinical record system and, on success, persist the
    /// returned encounter id together with `IN_TRIAGE`.
    ///
    /// If the push fails, times out or is cancelled, the visit is left unchanged. The id and
    /// the status are written in a single store call, so they are stored together or not at all.
    pub async fn sync_encounter(
        &self,
        visit_id: Uuid,
        sync: &dyn EncounterSync,
        actor: &str,
    ) -> TriageResult<Visit> {
        let actor = require_actor(actor)?;
        let visit = self.load(visit_id).await?;
        check_sync(visit.status)?;

        let encounter_id = bounded(
            self.cfg.store_timeout(),
            "push_encounter",
            sync.push_encounter(&visit),
        )
        .await
        .map_err(|e| {
            tracing::warn!(visit_id = %visit_id, "encounter push failed: {e}");
            e
        })?;
        let encounter_id = encounter_id.trim().to_string();
        if encounter_id.is_empty() {
            return Err(TriageError::EncounterSync(SyncError::EmptyEncounterId));
        }

        let update = self
            .apply_guarded(visit.status, check_sync, |from| {
                self.store.assign_encounter(
                    visit_id,
                    encounter_id.clone(),
                    VisitStatus::InTriage,
                    from,
                )
            })
            .await?;

        tracing::info!(
            visit_id = %visit_id,
            from = %update.before.status,
            "visit synced to clinical record system"
        );
        self.audit_update(&update, &actor).await?;
        Ok(update.after)
    }

    async fn load(&self, visit_id: Uuid) -> TriageResult<Visit> {
        bounded(
            self.cfg.store_timeout(),
            "get_visit",
            self.store.get_visit(visit_id),
        )
        .await?
        .ok_or(TriageError::NotFound("visit"))
    }

    /// Compare-and-set loop shared by the guarded entry points.
    ///
    /// `guard` is evaluated against the status the write will be conditioned on. A
    /// `StatusConflict` from the store means another writer changed the visit in between;
    /// the guard is re-run against the committed status before trying again.
    async fn apply_guarded<G, W, Fut>(
        &self,
        mut current: VisitStatus,
        guard: G,
        mut write: W,
    ) -> TriageResult<VisitUpdate>
    where
        G: Fn(VisitStatus) -> TriageResult<()>,
        W: FnMut(VisitStatus) -> Fut,
        Fut: Future<Output = Result<VisitUpdate, StoreError>>,
    {
        for _attempt in 0..MAX_STATUS_CAS_ATTEMPTS {
            guard(current)?;
            match bounded(self.cfg.store_timeout(), "update_visit_status", write(current)).await
            {
                Ok(update) => return Ok(update),
                Err(TriageError::Store(StoreError::StatusConflict { actual, .. })) => {
                    current = actual;
                }
                Err(e) => return Err(e),
            }
        }

        // Still contended: report against the latest observed status.
        guard(current)?;
        Err(TriageError::Store(StoreError::Unavailable(
            "visit status kept changing during update".into(),
        )))
    }

    async fn audit_update(&self, update: &VisitUpdate, actor: &NonEmptyText) -> TriageResult<()> {
        let entity_ref = update.after.id.to_string();
        let (before, after) = (&update.before, &update.after);

        if before.status != after.status {
            self.audit
                .record_change(
                    &entity_ref,
                    FIELD_STATUS,
                    Some(before.status.as_str()),
                    Some(after.status.as_str()),
                    actor.as_str(),
                )
                .await?;
        }
        if before.notes != after.notes {
            self.audit
                .record_change(
                    &entity_ref,
                    FIELD_NOTES,
                    before.notes.as_deref(),
                    after.notes.as_deref(),
                    actor.as_str(),
                )
                .await?;
        }
        if before.external_encounter_id != after.external_encounter_id {
            self.audit
                .record_change(
                    &entity_ref,
                    FIELD_EXTERNAL_ENCOUNTER_ID,
                    before.external_encounter_id.as_deref(),
                    after.external_encounter_id.as_deref(),
                    actor.as_str(),
                )
                .await?;
        }
        Ok(())
    }
}
