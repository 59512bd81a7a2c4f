//! Check-in and vitals capture.

use super::{bounded, require_actor};
use crate::config::CoreConfig;
use crate::records::{Visit, VitalSigns, VitalsRecord};
use crate::store::VisitStore;
use crate::{TriageError, TriageResult};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use triage_types::{ArrivalPath, NonEmptyText, VisitStatus};
use uuid::Uuid;

/// Details captured at the kiosk or registration desk.
#[derive(Clone, Debug)]
pub struct CheckIn {
    pub patient_ref: String,
    pub arrival_path: ArrivalPath,
    pub notes: Option<String>,
    /// Defaults to the time of check-in.
    pub arrived_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct IntakeService {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn VisitStore>,
}

impl IntakeService {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        Self { cfg, store }
    }

    /// Create a visit in `WAITING`.
    pub async fn check_in(&self, check_in: CheckIn) -> TriageResult<Visit> {
        let patient_ref = NonEmptyText::new(&check_in.patient_ref)
            .map_err(|_| TriageError::InvalidInput("patient reference is required".into()))?;

        let now = Utc::now();
        let arrived_at = check_in.arrived_at.unwrap_or(now);
        if arrived_at > now {
            return Err(TriageError::InvalidInput(
                "arrival time cannot be in the future".into(),
            ));
        }

        let visit = Visit {
            id: Uuid::new_v4(),
            patient_ref,
            arrived_at,
            arrival_path: check_in.arrival_path,
            status: VisitStatus::Waiting,
            notes: check_in
                .notes
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            external_encounter_id: None,
        };

        bounded(
            self.cfg.store_timeout(),
            "insert_visit",
            self.store.insert_visit(visit.clone()),
        )
        .await?;

        tracing::info!(
            visit_id = %visit.id,
            arrival_path = %visit.arrival_path,
            facility = self.cfg.facility(),
            "visit checked in"
        );
        Ok(visit)
    }

    pub async fn get_visit(&self, visit_id: Uuid) -> TriageResult<Visit> {
        bounded(
            self.cfg.store_timeout(),
            "get_visit",
            self.store.get_visit(visit_id),
        )
        .await?
        .ok_or(TriageError::NotFound("visit"))
    }

    /// Append a vitals record. Visit status is not changed.
    pub async fn record_vitals(
        &self,
        visit_id: Uuid,
        vitals: VitalSigns,
        recorded_by: &str,
    ) -> TriageResult<VitalsRecord> {
        let recorded_by = require_actor(recorded_by)?;
        validate_vitals(&vitals)?;
        self.get_visit(visit_id).await?;

        let record = VitalsRecord {
            id: Uuid::new_v4(),
            visit_id,
            vitals,
            recorded_by,
            recorded_at: Utc::now(),
        };

        bounded(
            self.cfg.store_timeout(),
            "append_vitals",
            self.store.append_vitals(record.clone()),
        )
        .await?;

        tracing::info!(visit_id = %visit_id, "vitals recorded");
        Ok(record)
    }
}

/// Rejects an empty reading and values outside what a living patient can present with.
pub fn validate_vitals(vitals: &VitalSigns) -> TriageResult<()> {
    fn in_range<T: PartialOrd>(value: Option<T>, min: T, max: T) -> bool {
        value.map_or(true, |v| v >= min && v <= max)
    }

    if vitals.is_empty() {
        return Err(TriageError::InvalidInput(
            "at least one vital sign is required".into(),
        ));
    }

    let plausible = in_range(vitals.heart_rate, 1, 300)
        && in_range(vitals.respiratory_rate, 1, 80)
        && in_range(vitals.systolic_bp, 30, 300)
        && in_range(vitals.diastolic_bp, 10, 200)
        && in_range(vitals.temperature_c, 25.0, 45.0)
        && in_range(vitals.spo2, 1, 100);
    if !plausible {
        return Err(TriageError::InvalidInput(
            "vital sign outside plausible range".into(),
        ));
    }

    if let (Some(systolic), Some(diastolic)) = (vitals.systolic_bp, vitals.diastolic_bp) {
        if diastolic >= systolic {
            return Err(TriageError::InvalidInput(
                "diastolic pressure must be below systolic".into(),
            ));
        }
    }

    Ok(())
}
