//! Durable record types shared by the store adapter and the services.
//!
//! Assessments, vitals and audit entries are append-only: once written they are never
//! edited. Corrections are expressed as new records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_types::{ArrivalPath, AssessmentType, EwsLevel, NonEmptyText, VisitStatus};
use uuid::Uuid;

/// One emergency-department encounter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: Uuid,
    pub patient_ref: NonEmptyText,
    /// Set at check-in and never changed afterwards.
    pub arrived_at: DateTime<Utc>,
    pub arrival_path: ArrivalPath,
    pub status: VisitStatus,
    pub notes: Option<String>,
    /// Encounter id assigned by the downstream clinical record system.
    pub external_encounter_id: Option<String>,
}

/// Before/after pair returned by every store mutation of a visit.
#[derive(Clone, Debug, PartialEq)]
pub struct VisitUpdate {
    pub before: Visit,
    pub after: Visit,
}

/// Registrar correction applied through the unguarded administrative path.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VisitCorrection {
    pub status: Option<VisitStatus>,
    /// `Some("")` clears the notes.
    pub notes: Option<String>,
}

impl VisitCorrection {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none()
    }

    /// Apply this correction to a copy of `visit`.
    pub fn apply_to(&self, visit: &Visit) -> Visit {
        let mut next = visit.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(notes) = &self.notes {
            let trimmed = notes.trim();
            next.notes = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }
        next
    }
}

/// Immutable early warning score assessment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EwsAssessment {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub assessment_type: AssessmentType,
    /// Provisional screenings may be qualitative only.
    pub score: Option<u32>,
    pub level: EwsLevel,
    pub flags: Vec<String>,
    pub created_by: NonEmptyText,
    pub created_at: DateTime<Utc>,
}

/// A single set of observations. Any measurement may be missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalSigns {
    pub heart_rate: Option<u16>,
    pub respiratory_rate: Option<u16>,
    pub systolic_bp: Option<u16>,
    pub diastolic_bp: Option<u16>,
    pub temperature_c: Option<f32>,
    pub spo2: Option<u8>,
}

impl VitalSigns {
    pub fn is_empty(&self) -> bool {
        self.heart_rate.is_none()
            && self.respiratory_rate.is_none()
            && self.systolic_bp.is_none()
            && self.diastolic_bp.is_none()
            && self.temperature_c.is_none()
            && self.spo2.is_none()
    }
}

/// Vitals recorded for a visit. The earliest record marks triage completion for analytics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VitalsRecord {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub vitals: VitalSigns,
    pub recorded_by: NonEmptyText,
    pub recorded_at: DateTime<Utc>,
}

/// Write-once record of a single field change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub entity_ref: NonEmptyText,
    pub field: NonEmptyText,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: NonEmptyText,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visit() -> Visit {
        Visit {
            id: Uuid::new_v4(),
            patient_ref: NonEmptyText::new("MRN-1").unwrap(),
            arrived_at: Utc::now(),
            arrival_path: ArrivalPath::WalkIn,
            status: VisitStatus::Waiting,
            notes: Some("chest pain".into()),
            external_encounter_id: None,
        }
    }

    #[test]
    fn correction_with_blank_notes_clears_them() {
        let correction = VisitCorrection {
            status: None,
            notes: Some("  ".into()),
        };
        let next = correction.apply_to(&visit());
        assert_eq!(next.notes, None);
        assert_eq!(next.status, VisitStatus::Waiting);
    }

    #[test]
    fn correction_overrides_status_without_touching_arrival() {
        let before = visit();
        let correction = VisitCorrection {
            status: Some(VisitStatus::Discharged),
            notes: None,
        };
        let after = correction.apply_to(&before);
        assert_eq!(after.status, VisitStatus::Discharged);
        assert_eq!(after.arrived_at, before.arrived_at);
        assert_eq!(after.notes, before.notes);
    }

    #[test]
    fn empty_vitals_detected() {
        assert!(VitalSigns::default().is_empty());
        let vitals = VitalSigns {
            spo2: Some(97),
            ..Default::default()
        };
        assert!(!vitals.is_empty());
    }
}
