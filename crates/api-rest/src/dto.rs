//! JSON request and response bodies.
//!
//! Enumerations travel as their wire spelling (`"IN_TRIAGE"`, `"WALK_IN"`) and are parsed
//! by the core so malformed values come back as `INVALID_INPUT`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use triage_core::{
    ActiveCensus, AuditLogEntry, ErrorKind, EwsAssessment, EwsDistribution, TimeToTriageStats,
    Visit, VitalSigns, VitalsRecord,
};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorRes {
    #[schema(value_type = String, example = "ALREADY_TRIAGED")]
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckInReq {
    pub patient_ref: String,
    #[schema(example = "WALK_IN")]
    pub arrival_path: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub arrived_at: Option<DateTime<Utc>>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VisitRes {
    pub id: Uuid,
    pub patient_ref: String,
    pub arrived_at: DateTime<Utc>,
    pub arrival_path: String,
    pub status: String,
    pub notes: Option<String>,
    pub external_encounter_id: Option<String>,
}

impl From<Visit> for VisitRes {
    fn from(visit: Visit) -> Self {
        Self {
            id: visit.id,
            patient_ref: visit.patient_ref.into_inner(),
            arrived_at: visit.arrived_at,
            arrival_path: visit.arrival_path.to_string(),
            status: visit.status.to_string(),
            notes: visit.notes,
            external_encounter_id: visit.external_encounter_id,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct VitalsReq {
    pub recorded_by: String,
    #[serde(default)]
    pub heart_rate: Option<u16>,
    #[serde(default)]
    pub respiratory_rate: Option<u16>,
    #[serde(default)]
    pub systolic_bp: Option<u16>,
    #[serde(default)]
    pub diastolic_bp: Option<u16>,
    #[serde(default)]
    pub temperature_c: Option<f32>,
    #[serde(default)]
    pub spo2: Option<u8>,
}

impl VitalsReq {
    pub fn vitals(&self) -> VitalSigns {
        VitalSigns {
            heart_rate: self.heart_rate,
            respiratory_rate: self.respiratory_rate,
            systolic_bp: self.systolic_bp,
            diastolic_bp: self.diastolic_bp,
            temperature_c: self.temperature_c,
            spo2: self.spo2,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct VitalsRes {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}

impl From<VitalsRecord> for VitalsRes {
    fn from(record: VitalsRecord) -> Self {
        Self {
            id: record.id,
            visit_id: record.visit_id,
            recorded_at: record.recorded_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct AssessmentReq {
    #[schema(example = "VERIFIED")]
    pub assessment_type: String,
    #[serde(default)]
    pub score: Option<i64>,
    #[schema(example = "HIGH")]
    pub level: String,
    #[serde(default)]
    pub flags: Vec<String>,
    pub created_by: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AssessmentRes {
    pub id: Uuid,
    pub visit_id: Uuid,
    pub assessment_type: String,
    pub score: Option<u32>,
    pub level: String,
    pub flags: Vec<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl From<EwsAssessment> for AssessmentRes {
    fn from(a: EwsAssessment) -> Self {
        Self {
            id: a.id,
            visit_id: a.visit_id,
            assessment_type: a.assessment_type.to_string(),
            score: a.score,
            level: a.level.to_string(),
            flags: a.flags,
            created_by: a.created_by.into_inner(),
            created_at: a.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AssessmentListRes {
    pub assessments: Vec<AssessmentRes>,
}

#[derive(Deserialize, ToSchema)]
pub struct TransitionReq {
    #[schema(example = "IN_TRIAGE")]
    pub target: String,
    pub actor: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CorrectionReq {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub actor: String,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuditEntryRes {
    pub id: Uuid,
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub actor: String,
    pub recorded_at: DateTime<Utc>,
}

impl From<AuditLogEntry> for AuditEntryRes {
    fn from(entry: AuditLogEntry) -> Self {
        Self {
            id: entry.id,
            field: entry.field.into_inner(),
            old_value: entry.old_value,
            new_value: entry.new_value,
            actor: entry.actor.into_inner(),
            recorded_at: entry.recorded_at,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct AuditHistoryRes {
    pub entries: Vec<AuditEntryRes>,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct TimeToTriageRes {
    pub count: usize,
    pub mean_minutes: Option<f64>,
    pub median_minutes: Option<f64>,
    pub min_minutes: Option<i64>,
    pub max_minutes: Option<i64>,
}

impl From<TimeToTriageStats> for TimeToTriageRes {
    fn from(stats: TimeToTriageStats) -> Self {
        Self {
            count: stats.count,
            mean_minutes: stats.mean_minutes,
            median_minutes: stats.median_minutes,
            min_minutes: stats.min_minutes,
            max_minutes: stats.max_minutes,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct LevelShareRes {
    pub level: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct EwsDistributionRes {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total: usize,
    pub levels: Vec<LevelShareRes>,
}

impl From<EwsDistribution> for EwsDistributionRes {
    fn from(dist: EwsDistribution) -> Self {
        Self {
            window_start: dist.window_start,
            window_end: dist.window_end,
            total: dist.total,
            levels: dist
                .levels
                .into_iter()
                .map(|share| LevelShareRes {
                    level: share.level.to_string(),
                    count: share.count,
                    percentage: share.percentage,
                })
                .collect(),
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct StatusBreakdownRes {
    pub waiting: usize,
    pub in_triage: usize,
    pub roomed: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ArrivalPathBreakdownRes {
    pub walk_in: usize,
    pub ems: usize,
    pub trauma_direct: usize,
    pub other: usize,
}

#[derive(Serialize, Deserialize, ToSchema)]
pub struct CensusRes {
    pub total: usize,
    pub by_status: StatusBreakdownRes,
    pub by_arrival_path: ArrivalPathBreakdownRes,
}

impl From<ActiveCensus> for CensusRes {
    fn from(census: ActiveCensus) -> Self {
        Self {
            total: census.total,
            by_status: StatusBreakdownRes {
                waiting: census.by_status.waiting,
                in_triage: census.by_status.in_triage,
                roomed: census.by_status.roomed,
            },
            by_arrival_path: ArrivalPathBreakdownRes {
                walk_in: census.by_arrival_path.walk_in,
                ems: census.by_arrival_path.ems,
                trauma_direct: census.by_arrival_path.trauma_direct,
                other: census.by_arrival_path.other,
            },
        }
    }
}
