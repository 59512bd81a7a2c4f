//! # Triage Core
//!
//! Visit triage lifecycle and early warning score (EWS) engine for ED walk-in intake.
//!
//! This crate contains the clinical core:
//! - Intake: check-in and vitals capture
//! - EWS assessment tracker with verified-over-provisional precedence
//! - Visit state machine with guarded transitions, the registrar correction path and the
//!   transactional downstream sync
//! - Analytics: time-to-triage, EWS distribution and active census
//! - Write-once audit log
//!
//! **No transport concerns**: HTTP handlers, authentication and the downstream FHIR client
//! belong in `api-rest` or in implementations of [`EncounterSync`] and [`VisitStore`].

pub mod config;
pub mod constants;
pub mod encounter_sync;
pub mod error;
pub mod records;
pub mod services;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::CoreConfig;
pub use encounter_sync::{EncounterSync, SyncError};
pub use error::{ErrorKind, TriageError, TriageResult};
pub use records::{
    AuditLogEntry, EwsAssessment, Visit, VisitCorrection, VisitUpdate, VitalSigns, VitalsRecord,
};
pub use services::analytics::{
    ActiveCensus, AnalyticsEngine, AnalyticsSnapshot, ArrivalPathBreakdown, EwsDistribution,
    LevelShare, StatusBreakdown, TimeToTriageStats,
};
pub use services::assessments::{AssessmentTracker, NewAssessment};
pub use services::audit::AuditLog;
pub use services::intake::{CheckIn, IntakeService};
pub use services::visits::VisitStateMachine;
pub use store::{InMemoryVisitStore, StoreError, StoreResult, VisitStore};

// Re-export shared primitives so callers depend on one crate.
pub use triage_types::{ArrivalPath, AssessmentType, EwsLevel, NonEmptyText, TypesError, VisitStatus};

use std::sync::Arc;

/// All engine services wired to one store and one configuration.
#[derive(Clone)]
pub struct TriageEngine {
    pub intake: IntakeService,
    pub assessments: AssessmentTracker,
    pub visits: VisitStateMachine,
    pub analytics: AnalyticsEngine,
    pub audit: AuditLog,
}

impl TriageEngine {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        Self {
            intake: IntakeService::new(cfg.clone(), store.clone()),
            assessments: AssessmentTracker::new(cfg.clone(), store.clone()),
            visits: VisitStateMachine::new(cfg.clone(), store.clone()),
            analytics: AnalyticsEngine::new(cfg.clone(), store.clone()),
            audit: AuditLog::new(cfg, store),
        }
    }
}
