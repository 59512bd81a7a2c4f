use crate::{normalise_token, TypesError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of an ED visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    /// Checked in, not yet triaged by a nurse.
    Waiting,
    /// Nurse has completed the clinical triage exam.
    InTriage,
    /// Moved to a treatment space.
    Roomed,
    Discharged,
    LeftWithoutBeingSeen,
}

impl VisitStatus {
    /// Statuses that count towards the active census.
    pub const ACTIVE: [VisitStatus; 3] = [
        VisitStatus::Waiting,
        VisitStatus::InTriage,
        VisitStatus::Roomed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "WAITING",
            Self::InTriage => "IN_TRIAGE",
            Self::Roomed => "ROOMED",
            Self::Discharged => "DISCHARGED",
            Self::LeftWithoutBeingSeen => "LEFT_WITHOUT_BEING_SEEN",
        }
    }

    /// No guarded transition leaves a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Discharged | Self::LeftWithoutBeingSeen)
    }

    /// True once a nurse has triaged the visit and it is still open.
    pub fn is_triaged(&self) -> bool {
        matches!(self, Self::InTriage | Self::Roomed)
    }
}

impl FromStr for VisitStatus {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "WAITING" => Ok(Self::Waiting),
            "IN_TRIAGE" => Ok(Self::InTriage),
            "ROOMED" => Ok(Self::Roomed),
            "DISCHARGED" => Ok(Self::Discharged),
            "LEFT_WITHOUT_BEING_SEEN" | "LWBS" => Ok(Self::LeftWithoutBeingSeen),
            _ => Err(TypesError::UnknownVariant {
                kind: "visit status",
            }),
        }
    }
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the patient arrived at the department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArrivalPath {
    WalkIn,
    Ems,
    TraumaDirect,
    Other,
}

impl ArrivalPath {
    pub const ALL: [ArrivalPath; 4] = [
        ArrivalPath::WalkIn,
        ArrivalPath::Ems,
        ArrivalPath::TraumaDirect,
        ArrivalPath::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WalkIn => "WALK_IN",
            Self::Ems => "EMS",
            Self::TraumaDirect => "TRAUMA_DIRECT",
            Self::Other => "OTHER",
        }
    }
}

impl FromStr for ArrivalPath {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "WALK_IN" | "WALKIN" => Ok(Self::WalkIn),
            "EMS" => Ok(Self::Ems),
            "TRAUMA_DIRECT" => Ok(Self::TraumaDirect),
            "OTHER" => Ok(Self::Other),
            _ => Err(TypesError::UnknownVariant {
                kind: "arrival path",
            }),
        }
    }
}

impl std::fmt::Display for ArrivalPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
