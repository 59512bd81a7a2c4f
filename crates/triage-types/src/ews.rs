use crate::{normalise_token, TypesError};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Origin of an EWS assessment.
///
/// Variant order is significant: `Verified` sorts above `Provisional`, which is the
/// precedence used when projecting a visit's current risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssessmentType {
    /// Automated or self-reported kiosk screening, before a nurse has seen the patient.
    Provisional,
    /// Nurse-confirmed level recorded after formal clinical triage.
    Verified,
}

impl AssessmentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Provisional => "PROVISIONAL",
            Self::Verified => "VERIFIED",
        }
    }
}

impl FromStr for AssessmentType {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "PROVISIONAL" => Ok(Self::Provisional),
            "VERIFIED" => Ok(Self::Verified),
            _ => Err(TypesError::UnknownVariant {
                kind: "assessment type",
            }),
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Early warning score level taxonomy, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EwsLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl EwsLevel {
    /// Every level, least severe first.
    pub const ALL: [EwsLevel; 4] = [
        EwsLevel::Low,
        EwsLevel::Moderate,
        EwsLevel::High,
        EwsLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Moderate => "MODERATE",
            Self::High => "HIGH",
            Self::Critical => "CRITICAL",
        }
    }
}

impl FromStr for EwsLevel {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalise_token(s).as_str() {
            "LOW" => Ok(Self::Low),
            "MODERATE" => Ok(Self::Moderate),
            "HIGH" => Ok(Self::High),
            "CRITICAL" => Ok(Self::Critical),
            _ => Err(TypesError::UnknownVariant { kind: "EWS level" }),
        }
    }
}

impl std::fmt::Display for EwsLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
