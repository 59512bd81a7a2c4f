//! Constants used throughout the triage core crate.

/// Default bound on a single store or downstream call, in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5_000;

/// Default trailing window for the EWS distribution, in hours.
pub const DEFAULT_EWS_WINDOW_HOURS: i64 = 24;

/// Facility label used when none is configured.
pub const DEFAULT_FACILITY: &str = "ed.dev.1";

/// Number of compare-and-set attempts before a contended transition gives up.
pub const MAX_STATUS_CAS_ATTEMPTS: usize = 3;

/// Audited field names.
pub const FIELD_STATUS: &str = "status";
pub const FIELD_NOTES: &str = "notes";
pub const FIELD_EXTERNAL_ENCOUNTER_ID: &str = "external_encounter_id";
