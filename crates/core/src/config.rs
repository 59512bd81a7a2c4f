//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into core services as an
//! `Arc<CoreConfig>`. Services never read environment variables while handling a request.

use crate::constants::{DEFAULT_EWS_WINDOW_HOURS, DEFAULT_STORE_TIMEOUT_MS};
use crate::{TriageError, TriageResult};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    store_timeout: Duration,
    ews_window: chrono::Duration,
    facility: String,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns `TriageError::InvalidInput` if the timeout is zero, the EWS window is not
    /// positive, or the facility label is blank.
    pub fn new(
        store_timeout: Duration,
        ews_window: chrono::Duration,
        facility: String,
    ) -> TriageResult<Self> {
        if store_timeout.is_zero() {
            return Err(TriageError::InvalidInput(
                "store timeout must be greater than zero".into(),
            ));
        }
        if ews_window <= chrono::Duration::zero() {
            return Err(TriageError::InvalidInput(
                "EWS window must be positive".into(),
            ));
        }
        if facility.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "facility cannot be empty".into(),
            ));
        }

        Ok(Self {
            store_timeout,
            ews_window,
            facility: facility.trim().to_string(),
        })
    }

    pub fn store_timeout(&self) -> Duration {
        self.store_timeout
    }

    pub fn ews_window(&self) -> chrono::Duration {
        self.ews_window
    }

    pub fn facility(&self) -> &str {
        &self.facility
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the store timeout (milliseconds) from an optional string value.
///
/// If `value` is `None` or blank, returns the default timeout.
pub fn store_timeout_from_env_value(value: Option<String>) -> TriageResult<Duration> {
    match non_blank(value) {
        None => Ok(Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS)),
        Some(v) => v
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
            .ok_or_else(|| {
                TriageError::InvalidInput(
                    "store timeout must be a positive number of milliseconds".into(),
                )
            }),
    }
}

/// Parse the EWS distribution window (hours) from an optional string value.
///
/// If `value` is `None` or blank, returns the default 24 hour window.
pub fn ews_window_from_env_value(value: Option<String>) -> TriageResult<chrono::Duration> {
    let hours = match non_blank(value) {
        None => DEFAULT_EWS_WINDOW_HOURS,
        Some(v) => v
            .parse::<i64>()
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                TriageError::InvalidInput("EWS window must be a positive number of hours".into())
            })?,
    };

    chrono::Duration::try_hours(hours)
        .ok_or_else(|| TriageError::InvalidInput("EWS window is out of range".into()))
}
