//! Write-once field change log.
//!
//! There is no update or delete operation. A failed write is reported to the
//! caller as a dependency failure and is never dropped silently.

use super::{bounded, require_actor};
use crate::config::CoreConfig;
use crate::records::AuditLogEntry;
use crate::store::VisitStore;
use crate::{TriageError, TriageResult};
use chrono::Utc;
use std::sync::Arc;
use triage_types::NonEmptyText;
use uuid::Uuid;

#[derive(Clone)]
pub struct AuditLog {
    cfg: Arc<CoreConfig>,
    store: Arc<dyn VisitStore>,
}

impl AuditLog {
    pub fn new(cfg: Arc<CoreConfig>, store: Arc<dyn VisitStore>) -> Self {
        Self { cfg, store }
    }

    /// Append a single field change.
    ///
    /// # Errors
    ///
    /// - [`TriageError::InvalidInput`] if the entity reference, field name or actor is blank.
    /// - [`TriageError::AuditWrite`] if the store rejects the append.
    /// - [`TriageError::Timeout`] if the store does not answer in time.
    pub async fn record_change(
        &self,
        entity_ref: &str,
        field: &str,
        old_value: Option<&str>,
        new_value: Option<&str>,
        actor: &str,
    ) -> TriageResult<AuditLogEntry> {
        let entity_ref = NonEmptyText::new(entity_ref)
            .map_err(|_| TriageError::InvalidInput("entity reference is required".into()))?;
        let field = NonEmptyText::new(field)
            .map_err(|_| TriageError::InvalidInput("field name is required".into()))?;
        let actor = require_actor(actor)?;

        let entry = AuditLogEntry {
            id: Uuid::new_v4(),
            entity_ref,
            field,
            old_value: old_value.map(str::to_string),
            new_value: new_value.map(str::to_string),
            actor,
            recorded_at: Utc::now(),
        };

        let append = async {
            self.store
                .append_audit_entry(entry.clone())
                .await
                .map_err(TriageError::AuditWrite)
        };
        if let Err(e) = bounded(self.cfg.store_timeout(), "append_audit_entry", append).await {
            tracing::error!(
                entity = %entry.entity_ref,
                field = %entry.field,
                "audit entry could not be written: {e}"
            );
            return Err(e);
        }

        Ok(entry)
    }

    /// Entries recorded for `entity_ref`, oldest first.
    pub async fn history(&self, entity_ref: &str) -> TriageResult<Vec<AuditLogEntry>> {
        if entity_ref.trim().is_empty() {
            return Err(TriageError::InvalidInput(
                "entity reference is required".into(),
            ));
        }
        bounded(
            self.cfg.store_timeout(),
            "list_audit_entries",
            self.store.list_audit_entries(entity_ref.trim()),
        )
        .await
    }
}
