//! Audit service
//!
//! Records who did what, locally first, then appends the entry to the
//! remote audit collection.

use crate::database::{AuditLog, NewAuditEntry, Repository};
use crate::error::{AppError, Result};
use crate::sync::{SyncDispatcher, SyncEvent};

#[derive(Clone)]
pub struct AuditService {
    repo: Repository,
    dispatcher: SyncDispatcher,
}

impl AuditService {
    pub fn new(repo: Repository, dispatcher: SyncDispatcher) -> Self {
        Self { repo, dispatcher }
    }

    pub async fn record(&self, entry: NewAuditEntry) -> Result<AuditLog> {
        for (name, value) in [
            ("action", &entry.action),
            ("entity_type", &entry.entity_type),
            ("username", &entry.username),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("Audit {name} is required")));
            }
        }

        let log = self.repo.insert_audit_log(&entry).await?;

        self.dispatcher.dispatch(SyncEvent::AuditEvent(entry));

        Ok(log)
    }

    /// Newest entries first
    pub async fn recent(&self, limit: u32) -> Result<Vec<AuditLog>> {
        self.repo.list_audit_logs(limit).await
    }
}
