//! Remote mirror adapter
//!
//! Turns local entities into remote document writes addressed by natural
//! key. Every operation checks the availability gate first and absorbs
//! its own failures: the result is an outcome to log, never an error.

use super::gate::AvailabilityGate;
use super::identity::{EntityKind, SyncEntity};
use super::remote::{CollectionPath, DocumentPath, RemoteDocument, RemoteStore};
use crate::config::{AUDIT_LOGS_COLLECTION, AUDIT_TIMESTAMP_FIELD, SYNCED_AT_FIELD};
use crate::database::NewAuditEntry;
use std::sync::Arc;

/// Terminal state of one mirror attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote store not configured; nothing attempted
    Skipped,
    Succeeded,
    /// Attempted and failed; already logged
    Failed,
}

#[derive(Clone)]
pub struct RemoteMirror {
    gate: AvailabilityGate,
    store: Arc<dyn RemoteStore>,
    company_id: Arc<str>,
}

impl RemoteMirror {
    pub fn new(gate: AvailabilityGate, store: Arc<dyn RemoteStore>, company_id: &str) -> Self {
        Self {
            gate,
            store,
            company_id: Arc::from(company_id),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.gate.is_remote_configured()
    }

    pub fn document_path(&self, kind: EntityKind, key: &str) -> DocumentPath {
        DocumentPath::new(&self.company_id, kind.collection(), key)
    }

    pub fn audit_collection(&self) -> CollectionPath {
        CollectionPath::new(&self.company_id, AUDIT_LOGS_COLLECTION)
    }

    /// Overwrite the remote document for `entity` with its full snapshot
    pub async fn mirror_upsert<T: SyncEntity>(&self, entity: &T) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let path = self.document_path(T::KIND, entity.remote_key());

        let document = match RemoteDocument::from_entity(entity, SYNCED_AT_FIELD) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Mirror upsert of {} skipped, could not encode: {}", path, e);
                return SyncOutcome::Failed;
            }
        };

        match self.store.set(&path, document).await {
            Ok(()) => {
                tracing::debug!("Mirrored {}", path);
                SyncOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!("Mirror upsert of {} failed (offline?): {}", path, e);
                SyncOutcome::Failed
            }
        }
    }

    /// Remove the remote document for `key`; a missing document is fine
    pub async fn mirror_delete(&self, kind: EntityKind, key: &str) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let path = self.document_path(kind, key);

        match self.store.delete(&path).await {
            Ok(()) => {
                tracing::debug!("Deleted mirror {}", path);
                SyncOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!("Mirror delete of {} failed: {}", path, e);
                SyncOutcome::Failed
            }
        }
    }

    /// Insert a new audit document; the server assigns id and timestamp
    pub async fn append_audit_entry(&self, entry: &NewAuditEntry) -> SyncOutcome {
        if !self.is_enabled() {
            return SyncOutcome::Skipped;
        }

        let collection = self.audit_collection();

        let document = match RemoteDocument::from_entity(entry, AUDIT_TIMESTAMP_FIELD) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!("Audit entry {} not mirrored, could not encode: {}", entry.action, e);
                return SyncOutcome::Failed;
            }
        };

        match self.store.add(&collection, document).await {
            Ok(id) => {
                tracing::debug!("Appended audit entry {}/{}", collection, id);
                SyncOutcome::Succeeded
            }
            Err(e) => {
                tracing::warn!("Audit entry {} not mirrored: {}", entry.action, e);
                SyncOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Employee;
    use crate::sync::MemoryStore;
    use serde_json::json;

    fn employee(epf: &str) -> Employee {
        Employee {
            epf_number: epf.to_string(),
            name_with_initials: "S. Fernando".to_string(),
            full_name: "Sunil Fernando".to_string(),
            ..Employee::default()
        }
    }

    fn audit_entry() -> NewAuditEntry {
        NewAuditEntry {
            action: "DELETE".to_string(),
            entity_type: "employee".to_string(),
            entity_id: Some("EPF1".to_string()),
            username: "admin".to_string(),
            ..NewAuditEntry::default()
        }
    }

    fn mirror(gate: AvailabilityGate, store: &MemoryStore) -> RemoteMirror {
        RemoteMirror::new(gate, Arc::new(store.clone()), "newlanka")
    }

    #[tokio::test]
    async fn test_closed_gate_never_touches_store() {
        let store = MemoryStore::new();
        let mirror = mirror(AvailabilityGate::closed(), &store);

        assert_eq!(mirror.mirror_upsert(&employee("EPF1")).await, SyncOutcome::Skipped);
        assert_eq!(
            mirror.mirror_delete(EntityKind::Employee, "EPF1").await,
            SyncOutcome::Skipped
        );
        assert_eq!(
            mirror.mirror_delete(EntityKind::DailyCaderReport, "2024-05-01").await,
            SyncOutcome::Skipped
        );
        assert_eq!(mirror.append_audit_entry(&audit_entry()).await, SyncOutcome::Skipped);

        assert_eq!(store.calls().await.total(), 0);
    }

    #[tokio::test]
    async fn test_upsert_writes_snapshot_at_natural_key() {
        let store = MemoryStore::new();
        let mirror = mirror(AvailabilityGate::open(), &store);

        let outcome = mirror.mirror_upsert(&employee("EPF123")).await;
        assert_eq!(outcome, SyncOutcome::Succeeded);

        let doc = store
            .document("companies/newlanka/employees/EPF123")
            .await
            .unwrap();
        assert_eq!(doc.get("full_name"), Some(&json!("Sunil Fernando")));
        assert_eq!(doc.get("working_status"), Some(&json!("active")));
        assert!(doc.contains_key("_synced_at"));
    }

    #[tokio::test]
    async fn test_failures_become_outcomes() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let mirror = mirror(AvailabilityGate::open(), &store);

        assert_eq!(mirror.mirror_upsert(&employee("EPF1")).await, SyncOutcome::Failed);
        assert_eq!(
            mirror.mirror_delete(EntityKind::Employee, "EPF1").await,
            SyncOutcome::Failed
        );
        assert_eq!(mirror.append_audit_entry(&audit_entry()).await, SyncOutcome::Failed);
        assert_eq!(store.calls().await.total(), 3);
    }

    #[tokio::test]
    async fn test_audit_entries_are_always_inserts() {
        let store = MemoryStore::new();
        let mirror = mirror(AvailabilityGate::open(), &store);

        mirror.append_audit_entry(&audit_entry()).await;
        mirror.append_audit_entry(&audit_entry()).await;

        let docs = store.documents_in("companies/newlanka/audit_logs").await;
        assert_eq!(docs.len(), 2);
        assert!(docs.iter().all(|(_, fields)| fields.contains_key("timestamp")));
        assert_eq!(docs[0].1.get("action"), Some(&json!("DELETE")));
    }
}
