//! In-process remote store
//!
//! Behaves like the cloud store (whole-document overwrite, idempotent
//! delete, server-side timestamps) and counts every call it receives.

use super::remote::{CollectionPath, DocumentPath, RemoteDocument, RemoteError, RemoteStore};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Number of calls received per operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub set: usize,
    pub delete: usize,
    pub add: usize,
}

impl CallCounts {
    pub fn total(&self) -> usize {
        self.set + self.delete + self.add
    }
}

#[derive(Default)]
struct State {
    documents: BTreeMap<String, Map<String, Value>>,
    calls: CallCounts,
}

/// Cloneable handle to a shared in-memory document store
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
    failing: Arc<AtomicBool>,
    latency_ms: Arc<AtomicU64>,
    next_id: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail as if the network were down
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call before it touches the store
    pub fn set_latency(&self, latency: Duration) {
        let millis = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.latency_ms.store(millis, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> CallCounts {
        self.state.lock().await.calls
    }

    pub async fn document(&self, path: &str) -> Option<Map<String, Value>> {
        self.state.lock().await.documents.get(path).cloned()
    }

    /// All documents directly under `collection`, ordered by path
    pub async fn documents_in(&self, collection: &str) -> Vec<(String, Map<String, Value>)> {
        let prefix = format!("{collection}/");
        self.state
            .lock()
            .await
            .documents
            .iter()
            .filter(|(path, _)| {
                path.strip_prefix(&prefix)
                    .is_some_and(|rest| !rest.contains('/'))
            })
            .map(|(path, fields)| (path.clone(), fields.clone()))
            .collect()
    }

    pub async fn document_count(&self) -> usize {
        self.state.lock().await.documents.len()
    }

    async fn begin_call(&self, record: impl FnOnce(&mut CallCounts)) -> Result<(), RemoteError> {
        record(&mut self.state.lock().await.calls);

        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("simulated network failure".to_string()));
        }

        Ok(())
    }
}

fn stamped(document: RemoteDocument) -> Map<String, Value> {
    let mut fields = document.fields;
    fields.insert(
        document.server_timestamp_field.to_string(),
        Value::String(Utc::now().to_rfc3339()),
    );
    fields
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn set(&self, path: &DocumentPath, document: RemoteDocument) -> Result<(), RemoteError> {
        self.begin_call(|calls| calls.set += 1).await?;

        self.state
            .lock()
            .await
            .documents
            .insert(path.as_str().to_string(), stamped(document));
        Ok(())
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), RemoteError> {
        self.begin_call(|calls| calls.delete += 1).await?;

        self.state.lock().await.documents.remove(path.as_str());
        Ok(())
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        document: RemoteDocument,
    ) -> Result<String, RemoteError> {
        self.begin_call(|calls| calls.add += 1).await?;

        let id = format!("auto-{:06}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let path = collection.document(&id);

        let mut state = self.state.lock().await;
        if state.documents.contains_key(path.as_str()) {
            return Err(RemoteError::Status {
                status: 409,
                body: format!("document {path} already exists"),
            });
        }
        state
            .documents
            .insert(path.as_str().to_string(), stamped(document));

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> RemoteDocument {
        RemoteDocument::from_entity(&value, "_synced_at").unwrap()
    }

    #[tokio::test]
    async fn test_set_overwrites_whole_document() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("c", "employees", "EPF1");

        store.set(&path, doc(json!({ "a": 1, "b": 2 }))).await.unwrap();
        store.set(&path, doc(json!({ "a": 3 }))).await.unwrap();

        let stored = store.document(path.as_str()).await.unwrap();
        assert_eq!(stored.get("a"), Some(&json!(3)));
        assert!(stored.get("b").is_none());
        assert!(stored.contains_key("_synced_at"));
        assert_eq!(store.document_count().await, 1);
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let store = MemoryStore::new();
        let path = DocumentPath::new("c", "employees", "missing");

        store.delete(&path).await.unwrap();
        assert_eq!(store.calls().await.delete, 1);
    }

    #[tokio::test]
    async fn test_add_assigns_distinct_ids() {
        let store = MemoryStore::new();
        let audit = CollectionPath::new("c", "audit_logs");

        let first = store.add(&audit, doc(json!({ "action": "A" }))).await.unwrap();
        let second = store.add(&audit, doc(json!({ "action": "A" }))).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(store.documents_in(audit.as_str()).await.len(), 2);
    }

    #[tokio::test]
    async fn test_failing_store_counts_but_does_not_write() {
        let store = MemoryStore::new();
        store.set_failing(true);
        let path = DocumentPath::new("c", "employees", "EPF1");

        let result = store.set(&path, doc(json!({ "a": 1 }))).await;

        assert!(matches!(result, Err(RemoteError::Unavailable(_))));
        assert_eq!(store.calls().await.set, 1);
        assert!(store.document(path.as_str()).await.is_none());
    }
}
