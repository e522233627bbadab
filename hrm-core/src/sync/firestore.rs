//! Cloud Firestore backend over the REST v1 API
//!
//! Every write goes through `documents:commit` so the sync timestamp can be
//! set by the server (`REQUEST_TIME` transform) in the same write.

use super::remote::{CollectionPath, DocumentPath, RemoteDocument, RemoteError, RemoteStore};
use crate::config::RemoteConfig;
use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;
use reqwest::Client;
use serde_json::{json, Map, Value};

const FIRESTORE_API_URL: &str = "https://firestore.googleapis.com/v1";

/// Length of client-generated document ids for appended documents
const AUTO_ID_LENGTH: usize = 20;

/// HTTP client for a project's default Firestore database
pub struct FirestoreStore {
    client: Client,
    api_url: String,
    project_id: String,
    api_key: String,
    id_token: Option<String>,
}

impl FirestoreStore {
    /// Build a client from remote configuration.
    ///
    /// Missing credentials are not an error here; the availability gate
    /// keeps an unconfigured store from ever being called.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, RemoteError> {
        let client = Client::builder().user_agent("hrm-core-sync").build()?;

        Ok(Self {
            client,
            api_url: FIRESTORE_API_URL.to_string(),
            project_id: config.project_id.clone().unwrap_or_default(),
            api_key: config.api_key.clone().unwrap_or_default(),
            id_token: config.id_token.clone(),
        })
    }

    /// Point the client at another endpoint, e.g. the local emulator
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn database(&self) -> String {
        format!("projects/{}/databases/(default)", self.project_id)
    }

    fn document_name(&self, path: &str) -> String {
        format!("{}/documents/{}", self.database(), path)
    }

    async fn commit(&self, writes: Vec<Value>) -> Result<(), RemoteError> {
        let url = format!("{}/{}/documents:commit", self.api_url, self.database());

        let mut request = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "writes": writes }));

        if let Some(token) = &self.id_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[async_trait]
impl RemoteStore for FirestoreStore {
    async fn set(&self, path: &DocumentPath, document: RemoteDocument) -> Result<(), RemoteError> {
        let write = update_write(self.document_name(path.as_str()), document, false);
        self.commit(vec![write]).await
    }

    async fn delete(&self, path: &DocumentPath) -> Result<(), RemoteError> {
        // No precondition: deleting a missing document commits successfully
        let write = json!({ "delete": self.document_name(path.as_str()) });
        self.commit(vec![write]).await
    }

    async fn add(
        &self,
        collection: &CollectionPath,
        document: RemoteDocument,
    ) -> Result<String, RemoteError> {
        let id = auto_id();
        let path = collection.document(&id);
        let write = update_write(self.document_name(path.as_str()), document, true);
        self.commit(vec![write]).await?;
        Ok(id)
    }
}

/// Whole-document update with a server timestamp transform.
///
/// Without an update mask Firestore replaces the entire document. When
/// `insert_only` is set the write fails if the document already exists.
fn update_write(name: String, document: RemoteDocument, insert_only: bool) -> Value {
    let mut write = json!({
        "update": {
            "name": name,
            "fields": encode_fields(&document.fields),
        },
        "updateTransforms": [{
            "fieldPath": document.server_timestamp_field,
            "setToServerValue": "REQUEST_TIME",
        }],
    });

    if insert_only {
        write["currentDocument"] = json!({ "exists": false });
    }

    write
}

fn encode_fields(fields: &Map<String, Value>) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(name, value)| (name.clone(), encode_value(value)))
        .collect();
    Value::Object(encoded)
}

/// Encode a JSON value as a Firestore typed value
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                json!({ "integerValue": i.to_string() })
            } else if let Some(u) = n.as_u64() {
                json!({ "integerValue": u.to_string() })
            } else {
                json!({ "doubleValue": n.as_f64() })
            }
        }
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(items) => {
            let values: Vec<Value> = items.iter().map(encode_value).collect();
            json!({ "arrayValue": { "values": values } })
        }
        Value::Object(fields) => json!({ "mapValue": { "fields": encode_fields(fields) } }),
    }
}

fn auto_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(AUTO_ID_LENGTH)
        .map(char::from)
        .collect()
}
