//! Remote document store seam
//!
//! Addressing, document shape and the trait every remote backend implements.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// Failures talking to the remote store. Logged, never returned to callers
/// of the services.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("Remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Remote store unavailable: {0}")]
    Unavailable(String),
}

// Request URLs carry the API key
impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Http(e.without_url())
    }
}

/// Full path of one document, e.g. `companies/newlanka/employees/EPF123`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentPath(String);

impl DocumentPath {
    pub fn new(company_id: &str, collection: &str, key: &str) -> Self {
        Self(format!("companies/{company_id}/{collection}/{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path of a collection, e.g. `companies/newlanka/audit_logs`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CollectionPath(String);

impl CollectionPath {
    pub fn new(company_id: &str, collection: &str) -> Self {
        Self(format!("companies/{company_id}/{collection}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the document `id` inside this collection
    pub fn document(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A whole document to write.
///
/// `server_timestamp_field` is filled by the remote server with its own
/// clock when the write lands; it is never sent from here.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDocument {
    pub fields: Map<String, Value>,
    pub server_timestamp_field: &'static str,
}

impl RemoteDocument {
    /// Snapshot every serialized attribute of `entity`
    pub fn from_entity<T: Serialize>(
        entity: &T,
        server_timestamp_field: &'static str,
    ) -> Result<Self, RemoteError> {
        match serde_json::to_value(entity) {
            Ok(Value::Object(mut fields)) => {
                fields.remove(server_timestamp_field);
                Ok(Self {
                    fields,
                    server_timestamp_field,
                })
            }
            Ok(other) => Err(RemoteError::Encode(format!(
                "expected an object, got {}",
                kind_of(&other)
            ))),
            Err(e) => Err(RemoteError::Encode(e.to_string())),
        }
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// A network document store addressed by path
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Create or wholly overwrite the document at `path`
    async fn set(&self, path: &DocumentPath, document: RemoteDocument) -> Result<(), RemoteError>;

    /// Delete the document at `path`; succeeds when it does not exist
    async fn delete(&self, path: &DocumentPath) -> Result<(), RemoteError>;

    /// Insert a new document with a store-assigned id, returning that id
    async fn add(
        &self,
        collection: &CollectionPath,
        document: RemoteDocument,
    ) -> Result<String, RemoteError>;
}
