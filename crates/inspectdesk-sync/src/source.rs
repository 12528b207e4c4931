//! List sources and response unwrapping.

use std::collections::HashMap;

use async_trait::async_trait;
use inspectdesk_core::Endpoint;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum SyncError {
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("response holds no list under `{key}`")]
    NotAList { key: String },
}

/// Anything that can answer a GET for a record list.
#[async_trait]
pub trait ListSource: Send + Sync {
    /// The raw items found under the endpoint's list key.
    async fn fetch_list(&self, endpoint: &Endpoint) -> Result<Vec<Value>, SyncError>;
}

/// Pull the array out of a response body.
///
/// A missing or null key is an empty list. A bare array is taken as is.
pub fn extract_list(body: Value, key: &str) -> Result<Vec<Value>, SyncError> {
    match body {
        Value::Object(mut map) => match map.remove(key) {
            None | Some(Value::Null) => {
                debug!(key, "response has no list key, treating as empty");
                Ok(Vec::new())
            }
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(SyncError::NotAList {
                key: key.to_string(),
            }),
        },
        Value::Array(items) => Ok(items),
        _ => Err(SyncError::NotAList {
            key: key.to_string(),
        }),
    }
}

pub fn decode_list<T: DeserializeOwned>(items: Vec<Value>) -> Result<Vec<T>, SyncError> {
    items
        .into_iter()
        .map(|item| serde_json::from_value(item).map_err(SyncError::from))
        .collect()
}

/// Canned response bodies keyed by endpoint path. Unknown paths answer 404.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    bodies: HashMap<String, Value>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, path: &str, body: Value) -> Self {
        self.bodies.insert(path.to_string(), body);
        self
    }
}

#[async_trait]
impl ListSource for MemorySource {
    async fn fetch_list(&self, endpoint: &Endpoint) -> Result<Vec<Value>, SyncError> {
        let body = self
            .bodies
            .get(&endpoint.path)
            .cloned()
            .ok_or_else(|| SyncError::Server {
                status: 404,
                body: format!("no such path: {}", endpoint.path),
            })?;
        extract_list(body, &endpoint.list_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inspectdesk_core::{Document, Stored, User};
    use serde_json::json;

    #[test]
    fn wrapper_key_is_honoured() {
        let items = extract_list(json!({"date": [{"no": 1}], "data": []}), "date").unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn missing_key_is_empty() {
        assert!(extract_list(json!({"status": "ok"}), "data").unwrap().is_empty());
        assert!(extract_list(json!({"data": null}), "data").unwrap().is_empty());
    }

    #[test]
    fn wrong_shape_is_an_error() {
        assert!(matches!(
            extract_list(json!({"data": "nope"}), "data"),
            Err(SyncError::NotAList { .. })
        ));
        assert!(extract_list(json!("nope"), "data").is_err());
    }

    #[test]
    fn decode_tolerates_loose_values() {
        let items = vec![json!({
            "id": 17,
            "created_at": "2024-01-15T08:00:00Z",
            "no": 12,
            "ir": "IR-3",
            "outNo": null,
            "submitDate": "2024-01-15T08:00:00Z",
            "progress": "បានធ្វើចេញ"
        })];
        let docs: Vec<Stored<Document>> = decode_list(items).unwrap();
        assert_eq!(docs[0].id.as_str(), "17");
        assert_eq!(docs[0].record.no, "12");
        assert_eq!(docs[0].record.out_no, "");
    }

    #[test]
    fn decode_fails_on_garbage() {
        let result: Result<Vec<Stored<User>>, _> = decode_list(vec![json!([1, 2])]);
        assert!(matches!(result, Err(SyncError::Json(_))));
    }

    #[tokio::test]
    async fn memory_source_serves_and_misses() {
        let source = MemorySource::new().with_body("/fac", json!({"data": [{"id": 1}]}));
        let hit = source.fetch_list(&Endpoint::new("/fac", "data")).await.unwrap();
        assert_eq!(hit.len(), 1);
        let miss = source.fetch_list(&Endpoint::new("/user", "data")).await;
        assert!(matches!(miss, Err(SyncError::Server { status: 404, .. })));
    }
}
