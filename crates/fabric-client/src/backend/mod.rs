//! Transport backends for the fabric controller API.
//!
//! [`http::HttpBackend`] talks to a real controller. [`MockBackend`] is an
//! in-memory controller for tests and dry runs.
//!
//! # Testing
//!
//! ```
//! use fabric_client::backend::{Backend, MockBackend};
//! use serde_json::json;
//!
//! let mock = MockBackend::new();
//! mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
//!
//! let fabric = mock.get("/api/v1/fabrics/fab-a").unwrap();
//! assert_eq!(fabric["id"], "F1");
//! ```

pub mod http;

use crate::error::{Error, Result};
use crate::types::API_PREFIX;
use reconcile::child_path;
use serde_json::{Map, Value as Json, json};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// JSON-over-HTTP transport.
///
/// Paths are absolute API paths (`/api/v1/fabrics/F1`). A missing resource
/// is reported as an error whose category is `NotFound`.
pub trait Backend: Send + Sync {
    fn get(&self, path: &str) -> Result<Json>;

    fn post(&self, path: &str, body: &Json) -> Result<Json>;

    fn put(&self, path: &str, body: &Json) -> Result<Json>;

    fn delete(&self, path: &str) -> Result<()>;
}

/// In-memory fabric controller.
///
/// Objects are keyed by resource path (`fabrics/F1/nodes/N1`). Lookups
/// accept either the object's id or its `name` as the final component,
/// creation assigns ids and fills the ancestor id keys (`fabricId`,
/// `nodeId`) from the path.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    objects: Arc<Mutex<BTreeMap<String, Map<String, Json>>>>,
    requests: Arc<Mutex<Vec<String>>>,
    next_id: Arc<Mutex<u64>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn resource_path(path: &str) -> &str {
    path.strip_prefix(API_PREFIX)
        .unwrap_or(path)
        .trim_matches('/')
}

/// `fabrics` -> `fabricId`
fn ancestor_key(collection: &str) -> String {
    format!("{}Id", collection.strip_suffix('s').unwrap_or(collection))
}

impl MockBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object at a resource path
    pub fn insert(&self, path: &str, object: Json) {
        let object = match object {
            Json::Object(map) => map,
            _ => Map::new(),
        };
        lock(&self.objects).insert(resource_path(path).to_string(), object);
    }

    /// Object stored at a resource path, without name resolution
    pub fn object(&self, path: &str) -> Option<Json> {
        lock(&self.objects)
            .get(resource_path(path))
            .cloned()
            .map(Json::Object)
    }

    /// Requests seen so far, as `METHOD /api/v1/...`
    pub fn requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    fn record(&self, method: &str, path: &str) {
        lock(&self.requests).push(format!("{method} {path}"));
    }

    /// Resolve a path whose components may be ids or names
    fn resolve(objects: &BTreeMap<String, Map<String, Json>>, path: &str) -> Option<String> {
        let parts: Vec<&str> = path.split('/').collect();
        if parts.len() % 2 != 0 {
            return None;
        }

        let mut resolved = String::new();
        for pair in parts.chunks_exact(2) {
            let collection = if resolved.is_empty() {
                pair[0].to_string()
            } else {
                format!("{resolved}/{}", pair[0])
            };
            let direct = format!("{collection}/{}", pair[1]);
            resolved = if objects.contains_key(&direct) {
                direct
            } else {
                objects
                    .iter()
                    .find(|(key, object)| {
                        key.rsplit_once('/').is_some_and(|(p, _)| p == collection)
                            && object.get("name").and_then(Json::as_str) == Some(pair[1])
                    })
                    .map_or(direct, |(key, _)| key.clone())
            };
        }
        objects.contains_key(&resolved).then_some(resolved)
    }

    fn not_found(path: &str) -> Error {
        Error::http(format!("HTTP 404 for {path}"), Some(404))
    }

    fn assign_id(&self) -> String {
        let mut next = lock(&self.next_id);
        *next += 1;
        format!("00000000-0000-4000-8000-{:012x}", *next)
    }
}

impl Backend for MockBackend {
    fn get(&self, path: &str) -> Result<Json> {
        self.record("GET", path);
        let objects = lock(&self.objects);
        let key = Self::resolve(&objects, resource_path(path)).ok_or_else(|| Self::not_found(path))?;
        Ok(objects.get(&key).cloned().map(Json::Object).unwrap_or_default())
    }

    fn post(&self, path: &str, body: &Json) -> Result<Json> {
        self.record("POST", path);
        let requested = resource_path(path);
        let (parent, collection) = requested.rsplit_once('/').unwrap_or(("", requested));
        let parent = if parent.is_empty() {
            String::new()
        } else {
            Self::resolve(&lock(&self.objects), parent).unwrap_or_else(|| parent.to_string())
        };
        let collection_path = child_path(&parent, collection);
        let items = body
            .get(collection)
            .and_then(Json::as_array)
            .ok_or_else(|| Error::http(format!("HTTP 400: expected {collection:?} array"), Some(400)))?;

        let ancestors: Vec<(String, Json)> = parent
            .split('/')
            .collect::<Vec<_>>()
            .chunks_exact(2)
            .map(|pair| (ancestor_key(pair[0]), json!(pair[1])))
            .collect();

        let mut created = Vec::with_capacity(items.len());
        for item in items {
            let mut object = item.as_object().cloned().unwrap_or_default();
            let id = self.assign_id();
            object.insert("id".to_string(), json!(id));
            for (key, value) in &ancestors {
                object.entry(key.clone()).or_insert_with(|| value.clone());
            }
            lock(&self.objects).insert(format!("{collection_path}/{id}"), object.clone());
            created.push(Json::Object(object));
        }
        let mut response = Map::new();
        response.insert(collection.to_string(), Json::Array(created));
        Ok(Json::Object(response))
    }

    fn put(&self, path: &str, body: &Json) -> Result<Json> {
        self.record("PUT", path);
        let mut objects = lock(&self.objects);
        let key = Self::resolve(&objects, resource_path(path)).ok_or_else(|| Self::not_found(path))?;
        let object = objects.entry(key).or_default();
        if let Some(fields) = body.as_object() {
            for (k, v) in fields {
                object.insert(k.clone(), v.clone());
            }
        }
        Ok(Json::Object(object.clone()))
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.record("DELETE", path);
        let mut objects = lock(&self.objects);
        let key = Self::resolve(&objects, resource_path(path)).ok_or_else(|| Self::not_found(path))?;
        let children = format!("{key}/");
        objects.retain(|k, _| k != &key && !k.starts_with(&children));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_get_by_id_and_name() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        assert_eq!(mock.get("/api/v1/fabrics/F1").unwrap()["name"], "fab-a");
        assert_eq!(mock.get("/api/v1/fabrics/fab-a").unwrap()["id"], "F1");
        assert!(mock.get("/api/v1/fabrics/nope").unwrap_err().is_not_found());
    }

    #[test]
    fn test_mock_resolves_names_at_every_level() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        mock.insert("fabrics/F1/nodes/N1", json!({"id": "N1", "name": "leaf1"}));
        assert_eq!(
            mock.get("/api/v1/fabrics/fab-a/nodes/leaf1").unwrap()["id"],
            "N1"
        );
        assert_eq!(mock.get("/api/v1/fabrics/F1/nodes/leaf1").unwrap()["id"], "N1");
        assert!(mock.get("/api/v1/fabrics/fab-a/nodes").unwrap_err().is_not_found());

        let body = json!({"vrfs": [{"name": "blue"}]});
        let created = mock.post("/api/v1/fabrics/fab-a/vrfs", &body).unwrap();
        assert_eq!(created["vrfs"][0]["fabricId"], "F1");
    }

    #[test]
    fn test_mock_post_assigns_ids_and_ancestors() {
        let mock = MockBackend::new();
        let body = json!({"breakouts": [{"name": "brk1", "mode": "4x25G(4)"}]});
        let response = mock
            .post("/api/v1/fabrics/F1/nodes/N1/breakouts", &body)
            .unwrap();
        let created = &response["breakouts"][0];
        assert_eq!(created["fabricId"], "F1");
        assert_eq!(created["nodeId"], "N1");
        let id = created["id"].as_str().unwrap();
        assert!(mock.object(&format!("fabrics/F1/nodes/N1/breakouts/{id}")).is_some());
    }

    #[test]
    fn test_mock_post_rejects_unwrapped_payload() {
        let mock = MockBackend::new();
        let err = mock
            .post("/api/v1/fabrics", &json!({"name": "fab-a"}))
            .unwrap_err();
        assert_eq!(err.category(), crate::ErrorCategory::Client);
    }

    #[test]
    fn test_mock_put_merges_fields() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        let updated = mock
            .put("/api/v1/fabrics/F1", &json!({"description": "lab"}))
            .unwrap();
        assert_eq!(updated["name"], "fab-a");
        assert_eq!(updated["description"], "lab");
    }

    #[test]
    fn test_mock_delete_removes_children() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1"}));
        mock.insert("fabrics/F1/nodes/N1", json!({"id": "N1"}));
        mock.insert("fabrics/F2", json!({"id": "F2"}));
        mock.delete("/api/v1/fabrics/F1").unwrap();
        assert!(mock.object("fabrics/F1/nodes/N1").is_none());
        assert!(mock.object("fabrics/F2").is_some());
        assert!(mock.delete("/api/v1/fabrics/F1").unwrap_err().is_not_found());
        assert_eq!(mock.requests().len(), 2);
    }
}
