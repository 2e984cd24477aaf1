//! # fabric-client
//!
//! Blocking REST client for a fabric controller.
//!
//! [`Client`] implements [`reconcile::Collaborator`], so it plugs straight
//! into a [`reconcile::Engine`]:
//!
//! ```no_run
//! use fabric_client::{Client, ClientConfig};
//! use reconcile::Collaborator;
//!
//! let client = Client::new(&ClientConfig::new("https://fabric.example.com", "token"))
//!     .expect("invalid settings");
//! let fabric = client.fetch("fabrics/fab-a").expect("request failed");
//! println!("found: {}", fabric.is_some());
//! ```
//!
//! ## Wire conventions
//!
//! - Every path lives under `/api/v1/`
//! - `404` means the resource does not exist
//! - Creation wraps the payload in a one-element array under the
//!   collection name (`{"breakouts": [{...}]}`) and the response carries
//!   the created object the same way
//! - Updates send a flat object
//!
//! Idempotent requests are retried with exponential backoff on transient
//! failures.

pub mod backend;
pub mod error;
pub mod retry;
pub mod types;

pub use backend::MockBackend;
pub use error::{Error, ErrorCategory, Result};
pub use types::{API_PREFIX, ClientConfig, RetryConfig};

use backend::Backend;
use backend::http::HttpBackend;
use reconcile::{Collaborator, RemoteSnapshot, child_path};
use retry::{LogCallback, with_retry};
use serde_json::Value as Json;

/// High-level client for fabric controller operations.
pub struct Client {
    backend: Box<dyn Backend>,
    retry: RetryConfig,
}

impl Client {
    /// Create a client talking HTTP to the configured controller.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self {
            backend: Box::new(HttpBackend::new(config)?),
            retry: config.retry.clone(),
        })
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self {
            backend,
            retry: RetryConfig::default(),
        }
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run an idempotent request with retry.
    fn idempotent<T>(&self, operation: impl FnMut() -> Result<T>) -> Result<T> {
        with_retry(&self.retry, Some(&LogCallback), operation)
    }
}

/// `fabrics/F1` -> `/api/v1/fabrics/F1`
pub fn api_path(path: &str) -> String {
    format!("{API_PREFIX}/{}", path.trim_start_matches('/'))
}

fn into_object(value: Json, context: &str) -> reconcile::Result<RemoteSnapshot> {
    match value {
        Json::Object(map) => Ok(map),
        Json::Null => Ok(RemoteSnapshot::new()),
        other => Err(reconcile::Error::UnexpectedResponse(format!(
            "{context}: expected an object, got {other}"
        ))),
    }
}

impl Collaborator for Client {
    fn fetch(&self, path: &str) -> reconcile::Result<Option<RemoteSnapshot>> {
        let url = api_path(path);
        match self.idempotent(|| self.backend.get(&url)) {
            Ok(value) => into_object(value, &url).map(Some),
            Err(err) if err.is_not_found() => {
                log::debug!("{url} not found");
                Ok(None)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn create(
        &self,
        parent_path: &str,
        collection: &str,
        payload: RemoteSnapshot,
    ) -> reconcile::Result<RemoteSnapshot> {
        let url = api_path(&child_path(parent_path, collection));
        let mut body = serde_json::Map::new();
        body.insert(
            collection.to_string(),
            Json::Array(vec![Json::Object(payload)]),
        );

        // Not idempotent, never retried
        let mut response = self.backend.post(&url, &Json::Object(body))?;
        let created = response
            .get_mut(collection)
            .and_then(Json::as_array_mut)
            .filter(|items| !items.is_empty())
            .map(|items| items.swap_remove(0))
            .ok_or_else(|| {
                reconcile::Error::UnexpectedResponse(format!(
                    "{url}: response carries no {collection:?} entry"
                ))
            })?;
        into_object(created, &url)
    }

    fn update(&self, path: &str, payload: RemoteSnapshot) -> reconcile::Result<RemoteSnapshot> {
        let url = api_path(path);
        let body = Json::Object(payload);
        let response = self.idempotent(|| self.backend.put(&url, &body))?;
        into_object(response, &url)
    }

    fn delete(&self, path: &str) -> reconcile::Result<()> {
        let url = api_path(path);
        match self.idempotent(|| self.backend.delete(&url)) {
            Ok(()) => Ok(()),
            Err(err) if err.is_not_found() => {
                log::debug!("{url} already gone");
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    fn client_with(mock: &MockBackend) -> Client {
        Client::with_backend(Box::new(mock.clone()))
    }

    #[test]
    fn test_api_path() {
        assert_eq!(api_path("fabrics/F1"), "/api/v1/fabrics/F1");
        assert_eq!(api_path("/fabrics"), "/api/v1/fabrics");
    }

    #[test]
    fn test_fetch_found_and_missing() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        let client = client_with(&mock);

        let found = client.fetch("fabrics/fab-a").unwrap().unwrap();
        assert_eq!(found["id"], "F1");
        assert!(client.fetch("fabrics/F9").unwrap().is_none());
    }

    #[test]
    fn test_create_wraps_payload_in_collection() {
        let mock = MockBackend::new();
        let client = client_with(&mock);
        let mut payload = RemoteSnapshot::new();
        payload.insert("name".into(), json!("brk1"));

        let created = client
            .create("fabrics/F1/nodes/N1", "breakouts", payload)
            .unwrap();
        assert_eq!(created["name"], "brk1");
        assert_eq!(created["nodeId"], "N1");
        assert_eq!(
            mock.requests(),
            vec!["POST /api/v1/fabrics/F1/nodes/N1/breakouts".to_string()]
        );
    }

    #[test]
    fn test_create_root_collection() {
        let mock = MockBackend::new();
        let client = client_with(&mock);
        let mut payload = RemoteSnapshot::new();
        payload.insert("name".into(), json!("fab-a"));
        let created = client.create("", "fabrics", payload).unwrap();
        assert!(created["id"].is_string());
        assert_eq!(mock.requests(), vec!["POST /api/v1/fabrics".to_string()]);
    }

    #[test]
    fn test_update_sends_flat_object() {
        let mock = MockBackend::new();
        mock.insert("fabrics/F1", json!({"id": "F1", "name": "fab-a"}));
        let client = client_with(&mock);
        let mut payload = RemoteSnapshot::new();
        payload.insert("description".into(), json!("lab"));

        let updated = client.update("fabrics/F1", payload).unwrap();
        assert_eq!(updated["description"], "lab");
        assert_eq!(mock.object("fabrics/F1").unwrap()["description"], "lab");
    }

    #[test]
    fn test_delete_missing_is_ok() {
        let mock = MockBackend::new();
        let client = client_with(&mock);
        client.delete("fabrics/F1").unwrap();
    }

    /// Fails with a server error a fixed number of times, then succeeds
    struct Flaky {
        failures: AtomicU32,
        calls: Arc<AtomicU32>,
    }

    impl Flaky {
        fn new(failures: u32) -> (Self, Arc<AtomicU32>) {
            let calls = Arc::new(AtomicU32::new(0));
            let flaky = Self {
                failures: AtomicU32::new(failures),
                calls: Arc::clone(&calls),
            };
            (flaky, calls)
        }
    }

    impl Backend for Flaky {
        fn get(&self, _path: &str) -> Result<Json> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(Error::http("HTTP 503", Some(503)));
            }
            Ok(json!({"id": "F1"}))
        }

        fn post(&self, _path: &str, _body: &Json) -> Result<Json> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::http("HTTP 503", Some(503)))
        }

        fn put(&self, path: &str, _body: &Json) -> Result<Json> {
            self.get(path)
        }

        fn delete(&self, _path: &str) -> Result<()> {
            Err(Error::http("HTTP 401", Some(401)))
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(2),
        }
    }

    #[test]
    fn test_fetch_retries_transient_failures() {
        let (flaky, calls) = Flaky::new(2);
        let client = Client::with_backend(Box::new(flaky)).retry(fast_retry());
        let found = client.fetch("fabrics/F1").unwrap();
        assert!(found.is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_create_is_not_retried() {
        let (flaky, calls) = Flaky::new(0);
        let client = Client::with_backend(Box::new(flaky)).retry(fast_retry());
        let err = client
            .create("", "fabrics", RemoteSnapshot::new())
            .unwrap_err();
        assert!(matches!(err, reconcile::Error::Remote(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_auth_failure_surfaces() {
        let (flaky, _) = Flaky::new(0);
        let client = Client::with_backend(Box::new(flaky)).retry(fast_retry());
        let err = client.delete("fabrics/F1").unwrap_err();
        assert!(err.to_string().contains("401"));
    }
}
