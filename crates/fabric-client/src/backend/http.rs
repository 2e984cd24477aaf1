//! HTTP backend for a live fabric controller.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::ClientConfig;
use serde_json::Value as Json;
use ureq::Body;
use ureq::http::Response;

/// Talks JSON to the controller with a bearer token.
pub struct HttpBackend {
    agent: ureq::Agent,
    /// Controller base URL without trailing slash
    endpoint: String,
    authorization: String,
}

impl HttpBackend {
    /// Create a backend from connection settings.
    ///
    /// The endpoint must be an `http://` or `https://` URL and the token
    /// must not be empty.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/');
        if !(endpoint.starts_with("https://") || endpoint.starts_with("http://")) {
            return Err(Error::Config(format!(
                "endpoint {:?} is not an http(s) URL",
                config.endpoint
            )));
        }
        if config.token.is_empty() {
            return Err(Error::Config("API token is empty".to_string()));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();
        Ok(Self {
            agent,
            endpoint: endpoint.to_string(),
            authorization: format!("Bearer {}", config.token),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoint)
    }
}

/// Parse a response body; an empty body reads as JSON `null`
fn read_body(mut response: Response<Body>) -> Result<Json> {
    let text = response.body_mut().read_to_string()?;
    if text.trim().is_empty() {
        return Ok(Json::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

impl Backend for HttpBackend {
    fn get(&self, path: &str) -> Result<Json> {
        log::trace!("GET {path}");
        let response = self
            .agent
            .get(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call()?;
        read_body(response)
    }

    fn post(&self, path: &str, body: &Json) -> Result<Json> {
        log::trace!("POST {path}");
        let response = self
            .agent
            .post(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .send_json(body)?;
        read_body(response)
    }

    fn put(&self, path: &str, body: &Json) -> Result<Json> {
        log::trace!("PUT {path}");
        let response = self
            .agent
            .put(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .send_json(body)?;
        read_body(response)
    }

    fn delete(&self, path: &str) -> Result<()> {
        log::trace!("DELETE {path}");
        self.agent
            .delete(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .call()?;
        Ok(())
    }
}
