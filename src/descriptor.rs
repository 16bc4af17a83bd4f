//! Request descriptors.
//!
//! A [`RequestDescriptor`] carries everything needed to dispatch one
//! attempt of a logical request. Retries never mutate a descriptor in
//! place; [`RequestDescriptor::next_attempt`] consumes it and returns a new
//! one with the retry counter bumped, so concurrent requests can never
//! share a counter.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde::Serialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// One logical request to the backend.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    path: String,
    body: Option<serde_json::Value>,
    headers: HeaderMap,
    query_params: HashMap<String, String>,
    retry_count: u32,
    started_at: Option<Instant>,
}

impl RequestDescriptor {
    /// Creates a descriptor with the given method and path and no body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            query_params: HashMap::new(),
            retry_count: 0,
            started_at: None,
        }
    }

    /// Shorthand for a GET descriptor.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Shorthand for a POST descriptor with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SerializationFailed`] if the body cannot be
    /// encoded as JSON.
    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> crate::Result<Self> {
        Self::new(Method::POST, path).with_json(body)
    }

    /// Attaches a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SerializationFailed`] if the body cannot be
    /// encoded as JSON.
    pub fn with_json<B: Serialize>(mut self, body: &B) -> crate::Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| crate::Error::SerializationFailed(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    /// Adds a header to the request.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(
        mut self,
        name: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> crate::Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| crate::Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Adds a query parameter to the request.
    pub fn with_query_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn query_params(&self) -> &HashMap<String, String> {
        &self.query_params
    }

    /// Retries already performed for this logical request.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// When the first attempt was dispatched, if it has been.
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Time since the first attempt was dispatched.
    pub fn elapsed(&self) -> Duration {
        self.started_at.map(|t| t.elapsed()).unwrap_or_default()
    }

    /// Returns `true` for health-check paths, which never raise progress notices.
    pub fn is_health_check(&self) -> bool {
        self.path.contains("/health")
    }

    /// Checks the descriptor's constraints before dispatch.
    pub(crate) fn validate(&self) -> crate::Result<()> {
        if self.path.trim().is_empty() {
            return Err(crate::Error::InvalidRequest(
                "request path must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Stamps the start time. Later stamps are ignored so the timestamp
    /// always refers to the first attempt.
    pub(crate) fn stamped(mut self, now: Instant) -> Self {
        self.started_at.get_or_insert(now);
        self
    }

    /// Consumes this descriptor and returns the one for the next retry.
    pub(crate) fn next_attempt(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self
        }
    }
}
