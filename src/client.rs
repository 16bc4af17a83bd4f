//! HTTP client with retry logic and failure notifications.
//!
//! The [`Client`] type is the main entry point for talking to the backend.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::ClientConfig,
    descriptor::RequestDescriptor,
    notify::{Notification, Notifier, Severity, TracingNotifier},
    retry::{RetryDecision, RetryPolicy},
    Error, Response, Result,
};
use http::{header, HeaderMap, HeaderName, HeaderValue};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

/// An HTTP client that retries transient failures and reports each failed
/// logical request exactly once.
///
/// The configuration is immutable after [`ClientBuilder::build`]. Cloning
/// is cheap and every clone shares the same connection pool, so the client
/// can be handed to as many polling tasks as needed.
///
/// # Examples
///
/// ```no_run
/// use nids_client::{Client, NotificationCenter};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), nids_client::Error> {
/// let toasts = NotificationCenter::new();
/// let client = Client::builder()
///     .base_url("http://localhost:8000")?
///     .timeout(Duration::from_secs(7))
///     .notifier(toasts.clone())
///     .build()?;
///
/// let health = client.get::<serde_json::Value>("/api/health").await?;
/// println!("backend: {}", health.data["status"]);
///
/// for toast in toasts.active() {
///     println!("{}", toast.notification.message);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: Url,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    timeout: Duration,
    notifier: Arc<dyn Notifier>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.inner.base_url.as_str())
            .field("timeout", &self.inner.timeout)
            .field("retry_policy", &self.inner.retry_policy)
            .finish_non_exhaustive()
    }
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Builds a client from `NIDS_API_BASE` / `NIDS_TIMEOUT_MS` with every
    /// other option at its default.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base address is not a valid URL.
    pub fn from_env() -> Result<Self> {
        Self::builder().config(ClientConfig::from_env())?.build()
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry_policy
    }

    /// Sends one logical request, retrying transient failures.
    ///
    /// Resolves with the decoded body once an attempt succeeds. If the
    /// failure is terminal, or the retry budget is spent, the last failure
    /// is returned and exactly one notification is delivered to the
    /// configured [`Notifier`]. A request that eventually succeeds delivers
    /// none.
    ///
    /// Dropping the returned future abandons the request: nothing is
    /// notified and nothing else is touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] without dispatching anything if the
    /// descriptor's path is empty. Otherwise returns the failure that ended
    /// the request.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use nids_client::{Client, RequestDescriptor};
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct Prediction { score: f64, status: String }
    ///
    /// # async fn example() -> Result<(), nids_client::Error> {
    /// let client = Client::from_env()?;
    /// let descriptor = RequestDescriptor::post(
    ///     "/api/predict",
    ///     &serde_json::json!({ "src_ip": "10.0.0.7", "dst_ip": "8.8.8.8", "features": [12, 3400, 0.8, 283.3, 4250.0] }),
    /// )?;
    ///
    /// let prediction = client.send::<Prediction>(descriptor).await?;
    /// println!("{} ({:.2})", prediction.status, prediction.score);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send<Res>(&self, descriptor: RequestDescriptor) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        descriptor.validate()?;
        let mut descriptor = descriptor.stamped(Instant::now());

        loop {
            let result = match self.execute_request(&descriptor).await {
                Ok(response) => self.parse_response(response, &descriptor).await,
                Err(e) => Err(e),
            };

            let error = match result {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            tracing::warn!(
                error = %error,
                retry = descriptor.retry_count(),
                method = %descriptor.method(),
                path = %descriptor.path(),
                "Request failed"
            );

            match self
                .inner
                .retry_policy
                .decide(&error, descriptor.retry_count())
            {
                RetryDecision::RetryAfter(delay) => {
                    tracing::info!(
                        delay_ms = delay.as_millis(),
                        retry = descriptor.retry_count() + 1,
                        class = ?error.classify(),
                        "Retrying request after delay"
                    );

                    tokio::time::sleep(delay).await;
                    self.progress_notice(&error, &descriptor);
                    descriptor = descriptor.next_attempt();
                }
                RetryDecision::GiveUp => {
                    tracing::error!(
                        error = %error,
                        retries = descriptor.retry_count(),
                        elapsed_ms = descriptor.elapsed().as_millis(),
                        path = %descriptor.path(),
                        "Giving up on request"
                    );
                    self.deliver(Notification::for_error(&error));
                    return Err(error);
                }
            }
        }
    }

    /// Low-urgency notice raised between attempts.
    ///
    /// It is suppressed while the request still has retries left, which is
    /// always the case here, so users only ever see the final failure.
    fn progress_notice(&self, error: &Error, descriptor: &RequestDescriptor) {
        if descriptor.is_health_check() {
            return;
        }
        let mut notice = Notification::for_error(error)
            .suppressed(descriptor.retry_count() < self.inner.retry_policy.max_retries);
        notice.severity = Severity::Warning;
        self.deliver(notice);
    }

    fn deliver(&self, notification: Notification) {
        if notification.suppressed {
            tracing::trace!(text = %notification.message, "Notification suppressed");
            return;
        }
        self.inner.notifier.notify(notification);
    }

    /// Executes a single attempt.
    async fn execute_request(&self, descriptor: &RequestDescriptor) -> Result<reqwest::Response> {
        let mut url = endpoint_url(&self.inner.base_url, descriptor.path());

        for (key, value) in descriptor.query_params() {
            url.query_pairs_mut().append_pair(key, value);
        }

        tracing::debug!(
            method = %descriptor.method(),
            url = %url,
            retry = descriptor.retry_count(),
            "Executing HTTP request"
        );

        let mut request = self
            .inner
            .http_client
            .request(descriptor.method().clone(), url)
            .timeout(self.inner.timeout);

        for (name, value) in &self.inner.default_headers {
            request = request.header(name, value);
        }

        for (name, value) in descriptor.headers() {
            request = request.header(name, value);
        }

        if let Some(body) = descriptor.body() {
            request = request.json(body);
        }

        request.send().await.map_err(transport_error)
    }

    /// Turns the raw response into a typed `Response` or an error.
    async fn parse_response<Res>(
        &self,
        response: reqwest::Response,
        descriptor: &RequestDescriptor,
    ) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        let status = response.status();
        let headers = response.headers().clone();
        let latency = descriptor.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            retries = descriptor.retry_count(),
            "Received HTTP response"
        );

        if !status.is_success() {
            let raw_response = response.text().await.unwrap_or_default();

            if status.is_client_error() {
                tracing::error!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Client error (4xx)"
                );
            } else if status.is_server_error() {
                tracing::warn!(
                    status = status.as_u16(),
                    response = %raw_response,
                    "Server error (5xx)"
                );
            }

            return Err(Error::HttpError {
                status,
                raw_response,
            });
        }

        let raw_body = response.text().await.map_err(transport_error)?;

        match serde_json::from_str::<Res>(&raw_body) {
            Ok(data) => Ok(Response::new(
                data,
                raw_body,
                status,
                headers,
                latency,
                descriptor.retry_count(),
            )),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %raw_body,
                    "Failed to deserialize response"
                );

                Err(Error::DeserializationFailed {
                    raw_response: raw_body,
                    serde_error: e.to_string(),
                    status,
                })
            }
        }
    }

    /// Makes a GET request to the specified path.
    pub async fn get<Res>(&self, path: impl Into<String>) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.send(RequestDescriptor::get(path)).await
    }

    /// Makes a POST request to the specified path with a JSON body.
    pub async fn post<Req, Res>(&self, path: impl Into<String>, body: &Req) -> Result<Response<Res>>
    where
        Req: Serialize,
        Res: DeserializeOwned,
    {
        self.send(RequestDescriptor::post(path, body)?).await
    }
}

/// Appends a request path to the base address's own path.
///
/// A query string written into the path is kept as the URL query.
fn endpoint_url(base: &Url, path: &str) -> Url {
    let (path, query) = match path.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (path, None),
    };

    let mut url = base.clone();
    url.set_path(&format!(
        "{}/{}",
        base.path().trim_end_matches('/'),
        path.trim_start_matches('/')
    ));
    url.set_query(query);
    url
}

/// Maps a transport failure, splitting timeouts out from other network errors.
fn transport_error(e: reqwest::Error) -> Error {
    if e.is_timeout() {
        Error::Timeout
    } else {
        Error::Network(e)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Defaults: base address from `NIDS_API_BASE` (else
/// `http://localhost:8000`), 7 second timeout, `Content-Type:
/// application/json`, [`RetryPolicy::default`], and a [`TracingNotifier`].
///
/// # Examples
///
/// ```no_run
/// use nids_client::{ClientBuilder, RetryPolicy};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), nids_client::Error> {
/// let client = ClientBuilder::new()
///     .base_url("http://10.0.0.2:8000")?
///     .timeout(Duration::from_secs(3))
///     .retry_policy(RetryPolicy { max_retries: 1, ..RetryPolicy::default() })
///     .default_header("User-Agent", "nids-dashboard/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
    timeout: Duration,
    notifier: Option<Arc<dyn Notifier>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Self {
            base_url: None,
            default_headers,
            retry_policy: RetryPolicy::default(),
            timeout: ClientConfig::default().timeout(),
            notifier: None,
        }
    }

    /// Sets the base URL for all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Applies a [`ClientConfig`] (base address and timeout).
    ///
    /// # Errors
    ///
    /// Returns an error if the configured base address is invalid.
    pub fn config(self, config: ClientConfig) -> Result<Self> {
        let timeout = config.timeout();
        Ok(self.base_url(&config.base_url)?.timeout(timeout))
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the retry policy.
    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Sets the per-attempt timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets where failure notifications go.
    pub fn notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Arc::new(notifier));
        self
    }

    /// Builds the configured `Client`. No request is made.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was set and the one resolved from the
    /// environment is invalid, or if the HTTP client cannot be created.
    pub fn build(self) -> Result<Client> {
        let base_url = match self.base_url {
            Some(url) => url,
            None => Url::parse(&ClientConfig::from_env().base_url)?,
        };

        if base_url.cannot_be_a_base() {
            return Err(Error::ConfigurationError(format!(
                "Base URL cannot be used as a base: {}",
                base_url
            )));
        }

        let http_client = reqwest::Client::builder().build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(TracingNotifier));

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                base_url,
                default_headers: self.default_headers,
                retry_policy: self.retry_policy,
                timeout: self.timeout,
                notifier,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
