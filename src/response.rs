//! Successful responses.
//!
//! [`Response`] pairs the decoded body with what the client observed while
//! getting it: status, headers, total latency and how many retries it took.

use http::{HeaderMap, StatusCode};
use std::time::Duration;

/// A decoded 2xx response.
///
/// Derefs to the decoded body, so views can use it directly.
///
/// # Examples
///
/// ```no_run
/// use nids_client::Client;
///
/// # async fn example() -> Result<(), nids_client::Error> {
/// let client = Client::from_env()?;
/// let alerts = client.get::<Vec<serde_json::Value>>("/api/alerts").await?;
///
/// println!("{} alerts", alerts.len());
/// println!("took {:?} over {} retries", alerts.latency, alerts.retries);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Response<T> {
    /// The decoded response body.
    pub data: T,

    /// The body exactly as received.
    pub raw_body: String,

    pub status: StatusCode,

    pub headers: HeaderMap,

    /// Time from the first attempt's dispatch to the successful response,
    /// backoff waits included.
    pub latency: Duration,

    /// Retries spent before this response arrived (0 = first attempt succeeded).
    pub retries: u32,
}

impl<T> Response<T> {
    pub fn new(
        data: T,
        raw_body: String,
        status: StatusCode,
        headers: HeaderMap,
        latency: Duration,
        retries: u32,
    ) -> Self {
        Self {
            data,
            raw_body,
            status,
            headers,
            latency,
            retries,
        }
    }

    /// Maps the decoded body, keeping the diagnostics.
    ///
    /// # Examples
    ///
    /// ```
    /// # use nids_client::Response;
    /// # use http::{HeaderMap, StatusCode};
    /// # use std::time::Duration;
    /// let response = Response::new(
    ///     vec![1, 0, 1],
    ///     "[1,0,1]".to_string(),
    ///     StatusCode::OK,
    ///     HeaderMap::new(),
    ///     Duration::from_millis(40),
    ///     0,
    /// );
    ///
    /// let intrusions = response.map(|labels| labels.iter().filter(|l| **l == 1).count());
    /// assert_eq!(intrusions.data, 2);
    /// ```
    pub fn map<U, F>(self, f: F) -> Response<U>
    where
        F: FnOnce(T) -> U,
    {
        Response {
            data: f(self.data),
            raw_body: self.raw_body,
            status: self.status,
            headers: self.headers,
            latency: self.latency,
            retries: self.retries,
        }
    }

    /// Drops the diagnostics and returns the decoded body.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Returns `true` if at least one retry was needed.
    pub fn was_retried(&self) -> bool {
        self.retries > 0
    }
}

impl<T> std::ops::Deref for Response<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
