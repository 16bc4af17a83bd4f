//! Error types and failure classification for backend calls.
//!
//! Every failed attempt is an [`Error`]. [`Error::classify`] sorts it into
//! one of three [`ErrorClass`]es that drive the retry policy, and
//! [`Error::user_message`] resolves the text shown to the user when the
//! failure ends a logical request.

use http::StatusCode;

/// Message used when no response was received at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error - please check your connection";

/// Message used when neither the server nor the status table has anything better.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

/// HTTP statuses that are worth retrying.
pub const RETRYABLE_STATUSES: [u16; 6] = [408, 429, 500, 502, 503, 504];

/// The main error type for backend calls.
///
/// # Examples
///
/// ```no_run
/// use nids_client::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder()
///     .base_url("http://localhost:8000")?
///     .build()?;
///
/// match client.get::<serde_json::Value>("/api/health").await {
///     Ok(response) => println!("Backend says: {:?}", response.data),
///     Err(Error::HttpError { status, raw_response }) => {
///         eprintln!("HTTP error {}: {}", status, raw_response);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// No response was received (connection refused, DNS failure, reset, ...).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The request did not complete within the configured timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend answered with a non-2xx status.
    ///
    /// `raw_response` keeps the body verbatim; [`Error::server_message`]
    /// extracts a message from it when the body is JSON.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
    },

    /// A 2xx body could not be decoded into the expected type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// The request body could not be encoded as JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The client was configured with an invalid option.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A request descriptor violated its constraints (e.g. empty path).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An invalid URL was provided.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// How a failure should be treated by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// No response was received. Retryable.
    Network,
    /// The server answered with a status that may clear up on its own. Retryable.
    Transient,
    /// Retrying the identical request will not help.
    Terminal,
}

impl ErrorClass {
    /// Returns `true` for [`ErrorClass::Network`] and [`ErrorClass::Transient`].
    pub fn is_retryable(self) -> bool {
        !matches!(self, ErrorClass::Terminal)
    }
}

impl Error {
    /// Classifies this error for retry purposes.
    ///
    /// # Examples
    ///
    /// ```
    /// use nids_client::{Error, ErrorClass};
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     raw_response: String::new(),
    /// };
    /// assert_eq!(err.classify(), ErrorClass::Transient);
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::NOT_FOUND,
    ///     raw_response: String::new(),
    /// };
    /// assert_eq!(err.classify(), ErrorClass::Terminal);
    ///
    /// assert_eq!(Error::Timeout.classify(), ErrorClass::Network);
    /// ```
    pub fn classify(&self) -> ErrorClass {
        match self {
            Error::Network(_) | Error::Timeout => ErrorClass::Network,
            Error::HttpError { status, .. } if RETRYABLE_STATUSES.contains(&status.as_u16()) => {
                ErrorClass::Transient
            }
            Error::HttpError { .. }
            | Error::DeserializationFailed { .. }
            | Error::SerializationFailed(_)
            | Error::ConfigurationError(_)
            | Error::InvalidRequest(_)
            | Error::InvalidUrl(_) => ErrorClass::Terminal,
        }
    }

    /// Returns `true` if retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        self.classify().is_retryable()
    }

    /// Returns `true` if no response was received.
    pub fn is_network(&self) -> bool {
        self.classify() == ErrorClass::Network
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    /// Extracts a message the server embedded in its error body.
    ///
    /// Looks for a non-empty `message` field, then `error` (which is what the
    /// NIDS backend emits). Non-JSON bodies yield `None`.
    pub fn server_message(&self) -> Option<String> {
        let Error::HttpError { raw_response, .. } = self else {
            return None;
        };
        let body: serde_json::Value = serde_json::from_str(raw_response).ok()?;
        ["message", "error"]
            .iter()
            .filter_map(|key| body.get(key)?.as_str())
            .map(str::trim)
            .find(|text| !text.is_empty())
            .map(str::to_owned)
    }

    /// Resolves the text shown to the user for this failure.
    ///
    /// Prefers the server's own message, then the status table, then a
    /// generic fallback. Failures without a response get the network text.
    ///
    /// # Examples
    ///
    /// ```
    /// use nids_client::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::NOT_FOUND,
    ///     raw_response: r#"{"message":"model not found"}"#.to_string(),
    /// };
    /// assert_eq!(err.user_message(), "model not found");
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::BAD_GATEWAY,
    ///     raw_response: "<html>upstream down</html>".to_string(),
    /// };
    /// assert_eq!(err.user_message(), "Bad gateway");
    /// ```
    pub fn user_message(&self) -> String {
        if self.is_network() {
            return NETWORK_ERROR_MESSAGE.to_string();
        }
        if let Some(message) = self.server_message() {
            return message;
        }
        self.status()
            .and_then(status_message)
            .unwrap_or(GENERIC_ERROR_MESSAGE)
            .to_string()
    }
}

/// Fixed status-to-message table.
pub fn status_message(status: StatusCode) -> Option<&'static str> {
    let message = match status.as_u16() {
        400 => "Invalid request data",
        401 => "Unauthorized",
        403 => "Access forbidden",
        404 => "Resource not found",
        500 => "Internal server error",
        502 => "Bad gateway",
        503 => "Service unavailable",
        504 => "Gateway timeout",
        _ => return None,
    };
    Some(message)
}

/// A specialized `Result` type for backend calls.
pub type Result<T> = std::result::Result<T, Error>;
