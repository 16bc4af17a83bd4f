//! Connection settings resolved from the environment.
//!
//! [`ClientConfig`] carries the backend base address and the per-attempt
//! timeout. Values are read once, when the client is built.

/// Environment variable holding the backend base address.
pub const BASE_URL_ENV: &str = "NIDS_API_BASE";

/// Environment variable holding the per-attempt timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "NIDS_TIMEOUT_MS";

/// Base address used when the environment does not provide one.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Per-attempt timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 7000;

/// Connection settings for [`crate::Client`].
///
/// Resolved once when the client is built; later changes to the
/// environment are not picked up.
#[derive(Clone, Debug, Eq, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Scheme, host and port of the backend.
    pub base_url: String,
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ClientConfig {
    /// Reads `NIDS_API_BASE` and `NIDS_TIMEOUT_MS`, falling back to the
    /// defaults for anything missing, blank or unparseable.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let base_url = lookup(BASE_URL_ENV)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or(defaults.base_url);
        let timeout_ms = lookup(TIMEOUT_ENV)
            .and_then(|value| value.trim().parse().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(defaults.timeout_ms);
        Self {
            base_url,
            timeout_ms,
        }
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_ms)
    }
}
