//! Transport configuration for talking to the study backend.

use std::collections::HashMap;
use std::time::Duration;

use crate::client::ClientError;

/// Backend address used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";

const BASE_URL_ENV: &str = "STUDYKIT_BASE_URL";
const TIMEOUT_ENV: &str = "STUDYKIT_TIMEOUT_SECS";

/// Transport options for every request the client sends.
///
/// # Example
/// ```rust
/// use studykit::options::TransportOptions;
/// use std::time::Duration;
///
/// let options = TransportOptions::new("http://localhost:5000")
///     .with_timeout(Duration::from_secs(30))
///     .with_header("X-Client".to_string(), "studykit".to_string());
/// assert_eq!(options.base_url, "http://localhost:5000");
/// ```
#[derive(Debug, Clone)]
pub struct TransportOptions {
    /// Base URL of the backend, without a trailing slash
    pub base_url: String,

    /// Request timeout. Applies to the whole response, so leave it unset
    /// for long streams.
    pub timeout: Option<Duration>,

    /// HTTP proxy URL
    pub proxy: Option<String>,

    /// Additional HTTP headers to include in requests
    pub extra_headers: Option<HashMap<String, String>>,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl TransportOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: None,
            proxy: None,
            extra_headers: None,
        }
    }

    /// Build options from `STUDYKIT_BASE_URL` and `STUDYKIT_TIMEOUT_SECS`,
    /// falling back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let mut options = match lookup(BASE_URL_ENV) {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        };

        if let Some(secs) = lookup(TIMEOUT_ENV) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                ClientError::Config(format!("{TIMEOUT_ENV} must be a whole number of seconds, got {secs:?}"))
            })?;
            options.timeout = Some(Duration::from_secs(secs));
        }

        Ok(options)
    }

    /// Set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the proxy URL.
    pub fn with_proxy(mut self, proxy: String) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Add a single extra header.
    pub fn with_header(mut self, key: String, value: String) -> Self {
        self.extra_headers
            .get_or_insert_with(HashMap::new)
            .insert(key, value);
        self
    }

    /// Full URL of an API path such as `/api/chat/stream`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
