//! Client configuration.

use serde::Deserialize;

/// Production backend host.
pub const DEFAULT_BASE_URL: &str = "https://dev.matzip-server.link";

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "MATZIP_API_URL";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Scheme and host of the backend, without the `/api/v1` prefix.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Defaults, overridden by `MATZIP_API_URL` when set and non-empty.
    pub fn from_env() -> Self {
        match std::env::var(BASE_URL_ENV) {
            Ok(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::default(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
