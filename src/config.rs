//! Endpoint, credential and timing configuration.
//!
//! A [`Config`] is built once at startup and handed to [`Client`](crate::Client);
//! nothing in the request path reads ambient state.

use crate::error::Error;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::Path;
use std::time::Duration;

/// Key holding the endpoint prefix, e.g. `https://api.openai.com/v1`.
pub const URL_PREFIX_KEY: &str = "URL_PREFIX";

/// Key holding the bearer credential.
pub const API_KEY_KEY: &str = "OPENAI_API_KEY";

/// Client configuration.
#[derive(Clone)]
pub struct Config {
    /// Endpoint prefix; `/chat/completions` is appended.
    pub url_prefix: String,
    /// Bearer credential.
    pub api_key: String,
    /// How long to wait for the response headers.
    pub header_timeout: Duration,
    /// Total lifetime of one call, streaming included.
    pub lifetime: Duration,
    /// Sentinel lines discarded after the terminal marker (1 or 2).
    pub sentinel_lines: usize,
}

impl Config {
    /// Create a configuration with default timings.
    pub fn new(url_prefix: impl Into<String>, api_key: impl Into<String>) -> Self {
        let url_prefix = url_prefix.into();
        Self {
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            header_timeout: Duration::from_secs(10),
            lifetime: Duration::from_secs(120),
            sentinel_lines: 1,
        }
    }

    /// Load endpoint and credential from the process environment.
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load endpoint and credential from a `KEY=VALUE` file such as `.env`.
    pub fn from_env_file(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let values = dotenvy::from_path_iter(path)
            .and_then(|iter| iter.collect::<Result<HashMap<_, _>, _>>())
            .map_err(|e| Error::config(format!("{}: {e}", path.display())))?;
        Self::from_lookup(|key| values.get(key).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| Error::config(format!("missing {key}")))
        };
        Ok(Self::new(required(URL_PREFIX_KEY)?, required(API_KEY_KEY)?))
    }

    /// Set the header wait window.
    pub fn header_timeout(mut self, timeout: Duration) -> Self {
        self.header_timeout = timeout;
        self
    }

    /// Set the total call lifetime.
    pub fn lifetime(mut self, lifetime: Duration) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Set how many sentinel lines follow the terminal marker.
    pub fn sentinel_lines(mut self, lines: usize) -> Self {
        self.sentinel_lines = lines;
        self
    }

    /// Full URL of the chat-completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.url_prefix)
    }

    /// Check timing invariants.
    pub fn validate(&self) -> Result<(), Error> {
        if self.url_prefix.is_empty() {
            return Err(Error::config("empty url prefix"));
        }
        if self.header_timeout.is_zero() {
            return Err(Error::config("header timeout must be non-zero"));
        }
        if self.lifetime < self.header_timeout {
            return Err(Error::config("lifetime must not be shorter than header timeout"));
        }
        if self.sentinel_lines > 2 {
            return Err(Error::config(format!(
                "sentinel lines must be 0, 1 or 2, got {}",
                self.sentinel_lines
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url_prefix", &self.url_prefix)
            .field("api_key", &"<redacted>")
            .field("header_timeout", &self.header_timeout)
            .field("lifetime", &self.lifetime)
            .field("sentinel_lines", &self.sentinel_lines)
            .finish()
    }
}
