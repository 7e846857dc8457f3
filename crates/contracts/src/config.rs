//! Client configuration contracts shared across crates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Credentials;

/// Default ingestion service URL
pub const DEFAULT_BASE_URL: &str = "https://ingestion.sqreen.com/";

/// Client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Application API token or session key
    pub token: String,

    /// Application name (API tokens only)
    #[serde(default)]
    pub app_name: Option<String>,

    /// When true, `token` is a session key instead of an API token
    #[serde(default)]
    pub session_token: bool,

    /// Send requests through this proxy
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Ingestion service URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Number of concurrent senders
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Batching policy
    #[serde(default)]
    pub batching: BatchingConfig,

    /// HTTP transport settings
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_max_workers() -> usize {
    2
}

impl ClientConfig {
    /// Configuration with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            app_name: None,
            session_token: false,
            proxy_url: None,
            base_url: default_base_url(),
            max_workers: default_max_workers(),
            batching: BatchingConfig::default(),
            transport: TransportConfig::default(),
        }
    }

    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Treat the token as a session key
    pub fn with_session_token(mut self) -> Self {
        self.session_token = true;
        self
    }

    pub fn with_proxy_url(mut self, proxy_url: impl Into<String>) -> Self {
        self.proxy_url = Some(proxy_url.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.batching.max_batch_size = max_batch_size;
        self
    }

    pub fn with_linger_time(mut self, linger: Duration) -> Self {
        self.batching.linger_ms = u64::try_from(linger.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    pub fn with_transport(mut self, transport: TransportConfig) -> Self {
        self.transport = transport;
        self
    }

    /// Credentials selected by the `session_token` flag
    pub fn credentials(&self) -> Credentials {
        if self.session_token {
            Credentials::SessionKey(self.token.clone())
        } else {
            Credentials::ApiToken {
                token: self.token.clone(),
                app_name: self.app_name.clone(),
            }
        }
    }
}

/// Batching policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchingConfig {
    /// Maximum number of records per batch
    pub max_batch_size: usize,
    /// Maximum age of a non-empty batch in milliseconds
    pub linger_ms: u64,
}

impl BatchingConfig {
    pub fn linger_time(&self) -> Duration {
        Duration::from_millis(self.linger_ms)
    }
}

impl Default for BatchingConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 50,
            linger_ms: 60_000,
        }
    }
}

/// HTTP transport settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Whole-request timeout in milliseconds
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Attempts per request, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry (doubles each retry)
    pub initial_backoff_ms: u64,
    /// Upper bound of the retry delay
    pub max_backoff_ms: u64,
    /// Idle pooled connections kept per host
    pub pool_max_idle_per_host: usize,
}

impl TransportConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            connect_timeout_ms: 5_000,
            max_attempts: 3,
            initial_backoff_ms: 200,
            max_backoff_ms: 5_000,
            pool_max_idle_per_host: 10,
        }
    }
}
