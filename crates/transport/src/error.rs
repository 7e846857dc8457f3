//! Transport construction errors

use thiserror::Error;

/// Errors raised while building an [`HttpTransport`](crate::HttpTransport)
#[derive(Debug, Error)]
pub enum TransportError {
    /// Base URL cannot be used
    #[error("invalid base url '{url}': {message}")]
    InvalidBaseUrl { url: String, message: String },

    /// Proxy URL rejected by the HTTP client
    #[error("invalid proxy url '{url}': {source}")]
    InvalidProxy {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP client could not be built
    #[error("failed to build http client: {0}")]
    Build(#[from] reqwest::Error),
}

impl TransportError {
    pub fn invalid_base_url(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidBaseUrl {
            url: url.into(),
            message: message.into(),
        }
    }
}
