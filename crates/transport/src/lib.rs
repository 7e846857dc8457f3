//! # Transport
//!
//! HTTP delivery to the ingestion service.
//!
//! - [`JsonCodec`]: strict JSON encoding with a sanitizing fallback
//! - [`HttpTransport`]: pooled `reqwest` client, bounded retry with
//!   exponential backoff, status classification
//!
//! ```ignore
//! use transport::HttpTransport;
//!
//! let transport = HttpTransport::new(base_url, None, headers, TransportConfig::default())?;
//! transport.send_signal(&signal, &Headers::new()).await?;
//! ```

mod codec;
mod error;
mod http;
mod retry;

pub use codec::JsonCodec;
pub use error::TransportError;
pub use http::HttpTransport;
pub use retry::{is_retryable_status, Backoff};
