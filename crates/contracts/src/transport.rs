//! Transport trait - delivery pipeline output interface
//!
//! Defines the abstract interface the worker pool sends batches through.

use thiserror::Error;

use crate::Batch;

/// Ingestion endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// JSON array of records
    Batches,
    /// Single signal object
    Signals,
    /// Single trace object
    Traces,
}

impl Endpoint {
    /// Path relative to the service base URL
    pub fn path(&self) -> &'static str {
        match self {
            Self::Batches => "batches",
            Self::Signals => "signals",
            Self::Traces => "traces",
        }
    }
}

/// Outcome of a failed delivery
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// 401 / 403: token or application name rejected
    #[error("authentication rejected by ingestion service (status {status})")]
    AuthenticationRejected { status: u16 },

    /// 422: recorded data rejected
    #[error("data rejected by ingestion service")]
    DataRejected,

    /// Any other non-success status
    #[error("unexpected status code {0}")]
    UnexpectedStatus(u16),

    /// Network error, timeout or exhausted retry budget
    #[error("could not deliver after {attempts} attempt(s): {message}")]
    TransportFailure { attempts: u32, message: String },

    /// Transport used after `close()`
    #[error("transport used after close")]
    Closed,
}

impl DeliveryError {
    /// Create transport failure
    pub fn transport_failure(attempts: u32, message: impl Into<String>) -> Self {
        Self::TransportFailure {
            attempts,
            message: message.into(),
        }
    }

    /// Map a non-success HTTP status to its outcome
    pub fn from_status(status: u16) -> Self {
        match status {
            422 => Self::DataRejected,
            401 | 403 => Self::AuthenticationRejected { status },
            other => Self::UnexpectedStatus(other),
        }
    }

    /// Short label used in logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            Self::AuthenticationRejected { .. } => "auth_rejected",
            Self::DataRejected => "data_rejected",
            Self::UnexpectedStatus(_) => "unexpected_status",
            Self::TransportFailure { .. } => "transport_failure",
            Self::Closed => "closed",
        }
    }
}

/// Batch delivery trait
///
/// Implementations are shared by every worker of the pool.
#[trait_variant::make(Transport: Send)]
pub trait LocalTransport {
    /// Transport name (used for logging)
    fn name(&self) -> &str;

    /// Deliver one batch to the `batches` endpoint
    ///
    /// # Errors
    /// Returns the delivery outcome when the batch was not accepted
    async fn send_batch(&self, batch: &Batch) -> Result<(), DeliveryError>;

    /// Release pooled connections
    ///
    /// Later sends must fail with [`DeliveryError::Closed`].
    fn close(&self);
}
