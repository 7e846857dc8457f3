//! Client error types

use thiserror::Error;

/// Errors returned to producers
///
/// Delivery failures never show up here; they are logged and counted by
/// the sender pool.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] contracts::ContractError),

    /// HTTP transport could not be built
    #[error("transport error: {0}")]
    Transport(#[from] transport::TransportError),

    /// Sender runtime could not be started
    #[error("failed to start sender pool: {0}")]
    Runtime(#[from] std::io::Error),

    /// Client used after `close()`
    #[error("client is closed")]
    Closed,
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
