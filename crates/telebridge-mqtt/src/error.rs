//! Error types for bus I/O and publish cycles

use telebridge_core::VehicleError;
use thiserror::Error;

/// Result type for bus operations
pub type BusResult<T> = Result<T, BusError>;

/// Errors from the bus transport
#[derive(Debug, Error)]
pub enum BusError {
    /// Publish was rejected by the client
    #[error("Publish to {topic} failed: {reason}")]
    Publish { topic: String, reason: String },

    /// Subscribe was rejected by the client
    #[error("Subscribe to {topic} failed: {reason}")]
    Subscribe { topic: String, reason: String },

    /// Client is closed or disconnected
    #[error("Bus client closed")]
    Closed,
}

/// Why a publish cycle failed
#[derive(Debug, Error)]
pub enum CycleError {
    /// Diagnostics could not be fetched from the account
    #[error(transparent)]
    Fetch(#[from] VehicleError),

    /// A discovery or state publish failed
    #[error("Publishing failed")]
    Bus(#[from] BusError),

    /// A payload could not be encoded
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
