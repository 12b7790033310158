//! Error types for unit conversion

use thiserror::Error;

/// Errors that can occur while converting a reading
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvError {
    /// No conversion rule exists for the unit
    #[error("no conversion for unit: {0}")]
    UnknownUnit(String),

    /// The raw value could not be read as a number
    #[error("value is not numeric: {0}")]
    NotNumeric(String),
}

/// Result type for conversion operations
pub type ConvResult<T> = Result<T, ConvError>;
