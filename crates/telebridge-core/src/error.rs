//! Error types for the account API and remote commands
//!
//! [`ErrorDetail`] is the normalized shape errors take when they are
//! published onto the bus:
//!
//! ```json
//! {"message": "...",
//!  "response": {"status": 401, "statusText": "Unauthorized", "headers": {}, "data": {}},
//!  "request": {"method": "POST", "url": "...", "headers": {}, "body": {}, "contentType": "..."},
//!  "stack": "..."}
//! ```
//!
//! Fields the originating error does not carry are omitted.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for account API operations
pub type VehicleResult<T> = Result<T, VehicleError>;

/// HTTP request details attached to an account API failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

/// HTTP response details attached to an account API failure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Errors raised by the account API collaborator
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VehicleError {
    /// The account service answered with an HTTP failure
    #[error("{message}")]
    Http {
        message: String,
        request: Option<RequestInfo>,
        response: Option<ResponseInfo>,
    },

    /// Configured vehicle is not part of the account
    #[error("Configured vehicle VIN {0} not available in account vehicles")]
    VehicleNotFound(String),

    /// Operation not offered by this account API implementation
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Network or connection failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The vehicle did not answer in time
    #[error("Request timed out")]
    Timeout,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VehicleError {
    /// HTTP failure with a status code and reason phrase
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        let status_text = status_text.into();
        VehicleError::Http {
            message: format!("Request Failed with status {} - {}", status, status_text),
            request: None,
            response: Some(ResponseInfo {
                status: Some(status),
                status_text: Some(status_text),
                ..ResponseInfo::default()
            }),
        }
    }
}

/// Errors resolving an inbound command request
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    /// Name is not on the allow-list
    #[error("Command not found: {0}")]
    NotFound(String),

    /// Name resolved but its options did not parse
    #[error("Invalid options for {command}: {reason}")]
    InvalidOptions { command: String, reason: String },
}

/// Normalized error body published on status topics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<ResponseInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<RequestInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorDetail {
    /// Build from any error; the source chain becomes `stack`.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push(format!("caused by: {}", cause));
            source = cause.source();
        }

        let stack = if causes.is_empty() {
            None
        } else {
            Some(format!("{}\n{}", err, causes.join("\n")))
        };

        Self {
            message: err.to_string(),
            response: None,
            request: None,
            stack,
        }
    }

    /// Wrap into the `{"error": ...}` envelope
    pub fn into_payload(self) -> ErrorPayload {
        ErrorPayload { error: self }
    }
}

impl From<&VehicleError> for ErrorDetail {
    fn from(err: &VehicleError) -> Self {
        match err {
            VehicleError::Http {
                message,
                request,
                response,
            } => Self {
                message: message.clone(),
                response: response.clone(),
                request: request.clone(),
                stack: None,
            },
            other => Self::from_error(other),
        }
    }
}

/// `{"error": {...}}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: ErrorDetail,
}
