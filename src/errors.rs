//! Error handling for the risk scoring core
//!
//! Three failure classes matter to callers: configuration problems found
//! at startup (fatal), rejected request input (recoverable) and model
//! evaluation failures (recoverable, should be unreachable with a
//! consistent artifact set). I/O and serialization errors raised while
//! loading artifacts are kept as their own variants so the source chain
//! survives.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Main error type for the scoring core
#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    #[error("Model error: {message}")]
    Model { message: String },

    #[error("I/O operation failed: {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Type alias for Result with RiskError
pub type RiskResult<T> = Result<T, RiskError>;

impl RiskError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a validation error for a named input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a model evaluation error
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a serialization error
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Short machine-readable name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            RiskError::Config { .. } => "config",
            RiskError::Validation { .. } => "validation",
            RiskError::Model { .. } => "model",
            RiskError::Io { .. } => "io",
            RiskError::Serialization { .. } => "serialization",
        }
    }

    /// True for errors that only affect the request that raised them
    pub fn is_per_request(&self) -> bool {
        matches!(self, RiskError::Validation { .. } | RiskError::Model { .. })
    }
}

impl IntoResponse for RiskError {
    fn into_response(self) -> Response {
        let status = match self {
            RiskError::Validation { .. } => StatusCode::BAD_REQUEST,
            RiskError::Model { .. }
            | RiskError::Config { .. }
            | RiskError::Io { .. }
            | RiskError::Serialization { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string(),
            "kind": self.kind(),
        });

        (status, Json(body)).into_response()
    }
}

/// Convert from serde_json errors
impl From<serde_json::Error> for RiskError {
    fn from(err: serde_json::Error) -> Self {
        RiskError::serialization("json_operation", err)
    }
}

/// Convert from std::io errors
impl From<std::io::Error> for RiskError {
    fn from(err: std::io::Error) -> Self {
        RiskError::io("io_operation", err)
    }
}

/// Configuration extraction failures are always fatal
impl From<figment::Error> for RiskError {
    fn from(err: figment::Error) -> Self {
        RiskError::config(err.to_string())
    }
}
