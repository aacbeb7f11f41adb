//! # Error Handling Module
//!
//! Error types for the diascreen inference backend with explicit
//! classification and HTTP status mapping.
//!
//! ## Error Categories
//!
//! - **Configuration Errors**: invalid or incomplete service configuration
//! - **Artifact Errors**: model/scaler download or deserialization failures
//! - **Validation Errors**: request payloads missing required fields
//! - **Inference Errors**: transform or classification failures
//! - **Internal Errors**: unexpected failures in the request pipeline

use thiserror::Error;

/// Result type alias for diascreen operations
///
/// This is the standard Result type used throughout the crate. It provides
/// a consistent interface for error handling and makes error propagation
/// more ergonomic.
pub type Result<T> = std::result::Result<T, DiascreenError>;

/// Error types for diascreen inference service operations
///
/// Each variant carries enough context to produce an actionable message and
/// maps to a well-defined HTTP status code where applicable. Startup-time
/// variants (`Configuration`, `Artifact`) are fatal and are never surfaced
/// over HTTP.
#[derive(Error, Debug)]
pub enum DiascreenError {
    /// Configuration validation errors
    ///
    /// These occur during startup when validating the provided
    /// configuration, and indicate a mistake that must be corrected before
    /// the service can start.
    ///
    /// **HTTP Status Mapping**: Not applicable (startup error)
    #[error("Configuration error: {message}")]
    Configuration {
        /// Human-readable description of the configuration issue
        message: String,
        /// Optional source error for additional context
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Artifact bootstrap errors
    ///
    /// Raised when the model or scaler artifact cannot be downloaded, read,
    /// deserialized, or fails dimension validation. Always fatal: the
    /// process refuses to start serving without both artifacts loaded.
    ///
    /// **HTTP Status Mapping**: Not applicable (startup error)
    #[error("Artifact error for {artifact}: {message}")]
    Artifact {
        /// Which artifact failed ("model" or "scaler")
        artifact: String,
        /// Description of the failure
        message: String,
        /// Underlying I/O, HTTP, or deserialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Request validation errors
    ///
    /// Raised before any transform when a prediction payload is missing one
    /// or more of the required feature fields. The message enumerates the
    /// missing field names.
    ///
    /// **HTTP Status Mapping**: 400 Bad Request
    #[error("Missing fields: {missing:?}")]
    Validation {
        /// Names of the required fields absent from the payload,
        /// in canonical field order
        missing: Vec<&'static str>,
    },

    /// Transform or inference errors
    ///
    /// Raised when a present field carries a non-numeric value, when the
    /// feature vector does not match the fitted artifact dimensions, or
    /// when classification itself fails. The message is surfaced verbatim
    /// to the client.
    ///
    /// **HTTP Status Mapping**: 500 Internal Server Error
    #[error("Inference failed: {message}")]
    Inference {
        /// Description of the transform/inference failure
        message: String,
    },

    /// Internal system errors
    ///
    /// Unexpected failures in the request pipeline that are not tied to the
    /// feature data itself, such as an unreadable request body.
    ///
    /// **HTTP Status Mapping**: 500 Internal Server Error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal failure
        message: String,
        /// Source error for debugging
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DiascreenError {
    /// Creates a configuration error with optional source context
    pub fn configuration(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DiascreenError::Configuration {
            message: message.into(),
            source,
        }
    }

    /// Creates an artifact error for the named artifact
    pub fn artifact(
        artifact: impl Into<String>,
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DiascreenError::Artifact {
            artifact: artifact.into(),
            message: message.into(),
            source,
        }
    }

    /// Creates a validation error listing the missing field names
    pub fn missing_fields(missing: Vec<&'static str>) -> Self {
        DiascreenError::Validation { missing }
    }

    /// Creates an inference error
    pub fn inference(message: impl Into<String>) -> Self {
        DiascreenError::Inference {
            message: message.into(),
        }
    }

    /// Creates an internal error with optional source context
    pub fn internal(
        message: impl Into<String>,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DiascreenError::Internal {
            message: message.into(),
            source,
        }
    }

    /// Maps this error to the HTTP status code returned to clients
    ///
    /// Validation failures are the caller's fault (400); everything else
    /// that can reach a request handler is a server-side failure (500).
    /// Startup errors also map to 500 for completeness, although they are
    /// never surfaced over HTTP.
    pub fn to_http_status(&self) -> u16 {
        match self {
            DiascreenError::Validation { .. } => 400,
            DiascreenError::Configuration { .. }
            | DiascreenError::Artifact { .. }
            | DiascreenError::Inference { .. }
            | DiascreenError::Internal { .. } => 500,
        }
    }
}
