//! # Diascreen
//!
//! Diabetes screening inference backend. Loads a pre-trained classifier
//! and feature scaler at startup and serves `POST /predict`: a JSON record
//! of 12 health-survey fields in, an integer class label and diagnosis
//! string out.
//!
//! ## Features
//!
//! - Startup-time artifact bootstrap with optional remote model download
//! - Strict field-presence validation before any transform
//! - Standardization + multinomial logistic-regression inference
//! - Health and metrics endpoints, CORS open to all origins

pub mod artifacts;
pub mod cli_options;
pub mod config;
pub mod error;
pub mod features;
pub mod metrics;
pub mod server;

// Re-export commonly used types for convenience
pub use artifacts::{diagnosis_label, Classifier, Scaler};
pub use cli_options::CliOptions;
pub use config::ServiceConfig;
pub use error::{DiascreenError, Result};
pub use features::{FeatureRecord, EXPECTED_FIELDS, FEATURE_COUNT};
pub use metrics::{MetricsCollector, MetricsSnapshot};
pub use server::{InferenceServer, InferenceState};
