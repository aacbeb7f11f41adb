//! Service configuration management

use crate::error::{DiascreenError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Configuration for the inference server
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServiceConfig {
    /// Address to bind the HTTP listener to
    pub listen_addr: SocketAddr,
    /// Path to the model artifact file
    pub model_path: PathBuf,
    /// Path to the scaler artifact file
    pub scaler_path: PathBuf,
    /// URL to fetch the model artifact from when absent on disk
    pub model_url: Option<String>,
    /// Service name used in logs
    pub service_name: String,
}

impl Default for ServiceConfig {
    /// Creates a default configuration with sensible defaults
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:3000".parse().unwrap(),
            model_path: PathBuf::from("model.json"),
            scaler_path: PathBuf::from("scaler.json"),
            model_url: None,
            service_name: "diascreen-backend".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Validates the configuration before startup
    ///
    /// The scaler must already exist locally; the model may still be
    /// downloaded during artifact bootstrap, so only its URL shape is
    /// checked here.
    pub fn validate(&self) -> Result<()> {
        if self.service_name.is_empty() {
            return Err(DiascreenError::configuration(
                "service name must not be empty",
                None,
            ));
        }
        if let Some(url) = &self.model_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(DiascreenError::configuration(
                    format!("model URL '{url}' must be http(s)"),
                    None,
                ));
            }
        }
        Ok(())
    }
}
