//! CLI options for the diascreen backend
//!
//! Defines the command-line interface for the inference server. Every flag
//! has an environment-variable fallback so the service can be configured
//! either way in deployment.

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::server::{InferenceServer, InferenceState};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Diascreen - diabetes screening inference backend server
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct CliOptions {
    /// Address to listen on
    #[arg(
        short,
        long,
        default_value = "127.0.0.1:3000",
        env = "DIASCREEN_LISTEN_ADDR"
    )]
    pub listen_addr: SocketAddr,

    /// Path to the model artifact file
    #[arg(short, long, default_value = "model.json", env = "DIASCREEN_MODEL_PATH")]
    pub model_path: PathBuf,

    /// Path to the scaler artifact file
    #[arg(short, long, default_value = "scaler.json", env = "DIASCREEN_SCALER_PATH")]
    pub scaler_path: PathBuf,

    /// URL to download the model artifact from when missing locally
    #[arg(long, env = "DIASCREEN_MODEL_URL")]
    pub model_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "DIASCREEN_LOG_LEVEL")]
    pub log_level: String,
}

impl CliOptions {
    /// Runs the inference server with the configured options
    ///
    /// Performs the artifact bootstrap, then starts the HTTP listener and
    /// blocks until shutdown. A bootstrap failure aborts before the
    /// listener binds.
    pub async fn run(self) -> Result<()> {
        let config = Arc::new(self.to_config());
        config.validate()?;

        info!(
            listen_addr = %config.listen_addr,
            model_path = %config.model_path.display(),
            scaler_path = %config.scaler_path.display(),
            "Inference server starting"
        );

        let state = InferenceState::initialize(&config).await?;
        InferenceServer::new(config, state).start().await
    }

    /// Converts CLI options to a service configuration
    pub fn to_config(&self) -> ServiceConfig {
        ServiceConfig {
            listen_addr: self.listen_addr,
            model_path: self.model_path.clone(),
            scaler_path: self.scaler_path.clone(),
            model_url: self.model_url.clone(),
            ..ServiceConfig::default()
        }
    }
}
