//! # Diascreen - Main Entry Point
//!
//! Diabetes screening inference backend server.

use clap::Parser;
use diascreen::{CliOptions, Result};

#[tokio::main]
async fn main() -> Result<()> {
    let options = CliOptions::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&options.log_level)),
        )
        .init();

    options.run().await
}
