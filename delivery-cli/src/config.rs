//! Configuration module
//!
//! Handles CLI configuration.

use anyhow::{Context, Result};
use delivery_client::OrchestratorClient;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the Delivery API
    pub base_url: String,
}

impl Config {
    /// Client for the configured API with a bounded request timeout
    pub fn client(&self) -> Result<OrchestratorClient> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(OrchestratorClient::with_client(&self.base_url, http))
    }
}
