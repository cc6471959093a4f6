//! Delivery HTTP Client
//!
//! A simple, type-safe HTTP client for the Delivery orchestrator API.
//!
//! # Example
//!
//! ```no_run
//! use delivery_client::OrchestratorClient;
//!
//! #[tokio::main]
//! async fn main() -> delivery_client::Result<()> {
//!     let client = OrchestratorClient::new("http://localhost:8080");
//!
//!     for pipeline in client.list_pipelines().await? {
//!         let trigger = client.trigger_pipeline(pipeline.id).await?;
//!         println!("{} -> run {}", pipeline.name, trigger.run_id);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
mod pipelines;
mod runs;

// Re-export commonly used types
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// HTTP client for the Delivery orchestrator API
///
/// Methods are grouped by resource:
/// - Pipeline management (create, list, get, update, delete)
/// - Runs (trigger, get, list per pipeline)
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    /// Base URL of the orchestrator (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl OrchestratorClient {
    /// Create a new orchestrator client
    ///
    /// # Example
    /// ```
    /// use delivery_client::OrchestratorClient;
    ///
    /// let client = OrchestratorClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new orchestrator client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the orchestrator
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = Self::check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Handle an API response that returns no content (e.g., DELETE operations)
    async fn handle_empty_response(&self, response: reqwest::Response) -> Result<()> {
        Self::check_status(response).await?;
        Ok(())
    }

    /// Turn non-success statuses into errors, using the API's `error` field
    /// as the message when there is one
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|value| value.get("error")?.as_str().map(str::to_string))
            .unwrap_or(body);

        Err(ClientError::api_error(status.as_u16(), message))
    }
}
