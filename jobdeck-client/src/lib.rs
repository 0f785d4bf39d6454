//! Jobdeck HTTP Client
//!
//! A small, type-safe HTTP client for the remote job API that runs
//! automation actions and records their output.
//!
//! The engine depends on the [`JobApi`] trait rather than on [`DeckClient`]
//! directly, so the poll loop and controller can be exercised against
//! scripted fakes.
//!
//! # Example
//!
//! ```no_run
//! use jobdeck_client::DeckClient;
//! use jobdeck_core::dto::job::CreateJob;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = DeckClient::new("http://127.0.0.1:8000");
//!
//!     let created = client.create_job(&CreateJob::new("pull-to-notion")).await?;
//!     println!("Started job {} ({} log lines)", created.job.id, created.logs.len());
//!
//!     let update = client.poll_job(&created.job.id, created.next_cursor).await?;
//!     println!("Status: {:?}", update.job.status);
//!     Ok(())
//! }
//! ```

mod api;
mod catalog;
pub mod error;
mod jobs;

pub use api::JobApi;
pub use error::{ClientError, Result};

use reqwest::Client;
use serde::de::DeserializeOwned;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

/// HTTP client for the job API
///
/// Endpoints are grouped by concern:
/// - Job lifecycle (create, poll, terminate)
/// - Catalog (actions, stories)
#[derive(Debug, Clone)]
pub struct DeckClient {
    /// Base URL of the job API (e.g., "http://127.0.0.1:8000")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl DeckClient {
    /// Create a new client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the job API (e.g., "http://127.0.0.1:8000")
    ///
    /// # Example
    /// ```
    /// use jobdeck_client::DeckClient;
    ///
    /// let client = DeckClient::new("http://127.0.0.1:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the job API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Get the base URL of the job API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// Non-success statuses become [`ClientError::ApiError`] carrying the
    /// response body as message.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let response_url = response.url().clone();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::debug!(status = status.as_u16(), url = %response_url, "job API returned an error");
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl Default for DeckClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = DeckClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = DeckClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert_eq!(client.url("/api/jobs"), "http://localhost:8000/api/jobs");
    }

    #[test]
    fn test_default_base_url() {
        assert_eq!(DeckClient::default().base_url(), DEFAULT_BASE_URL);
    }
}
