//! Minimal JSON-over-HTTP client for REST backends

use reqwest::StatusCode;
use serde_json::Value;

/// Errors talking to a REST backend
#[derive(Debug, thiserror::Error)]
pub enum RestError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with {status}")]
    Status { url: String, status: StatusCode },

    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// JSON client bound to one base URL
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
}

impl RestClient {
    /// Public JSONPlaceholder API
    pub const JSONPLACEHOLDER: &'static str = "https://jsonplaceholder.typicode.com";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub async fn get_json(&self, path: &str) -> Result<Value, RestError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await;
        Self::decode(url, response).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, RestError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");
        let response = self.http.post(&url).json(body).send().await;
        Self::decode(url, response).await
    }

    async fn decode(
        url: String,
        response: reqwest::Result<reqwest::Response>,
    ) -> Result<Value, RestError> {
        let response = match response {
            Ok(response) => response,
            Err(source) => return Err(RestError::Request { url, source }),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(RestError::Status { url, status });
        }

        match response.json::<Value>().await {
            Ok(value) => Ok(value),
            Err(source) => Err(RestError::Decode { url, source }),
        }
    }
}
