use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::HttpConfig;
use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    Static,
    Rendered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    /// Element that must exist before the document counts as loaded.
    /// Only the rendered transport waits on it.
    pub ready_selector: Option<String>,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ready_selector: None,
        }
    }

    pub fn ready_when(mut self, selector: Option<&str>) -> Self {
        self.ready_selector = selector.map(str::to_string);
        self
    }
}

/// Produces the HTML of a page, ready to be queried with CSS selectors.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    fn transport(&self) -> Transport;
    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError>;
}

/// Plain HTTP GET of server-rendered HTML.
pub struct StaticFetcher {
    client: Client,
    timeout: Duration,
}

impl StaticFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::NetworkError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::from(err)
        }
    }
}

#[async_trait]
impl PageFetcher for StaticFetcher {
    fn transport(&self) -> Transport {
        Transport::Static
    }

    async fn fetch(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let started = Instant::now();

        let response = self
            .client
            .get(&request.url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            warn!("GET {} answered {}", request.url, status);
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;

        debug!(
            "Fetched {} ({} bytes) in {:?}",
            request.url,
            body.len(),
            started.elapsed()
        );
        Ok(body)
    }
}
