use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::types::{AgentRunRequest, AnalysisRequest, AnalysisResult, ChatRequest};
use super::{ByteStream, SiteAnalyzer, StreamTransport};
use crate::config::Config;
use crate::error::ServiceError;

const AGENT_PATH: &str = "/api/agent/run";
const CHAT_PATH: &str = "/api/chat";
const ANALYZE_PATH: &str = "/api/analyze";

/// HTTP client for the assessment backend.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            // No client-wide timeout: agent runs stream for minutes.
            client: Client::builder().build().unwrap_or_default(),
            base_url: config.api_url.clone(),
            request_timeout: config.request_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn open_stream<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<ByteStream, ServiceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(target: "backend::stream", "POST {}", url);

        let response = self.client.post(url).json(body).send().await?;

        let status = response.status();
        if !status.is_success() {
            warn!(target: "backend::stream", "{} returned {}", path, status);
            return Err(ServiceError::Http { status: status.as_u16() });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|b| b.to_vec()).map_err(ServiceError::from))
            .boxed())
    }
}

#[async_trait]
impl StreamTransport for BackendClient {
    async fn open_agent(&self, request: &AgentRunRequest) -> Result<ByteStream, ServiceError> {
        self.open_stream(AGENT_PATH, request).await
    }

    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, ServiceError> {
        self.open_stream(CHAT_PATH, request).await
    }
}

#[async_trait]
impl SiteAnalyzer for BackendClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ServiceError> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, ANALYZE_PATH))
            .timeout(self.request_timeout)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::Http {
                status: response.status().as_u16(),
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}
