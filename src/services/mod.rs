pub mod backend;
pub mod types;
pub mod voice;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::ServiceError;
use types::{AgentRunRequest, AnalysisRequest, AnalysisResult, ChatRequest};

pub use backend::BackendClient;

/// Raw response body, chunked however the transport delivers it.
pub type ByteStream = BoxStream<'static, Result<Vec<u8>, ServiceError>>;

/// Opens the backend's streaming endpoints.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open_agent(&self, request: &AgentRunRequest) -> Result<ByteStream, ServiceError>;
    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, ServiceError>;
}

/// The `analyze` collaborator: zone + array parameters in, analysis out.
#[async_trait]
pub trait SiteAnalyzer: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ServiceError>;
}
