#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use solarsite::error::ServiceError;
use solarsite::services::types::{AgentRunRequest, AnalysisRequest, AnalysisResult, ChatRequest};
use solarsite::services::{ByteStream, SiteAnalyzer, StreamTransport};
use std::sync::Mutex;

/// How a scripted body behaves once its chunks run out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tail {
    End,
    /// Never yields again (a live connection with nothing to say).
    Hang,
    /// Yields one transport error.
    Fail,
}

/// Replays fixed chunks for both streaming endpoints.
pub struct ScriptedTransport {
    pub agent_chunks: Vec<Vec<u8>>,
    pub chat_chunks: Vec<Vec<u8>>,
    pub tail: Tail,
    pub refuse_open: bool,
    pub chat_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedTransport {
    pub fn agent(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            agent_chunks: chunks,
            chat_chunks: Vec::new(),
            tail: Tail::End,
            refuse_open: false,
            chat_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn chat(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            agent_chunks: Vec::new(),
            chat_chunks: chunks,
            tail: Tail::End,
            refuse_open: false,
            chat_requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_tail(mut self, tail: Tail) -> Self {
        self.tail = tail;
        self
    }

    pub fn refusing(mut self) -> Self {
        self.refuse_open = true;
        self
    }

    fn body(&self, chunks: &[Vec<u8>]) -> Result<ByteStream, ServiceError> {
        if self.refuse_open {
            return Err(ServiceError::Http { status: 502 });
        }
        let head = stream::iter(chunks.to_vec().into_iter().map(Ok));
        let body = match self.tail {
            Tail::End => head.boxed(),
            Tail::Hang => head.chain(stream::pending()).boxed(),
            Tail::Fail => head
                .chain(stream::once(async { Err(ServiceError::Transport("connection reset".into())) }))
                .boxed(),
        };
        Ok(body)
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open_agent(&self, _request: &AgentRunRequest) -> Result<ByteStream, ServiceError> {
        self.body(&self.agent_chunks)
    }

    async fn open_chat(&self, request: &ChatRequest) -> Result<ByteStream, ServiceError> {
        if let Ok(mut seen) = self.chat_requests.lock() {
            seen.push(request.clone());
        }
        self.body(&self.chat_chunks)
    }
}

/// Returns a canned analysis, or fails, and remembers what it was asked.
pub struct StubAnalyzer {
    pub result: Option<AnalysisResult>,
    pub requests: Mutex<Vec<AnalysisRequest>>,
}

impl StubAnalyzer {
    pub fn ok(result: AnalysisResult) -> Self {
        Self {
            result: Some(result),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            result: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn last_request(&self) -> Option<AnalysisRequest> {
        self.requests.lock().ok().and_then(|r| r.last().cloned())
    }
}

#[async_trait]
impl SiteAnalyzer for StubAnalyzer {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, ServiceError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request.clone());
        }
        self.result.clone().ok_or(ServiceError::Http { status: 500 })
    }
}

/// `data: <json>\n\n` framing.
pub fn sse(frames: &[&str]) -> Vec<u8> {
    frames.iter().map(|f| format!("data: {}\n\n", f)).collect::<String>().into_bytes()
}

/// A 100 m square zone at the equator, as the agent would send it.
pub fn square_polygon_json() -> String {
    let d = 100.0 / 111_320.0;
    format!(
        r#"{{"type":"Polygon","coordinates":[[[0,0],[{d},0],[{d},{d}],[0,{d}],[0,0]]]}}"#,
        d = d
    )
}

pub fn analysis_json(latitude: f64, n_panels: usize) -> String {
    let side = 2.0 / 111_320.0;
    let features: Vec<String> = (0..n_panels)
        .map(|i| {
            let x = i as f64 * side * 2.0;
            format!(
                r#"{{"type":"Feature","properties":{{}},"geometry":{{"type":"Polygon","coordinates":[[[{x0},0],[{x1},0],[{x1},{s}],[{x0},{s}],[{x0},0]]]}}}}"#,
                x0 = x,
                x1 = x + side,
                s = side
            )
        })
        .collect();
    format!(
        r#"{{"site_info":{{"latitude":{lat},"longitude":0.0,"altitude_m":12.0,"timezone":"UTC"}},"layout":{{"panels_geojson":{{"type":"FeatureCollection","features":[{f}]}},"n_panels":{n},"n_rows":1,"row_spacing_m":3.0}}}}"#,
        lat = latitude,
        f = features.join(","),
        n = n_panels
    )
}

pub fn analysis(latitude: f64, n_panels: usize) -> AnalysisResult {
    serde_json::from_str(&analysis_json(latitude, n_panels)).expect("fixture analysis must parse")
}
