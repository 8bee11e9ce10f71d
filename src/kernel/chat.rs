use serde::Serialize;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use super::event::ChatEvent;
use super::runner::{drive_stream, FrameVerdict};
use super::telemetry::{StreamChannel, TelemetryRecorder};
use crate::services::types::{AnalysisResult, ChatRequest, HistoryEntry, Role};
use crate::services::StreamTransport;
use crate::stream::{decode_frame, StreamOutcome};

pub const CONNECTION_ERROR_TEXT: &str = "Connection error. Please try again.";

/// Bulky analysis keys the chat backend has no use for.
const HEAVY_KEYS: [&str; 3] = ["heatmap_summer", "heatmap_winter", "panels_geojson"];

/// Unique within one [`ChatSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct MessageId(pub u64);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
}

/// A send that has been accepted and is waiting for its stream.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub assistant_id: MessageId,
    pub request: ChatRequest,
}

#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    next_id: u64,
    streaming: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> MessageId {
        self.next_id += 1;
        MessageId(self.next_id)
    }

    /// Appends the user message and an empty assistant reply. `None` for blank
    /// input or while a reply is still streaming.
    pub fn begin_send(&mut self, text: &str, analysis: Option<&AnalysisResult>) -> Option<ChatTurn> {
        let text = text.trim();
        if text.is_empty() || self.streaming {
            return None;
        }

        // History is everything before this exchange.
        let history = self
            .messages
            .iter()
            .map(|m| HistoryEntry {
                role: m.role,
                content: m.content.clone(),
            })
            .collect();

        let user_id = self.allocate_id();
        let assistant_id = self.allocate_id();
        self.messages.push(ChatMessage {
            id: user_id,
            role: Role::User,
            content: text.to_string(),
        });
        self.messages.push(ChatMessage {
            id: assistant_id,
            role: Role::Assistant,
            content: String::new(),
        });
        self.streaming = true;

        let analysis_data = analysis
            .and_then(|a| serde_json::to_value(a).ok())
            .map(|v| compact_analysis(&v));

        Some(ChatTurn {
            assistant_id,
            request: ChatRequest {
                message: text.to_string(),
                history,
                analysis_data,
            },
        })
    }

    /// Applies one frame to the reply. Returns the action payload, if the
    /// final frame carried one, for the caller to forward.
    pub fn apply(&mut self, assistant_id: MessageId, event: ChatEvent) -> Option<Value> {
        let message = self.messages.iter_mut().find(|m| m.id == assistant_id)?;
        match event {
            ChatEvent::Token { content } => {
                message.content.push_str(&content);
                None
            }
            ChatEvent::Done { content, action } => {
                if let Some(content) = content.filter(|c| !c.is_empty()) {
                    message.content = content;
                }
                action
            }
            ChatEvent::Unknown => None,
        }
    }

    /// Always leaves the session ready for the next send.
    pub fn finish(&mut self, assistant_id: MessageId, outcome: &StreamOutcome) {
        if let StreamOutcome::Failed(_) = outcome {
            if let Some(message) = self.messages.iter_mut().find(|m| m.id == assistant_id) {
                message.content = CONNECTION_ERROR_TEXT.to_string();
            }
        }
        self.streaming = false;
    }

    /// Sends `text` and streams the reply into the session. Returns `None` if
    /// the send was rejected.
    pub async fn send<T, F>(
        &mut self,
        transport: &T,
        text: &str,
        analysis: Option<&AnalysisResult>,
        token: &CancellationToken,
        telemetry: &mut TelemetryRecorder,
        mut on_action: F,
    ) -> Option<StreamOutcome>
    where
        T: StreamTransport + ?Sized,
        F: FnMut(Value),
    {
        let turn = self.begin_send(text, analysis)?;
        let assistant_id = turn.assistant_id;

        let outcome = drive_stream(
            StreamChannel::Chat,
            transport.open_chat(&turn.request),
            token,
            telemetry,
            |payload| match decode_frame::<ChatEvent>(payload) {
                Ok(event) => {
                    if let Some(action) = self.apply(assistant_id, event) {
                        on_action(action);
                    }
                    FrameVerdict::Applied
                }
                Err(_) => FrameVerdict::Dropped,
            },
        )
        .await;

        self.finish(assistant_id, &outcome);
        Some(outcome)
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }
}

/// Drops heatmap grids and panel geometry at the top level and one object level down.
pub fn compact_analysis(data: &Value) -> Value {
    let Value::Object(top) = data else {
        return data.clone();
    };

    let compacted: Map<String, Value> = top
        .iter()
        .filter(|(k, _)| !HEAVY_KEYS.contains(&k.as_str()))
        .map(|(k, v)| {
            let v = match v {
                Value::Object(inner) => Value::Object(
                    inner
                        .iter()
                        .filter(|(ik, _)| !HEAVY_KEYS.contains(&ik.as_str()))
                        .map(|(ik, iv)| (ik.clone(), iv.clone()))
                        .collect(),
                ),
                other => other.clone(),
            };
            (k.clone(), v)
        })
        .collect();

    Value::Object(compacted)
}
