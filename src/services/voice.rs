//! Voice channel message interface.
//!
//! The socket itself (and audio capture/playback) belongs to the host. This
//! side only speaks the JSON text-frame protocol over a pair of channels.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::ServiceError;

/// Client → server frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    SetMode { stt_only: bool },
    Audio { data: String },
    Command { text: String },
    SetContext { data: Value },
}

/// Server → client frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Transcript {
        #[serde(default)]
        text: String,
    },
    Response {
        #[serde(default)]
        spoken_response: String,
    },
    Audio {
        data: String,
    },
    #[serde(other)]
    Unknown,
}

/// What the host should act on after a server frame.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceUpdate {
    Transcript(String),
    Response(String),
    Audio(Vec<u8>),
}

pub struct VoiceChannel {
    outbound: mpsc::Sender<String>,
    inbound: mpsc::Receiver<String>,
    last_transcript: Option<String>,
    last_response: Option<String>,
}

impl VoiceChannel {
    pub fn new(outbound: mpsc::Sender<String>, inbound: mpsc::Receiver<String>) -> Self {
        Self {
            outbound,
            inbound,
            last_transcript: None,
            last_response: None,
        }
    }

    async fn send(&self, message: ClientMessage) -> Result<(), ServiceError> {
        let frame = serde_json::to_string(&message).map_err(|e| ServiceError::Decode(e.to_string()))?;
        self.outbound.send(frame).await.map_err(|_| ServiceError::Closed)
    }

    /// `stt_only` asks the server to transcribe without generating a spoken reply.
    pub async fn set_mode(&self, stt_only: bool) -> Result<(), ServiceError> {
        self.send(ClientMessage::SetMode { stt_only }).await
    }

    pub async fn send_audio(&self, chunk: &[u8]) -> Result<(), ServiceError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.send(ClientMessage::Audio {
            data: STANDARD.encode(chunk),
        })
        .await
    }

    pub async fn send_command(&self, text: &str) -> Result<(), ServiceError> {
        self.send(ClientMessage::Command { text: text.to_string() }).await
    }

    pub async fn set_context(&self, data: Value) -> Result<(), ServiceError> {
        self.send(ClientMessage::SetContext { data }).await
    }

    /// Waits for the next meaningful server frame. `None` once the socket side closes.
    pub async fn next_update(&mut self) -> Option<VoiceUpdate> {
        while let Some(frame) = self.inbound.recv().await {
            let message: ServerMessage = match serde_json::from_str(&frame) {
                Ok(m) => m,
                Err(e) => {
                    debug!(target: "voice", "Dropped malformed frame ({} bytes): {}", frame.len(), e);
                    continue;
                }
            };

            match message {
                ServerMessage::Transcript { text } if !text.is_empty() => {
                    self.last_transcript = Some(text.clone());
                    return Some(VoiceUpdate::Transcript(text));
                }
                ServerMessage::Response { spoken_response } => {
                    self.last_response = Some(spoken_response.clone());
                    return Some(VoiceUpdate::Response(spoken_response));
                }
                ServerMessage::Audio { data } => match STANDARD.decode(data.as_bytes()) {
                    Ok(bytes) => return Some(VoiceUpdate::Audio(bytes)),
                    Err(e) => debug!(target: "voice", "Dropped audio frame: {}", e),
                },
                ServerMessage::Transcript { .. } | ServerMessage::Unknown => {}
            }
        }
        None
    }

    pub fn last_transcript(&self) -> Option<&str> {
        self.last_transcript.as_deref()
    }

    pub fn last_response(&self) -> Option<&str> {
        self.last_response.as_deref()
    }
}
