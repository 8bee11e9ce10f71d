use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::geo::Polygon;
use crate::services::types::{null_as_default, AnalysisResult, ModelResult};

/// Frames emitted by the agent stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Thinking {
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
    ToolStart {
        tool: String,
    },
    Polygon {
        data: Polygon,
    },
    Analysis {
        data: Box<AnalysisResult>,
    },
    #[serde(rename = "model_3d")]
    Model3d {
        data: ModelResult,
    },
    Error {
        #[serde(default, deserialize_with = "null_as_default")]
        message: String,
    },
    Done,
    /// Frame types this client does not act on.
    #[serde(other)]
    Unknown,
}

/// Frames emitted by the chat stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatEvent {
    Token {
        #[serde(default, deserialize_with = "null_as_default")]
        content: String,
    },
    /// Final canonical text (action markup already stripped server-side).
    Done {
        #[serde(default)]
        content: Option<String>,
        #[serde(default)]
        action: Option<Value>,
    },
    #[serde(other)]
    Unknown,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_event_tags() {
        let e: AgentEvent = serde_json::from_str(r#"{"type":"tool_start","tool":"select_zone"}"#).unwrap();
        assert_eq!(e, AgentEvent::ToolStart { tool: "select_zone".into() });

        let e: AgentEvent = serde_json::from_str(r#"{"type":"model_3d","data":{"model_glb_url":"m.glb"}}"#).unwrap();
        assert!(matches!(e, AgentEvent::Model3d { ref data } if data.model_glb_url == "m.glb"));

        let e: AgentEvent = serde_json::from_str(r#"{"type":"done"}"#).unwrap();
        assert_eq!(e, AgentEvent::Done);

        let e: AgentEvent = serde_json::from_str(r#"{"type":"heartbeat","n":3}"#).unwrap();
        assert_eq!(e, AgentEvent::Unknown);
    }

    #[test]
    fn test_chat_done_with_null_action() {
        let e: ChatEvent = serde_json::from_str(r#"{"type":"done","content":"ok","action":null}"#).unwrap();
        assert_eq!(e, ChatEvent::Done { content: Some("ok".into()), action: None });
    }

    #[test]
    fn test_null_text_reads_as_empty() {
        let e: ChatEvent = serde_json::from_str(r#"{"type":"token","content":null}"#).unwrap();
        assert_eq!(e, ChatEvent::Token { content: String::new() });

        let e: AgentEvent = serde_json::from_str(r#"{"type":"error","message":null}"#).unwrap();
        assert_eq!(e, AgentEvent::Error { message: String::new() });
    }
}
