mod common;

use common::{analysis_json, sse, ScriptedTransport, Tail};
use serde_json::json;
use solarsite::kernel::chat::{ChatSession, CONNECTION_ERROR_TEXT};
use solarsite::kernel::telemetry::TelemetryRecorder;
use solarsite::services::types::{AnalysisResult, Role};
use solarsite::stream::StreamOutcome;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

async fn send(
    session: &mut ChatSession,
    transport: &ScriptedTransport,
    text: &str,
    analysis: Option<&AnalysisResult>,
) -> (Option<StreamOutcome>, Vec<serde_json::Value>) {
    let mut telemetry = TelemetryRecorder::new();
    let mut actions = Vec::new();
    let outcome = session
        .send(transport, text, analysis, &CancellationToken::new(), &mut telemetry, |a| actions.push(a))
        .await;
    (outcome, actions)
}

#[tokio::test]
async fn test_tokens_stream_then_done_replaces_text() {
    let transport = ScriptedTransport::chat(vec![sse(&[
        r#"{"type":"token","content":"Le site "}"#,
        r#"{"type":"token","content":"est bon [ACTION]"}"#,
        r#"{"type":"done","content":"Le site est bon.","action":{"kind":"rerun"}}"#,
    ])]);
    let mut session = ChatSession::new();

    let (outcome, actions) = send(&mut session, &transport, "Est-ce rentable ?", None).await;

    assert_eq!(outcome, Some(StreamOutcome::Completed));
    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "Le site est bon.", "done carries the canonical text");
    assert_eq!(actions, vec![json!({"kind":"rerun"})]);
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn test_done_without_content_keeps_streamed_text() {
    let transport = ScriptedTransport::chat(vec![sse(&[
        r#"{"type":"token","content":"Bonjour"}"#,
        r#"{"type":"done","action":null}"#,
    ])]);
    let mut session = ChatSession::new();

    let (_, actions) = send(&mut session, &transport, "salut", None).await;

    assert_eq!(session.messages()[1].content, "Bonjour");
    assert!(actions.is_empty(), "null action is not forwarded");
}

#[tokio::test]
async fn test_split_multibyte_token_survives() {
    let body = sse(&[r#"{"type":"token","content":"ensoleillé ☀"}"#]);
    let sun = body.len() - 6;
    let transport = ScriptedTransport::chat(vec![body[..sun].to_vec(), body[sun..].to_vec()]);
    let mut session = ChatSession::new();

    send(&mut session, &transport, "météo", None).await;

    assert_eq!(session.messages()[1].content, "ensoleillé ☀");
}

#[tokio::test]
async fn test_transport_failure_shows_connection_error() {
    let transport = ScriptedTransport::chat(vec![sse(&[r#"{"type":"token","content":"partial"}"#])]).with_tail(Tail::Fail);
    let mut session = ChatSession::new();

    let (outcome, _) = send(&mut session, &transport, "hello", None).await;

    assert!(matches!(outcome, Some(StreamOutcome::Failed(_))));
    assert_eq!(session.messages()[1].content, CONNECTION_ERROR_TEXT);
    assert!(!session.is_streaming(), "Session must be ready for the next send");
}

#[tokio::test]
async fn test_refused_connection_shows_connection_error() {
    let transport = ScriptedTransport::chat(Vec::new()).refusing();
    let mut session = ChatSession::new();

    send(&mut session, &transport, "hello", None).await;

    assert_eq!(session.messages()[1].content, CONNECTION_ERROR_TEXT);
}

#[tokio::test]
async fn test_blank_input_is_rejected() {
    let transport = ScriptedTransport::chat(Vec::new());
    let mut session = ChatSession::new();

    let (outcome, _) = send(&mut session, &transport, "   \n", None).await;

    assert_eq!(outcome, None);
    assert!(session.messages().is_empty());
    assert!(transport.chat_requests.lock().map(|r| r.is_empty()).unwrap_or(false));
}

#[test]
fn test_send_while_streaming_is_rejected() {
    let mut session = ChatSession::new();
    assert!(session.begin_send("first", None).is_some());
    assert!(session.begin_send("second", None).is_none());
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn test_history_excludes_current_exchange() {
    let transport = ScriptedTransport::chat(vec![sse(&[r#"{"type":"done","content":"ok"}"#])]);
    let mut session = ChatSession::new();

    send(&mut session, &transport, "one", None).await;
    send(&mut session, &transport, "two", None).await;

    let requests = transport.chat_requests.lock().map(|r| r.clone()).unwrap_or_default();
    assert_eq!(requests.len(), 2);
    assert!(requests[0].history.is_empty());
    assert_eq!(requests[1].message, "two");
    let history: Vec<(Role, &str)> = requests[1].history.iter().map(|h| (h.role, h.content.as_str())).collect();
    assert_eq!(history, vec![(Role::User, "one"), (Role::Assistant, "ok")]);

    let ids: Vec<u64> = session.messages().iter().map(|m| m.id.0).collect();
    assert_eq!(ids, vec![1, 2, 3, 4], "Ids are unique and increasing within the session");
}

#[tokio::test]
async fn test_analysis_context_is_compacted() {
    let mut data: serde_json::Value = serde_json::from_str(&analysis_json(23.7, 4)).expect("fixture");
    data["heatmap_summer"] = json!([[0.1, 0.2]]);
    let analysis: AnalysisResult = serde_json::from_value(data).expect("analysis");

    let transport = ScriptedTransport::chat(vec![sse(&[r#"{"type":"done","content":"ok"}"#])]);
    let mut session = ChatSession::new();
    send(&mut session, &transport, "résumé ?", Some(&analysis)).await;

    let requests = transport.chat_requests.lock().map(|r| r.clone()).unwrap_or_default();
    let sent = requests[0].analysis_data.clone().expect("analysis attached");
    assert!(sent.get("heatmap_summer").is_none());
    assert!(sent["layout"].get("panels_geojson").is_none());
    assert_eq!(sent["layout"]["n_panels"], 4);
    assert_eq!(sent["site_info"]["latitude"], 23.7);
}

#[tokio::test]
async fn test_cancel_keeps_partial_reply() {
    let transport = ScriptedTransport::chat(vec![sse(&[r#"{"type":"token","content":"Je réfléchis"}"#])]).with_tail(Tail::Hang);
    let mut session = ChatSession::new();
    let mut telemetry = TelemetryRecorder::new();
    let token = CancellationToken::new();

    let stop = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        stop.cancel();
    });

    let outcome = session.send(&transport, "long question", None, &token, &mut telemetry, |_| {}).await;

    assert_eq!(outcome, Some(StreamOutcome::Cancelled));
    assert_eq!(session.messages()[1].content, "Je réfléchis");
    assert!(!session.is_streaming());
    assert_eq!(telemetry.snapshot().chat.cancelled, 1);
}

#[tokio::test]
async fn test_clear_empties_conversation() {
    let transport = ScriptedTransport::chat(vec![sse(&[r#"{"type":"done","content":"ok"}"#])]);
    let mut session = ChatSession::new();
    send(&mut session, &transport, "one", None).await;

    session.clear();
    assert!(session.messages().is_empty());
}
