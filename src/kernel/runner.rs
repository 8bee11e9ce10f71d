use std::future::Future;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cancel::Generation;
use super::event::AgentEvent;
use super::state::AgentSession;
use super::telemetry::{StreamChannel, StreamEventKind, TelemetryEvent, TelemetryRecorder};
use crate::error::ServiceError;
use crate::services::types::AgentRunRequest;
use crate::services::{ByteStream, StreamTransport};
use crate::stream::{decode_frame, pump, StreamOutcome};

/// What the session did with one frame payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameVerdict {
    Applied,
    /// Undecodable. Expected occasionally at chunk boundaries; never fatal.
    Dropped,
    /// Belongs to a superseded run.
    Stale(Generation),
}

/// Opens a stream and pumps it to completion, recording lifecycle and frame
/// telemetry. `open` is raced against the token like the reads are.
pub async fn drive_stream<Fut, F>(
    channel: StreamChannel,
    open: Fut,
    token: &CancellationToken,
    telemetry: &mut TelemetryRecorder,
    mut on_payload: F,
) -> StreamOutcome
where
    Fut: Future<Output = Result<ByteStream, ServiceError>>,
    F: FnMut(&str) -> FrameVerdict,
{
    let opened = tokio::select! {
        biased;
        _ = token.cancelled() => {
            debug!(target: "kernel::runner", "{:?} stream cancelled before open", channel);
            telemetry.stream(channel, StreamEventKind::Cancelled);
            return StreamOutcome::Cancelled;
        }
        res = open => res,
    };

    let body = match opened {
        Ok(body) => body,
        Err(e) => {
            warn!(target: "kernel::runner", "{:?} stream failed to open: {}", channel, e);
            telemetry.stream(channel, StreamEventKind::Failed);
            return StreamOutcome::Failed(e.to_string());
        }
    };
    telemetry.stream(channel, StreamEventKind::Opened);

    let outcome = pump(body, token, |payload| {
        let verdict = on_payload(&payload);
        record_verdict(telemetry, channel, verdict, payload.len());
    })
    .await;

    let kind = match &outcome {
        StreamOutcome::Completed => StreamEventKind::Completed,
        StreamOutcome::Cancelled => StreamEventKind::Cancelled,
        StreamOutcome::Failed(e) => {
            warn!(target: "kernel::runner", "{:?} stream failed: {}", channel, e);
            StreamEventKind::Failed
        }
    };
    telemetry.stream(channel, kind);
    outcome
}

/// Logs and records a frame that was not applied. Length only, never the payload.
pub fn record_verdict(telemetry: &mut TelemetryRecorder, channel: StreamChannel, verdict: FrameVerdict, bytes: usize) {
    match verdict {
        FrameVerdict::Applied => {}
        FrameVerdict::Dropped => {
            debug!(target: "kernel::runner", "Dropped undecodable {:?} frame ({} bytes)", channel, bytes);
            telemetry.record(TelemetryEvent::FrameDropped { channel, bytes });
        }
        FrameVerdict::Stale(generation) => {
            debug!(target: "kernel::runner", "Discarded stale frame from generation {}", generation.0);
            telemetry.record(TelemetryEvent::StaleFrameDiscarded { generation: generation.0 });
        }
    }
}

/// Runs one agent session end to end. Cancel through `token`; the session then
/// ends `Idle` with no error.
pub async fn run_agent<T>(
    transport: &T,
    request: &AgentRunRequest,
    session: &mut AgentSession,
    token: &CancellationToken,
    telemetry: &mut TelemetryRecorder,
) -> StreamOutcome
where
    T: StreamTransport + ?Sized,
{
    session.start();
    info!(target: "kernel::runner", "Agent run started (area {} ha, mode {:?})", request.area_hectares, request.mode);

    let outcome = drive_stream(
        StreamChannel::Agent,
        transport.open_agent(request),
        token,
        telemetry,
        |payload| match decode_frame::<AgentEvent>(payload) {
            Ok(event) => {
                session.apply(event);
                FrameVerdict::Applied
            }
            Err(_) => FrameVerdict::Dropped,
        },
    )
    .await;

    session.finish(&outcome);
    info!(target: "kernel::runner", "Agent run ended: {:?}", session.state());
    outcome
}
