use std::collections::VecDeque;

use super::event::{EditEventKind, ReanalysisOutcome, StreamChannel, StreamEventKind, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub agent: StreamStats,
    pub chat: StreamStats,
    pub stale_frames: u64,
    pub edit_stats: EditStats,
    pub reanalysis_stats: ReanalysisStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamStats {
    pub opened: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub dropped_frames: u64,
    pub dropped_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditStats {
    pub sessions: u64,
    pub gestures: u64,
    pub rotations: u64,
    pub commits: u64,
    pub cancels: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReanalysisStats {
    pub applied: u64,
    pub failed: u64,
    pub stale: u64,
}

impl TelemetrySnapshot {
    pub fn channel(&self, channel: StreamChannel) -> &StreamStats {
        match channel {
            StreamChannel::Agent => &self.agent,
            StreamChannel::Chat => &self.chat,
        }
    }

    fn channel_mut(&mut self, channel: StreamChannel) -> &mut StreamStats {
        match channel {
            StreamChannel::Agent => &mut self.agent,
            StreamChannel::Chat => &mut self.chat,
        }
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::StreamLifecycle { channel, event } => {
                let stats = snap.channel_mut(*channel);
                match event {
                    StreamEventKind::Opened => stats.opened += 1,
                    StreamEventKind::Completed => stats.completed += 1,
                    StreamEventKind::Cancelled => stats.cancelled += 1,
                    StreamEventKind::Failed => stats.failed += 1,
                }
            }
            TelemetryEvent::FrameDropped { channel, bytes } => {
                let stats = snap.channel_mut(*channel);
                stats.dropped_frames += 1;
                stats.dropped_bytes += *bytes as u64;
            }
            TelemetryEvent::StaleFrameDiscarded { .. } => snap.stale_frames += 1,
            TelemetryEvent::ZoneEdit { event } => match event {
                EditEventKind::Started => snap.edit_stats.sessions += 1,
                EditEventKind::Translated | EditEventKind::Resized => snap.edit_stats.gestures += 1,
                EditEventKind::Rotated => {
                    snap.edit_stats.gestures += 1;
                    snap.edit_stats.rotations += 1;
                }
                EditEventKind::Committed => snap.edit_stats.commits += 1,
                EditEventKind::Cancelled => snap.edit_stats.cancels += 1,
            },
            TelemetryEvent::Reanalysis { outcome } => match outcome {
                ReanalysisOutcome::Applied => snap.reanalysis_stats.applied += 1,
                ReanalysisOutcome::Failed => snap.reanalysis_stats.failed += 1,
                ReanalysisOutcome::Stale => snap.reanalysis_stats.stale += 1,
            },
        }
    }

    snap
}
