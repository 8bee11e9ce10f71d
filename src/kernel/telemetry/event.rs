use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamChannel {
    Agent,
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    StreamLifecycle {
        channel: StreamChannel,
        event: StreamEventKind,
    },

    /// A `data:` line that failed to decode. Length only, never the payload.
    FrameDropped {
        channel: StreamChannel,
        bytes: usize,
    },

    /// A frame from a superseded run arrived after a reset.
    StaleFrameDiscarded {
        generation: u64,
    },

    ZoneEdit {
        event: EditEventKind,
    },

    Reanalysis {
        outcome: ReanalysisOutcome,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamEventKind {
    Opened,
    Completed,
    Cancelled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditEventKind {
    Started,
    Translated,
    Resized,
    Rotated,
    Committed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReanalysisOutcome {
    Applied,
    Failed,
    Stale,
}
