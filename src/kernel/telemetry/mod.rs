//! Session telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer. Session state machines never
//! read it back; it exists for observability (dropped frames, stale events).
//!
//! # PRIVACY INVARIANT
//! Events must **NEVER** contain user content (chat text, coordinates, polygons).
//! Only channel names, generations, kinds and byte counts are allowed.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{EditEventKind, ReanalysisOutcome, StreamChannel, StreamEventKind, TelemetryEvent};
pub use metrics::TelemetrySnapshot;
pub use recorder::TelemetryRecorder;
