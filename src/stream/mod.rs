//! Server-sent event plumbing shared by the agent and chat sessions.
//!
//! Frames are newline-delimited `data: <json>` lines delivered in chunks of
//! arbitrary size. `sse` reassembles lines across chunk boundaries and `reader`
//! drives a byte stream to completion under a cancellation token.

pub mod reader;
pub mod sse;

pub use reader::{pump, StreamOutcome};
pub use sse::{decode_frame, FrameBuffer};
