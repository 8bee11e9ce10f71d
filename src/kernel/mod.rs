pub mod cancel;
pub mod chat;
pub mod event;
pub mod reactor;
pub mod runner;
pub mod state;
pub mod telemetry;

pub use cancel::{CancellationRegistry, Generation};
pub use chat::{ChatSession, MessageId};
pub use event::{AgentEvent, ChatEvent};
pub use reactor::{AnalysisJob, Launch, RunTicket, SiteReactor};
pub use runner::{drive_stream, run_agent, FrameVerdict};
pub use state::{AgentSession, AgentState, Step, StepStatus};
