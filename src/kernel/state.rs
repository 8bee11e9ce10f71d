use serde::Serialize;

use super::event::AgentEvent;
use crate::geo::Polygon;
use crate::services::types::{AnalysisResult, ModelResult};
use crate::stream::StreamOutcome;

pub const SELECT_ZONE: &str = "select_zone";
pub const RUN_SOLAR_ANALYSIS: &str = "run_solar_analysis";
pub const GENERATE_3D_VISUALIZATION: &str = "generate_3d_visualization";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    #[default]
    Idle,
    Running,
    Done,
    /// Sticky for the rest of the run.
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub tool: String,
    pub status: StepStatus,
}

/// State of one agent run, mutated only by [`AgentSession::apply`] and the
/// lifecycle calls around it.
#[derive(Debug, Clone, Default)]
pub struct AgentSession {
    state: AgentState,
    steps: Vec<Step>,
    thinking: String,
    error: Option<String>,
    polygon: Option<Polygon>,
    analysis: Option<AnalysisResult>,
    model: Option<ModelResult>,
    /// Bumped on every applied event.
    pub version: u64,
}

impl AgentSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears everything from a previous run and enters `Running`.
    pub fn start(&mut self) {
        *self = Self {
            state: AgentState::Running,
            version: self.version + 1,
            ..Self::default()
        };
    }

    /// Pure reduction: Session + Event -> Mutated Session
    pub fn apply(&mut self, event: AgentEvent) {
        self.version += 1;

        match event {
            AgentEvent::Thinking { content } => self.thinking.push_str(&content),
            AgentEvent::ToolStart { tool } => {
                // Retries of the same tool update in place.
                match self.steps.iter_mut().find(|s| s.tool == tool) {
                    Some(step) => step.status = StepStatus::Running,
                    None => self.steps.push(Step {
                        tool,
                        status: StepStatus::Running,
                    }),
                }
                self.thinking.clear();
            }
            AgentEvent::Polygon { data } => {
                self.polygon = Some(data);
                self.mark_done(SELECT_ZONE);
            }
            AgentEvent::Analysis { data } => {
                self.analysis = Some(*data);
                self.mark_done(RUN_SOLAR_ANALYSIS);
            }
            AgentEvent::Model3d { data } => {
                self.model = Some(data);
                self.mark_done(GENERATE_3D_VISUALIZATION);
            }
            AgentEvent::Error { message } => {
                self.error = Some(message);
                self.state = AgentState::Error;
            }
            AgentEvent::Done => {
                if self.state != AgentState::Error {
                    self.state = AgentState::Done;
                }
            }
            AgentEvent::Unknown => {}
        }
    }

    /// Resolves the terminal state once the read loop has ended.
    pub fn finish(&mut self, outcome: &StreamOutcome) {
        match outcome {
            StreamOutcome::Completed => {
                if self.state != AgentState::Error {
                    self.state = AgentState::Done;
                }
            }
            StreamOutcome::Cancelled => self.cancel(),
            StreamOutcome::Failed(message) => {
                self.error = Some(message.clone());
                self.state = AgentState::Error;
            }
        }
    }

    /// User-initiated stop: back to idle, no error surfaced.
    pub fn cancel(&mut self) {
        self.state = AgentState::Idle;
        self.error = None;
    }

    /// Back to idle without touching the outcome of a finished run.
    pub fn set_idle(&mut self) {
        self.state = AgentState::Idle;
    }

    fn mark_done(&mut self, tool: &str) {
        if let Some(step) = self.steps.iter_mut().find(|s| s.tool == tool) {
            step.status = StepStatus::Done;
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn thinking(&self) -> &str {
        &self.thinking
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn polygon(&self) -> Option<&Polygon> {
        self.polygon.as_ref()
    }

    pub fn analysis(&self) -> Option<&AnalysisResult> {
        self.analysis.as_ref()
    }

    pub fn model(&self) -> Option<&ModelResult> {
        self.model.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state == AgentState::Running
    }
}
