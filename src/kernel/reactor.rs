use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::cancel::{CancellationRegistry, Generation};
use super::event::AgentEvent;
use super::runner::{drive_stream, record_verdict, FrameVerdict};
use super::state::{AgentSession, AgentState};
use super::telemetry::{EditEventKind, ReanalysisOutcome, StreamChannel, TelemetryEvent, TelemetryRecorder};
use crate::config::Config;
use crate::geo::{LngLat, Polygon};
use crate::services::types::{AgentRunRequest, AnalysisRequest, AnalysisResult};
use crate::services::{SiteAnalyzer, StreamTransport};
use crate::solar::{generate_panel_grid, project_shadows, GridSpec, PanelGrid, ShadowParams, SunPosition};
use crate::stream::{decode_frame, StreamOutcome};
use crate::zone::{DragKind, DragTarget, EditMode, ZoneEditor};

/// Only every Nth panel footprint gets a shadow band in the overlay.
pub const SHADOW_SAMPLE_STRIDE: usize = 10;

/// Minimum clicks for a hand-drawn zone.
pub const MIN_DRAWING_POINTS: usize = 3;

/// Handle for one agent run. Keep a clone of `token` to cancel from elsewhere.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub run_id: Uuid,
    pub generation: Generation,
    pub token: CancellationToken,
    pub request: AgentRunRequest,
}

/// A pending `analyze` call, tagged with the run it was issued under.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub generation: Generation,
    pub request: AnalysisRequest,
}

#[derive(Debug, Clone)]
pub enum Launch {
    /// A hand-drawn zone exists: analyze it directly.
    Analyze(AnalysisJob),
    /// No drawn zone: let the agent pick one.
    Agent(RunTicket),
}

/// Owns the agent session, zone editor and user overrides of one assessment
/// view. Single-threaded: async work is split into begin/complete pairs so that
/// results from superseded runs can be recognised and ignored.
pub struct SiteReactor {
    config: Config,
    pub agent: AgentSession,
    pub editor: ZoneEditor,
    pub telemetry: TelemetryRecorder,
    cancel_registry: CancellationRegistry,
    drawing: Option<Vec<LngLat>>,
    drawn_polygon: Option<Polygon>,
    polygon_override: Option<Polygon>,
    analysis_override: Option<AnalysisResult>,
    re_analyzing: bool,
}

impl SiteReactor {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            agent: AgentSession::new(),
            editor: ZoneEditor::new(),
            telemetry: TelemetryRecorder::new(),
            cancel_registry: CancellationRegistry::new(),
            drawing: None,
            drawn_polygon: None,
            polygon_override: None,
            analysis_override: None,
            re_analyzing: false,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    // === Agent run lifecycle ===

    pub fn begin_run(&mut self) -> RunTicket {
        let request = AgentRunRequest::from_config(&self.config);
        self.begin_run_with(request)
    }

    /// Supersedes any in-flight run and resets every derived override before
    /// the old stream can deliver another frame.
    pub fn begin_run_with(&mut self, request: AgentRunRequest) -> RunTicket {
        let (generation, token) = self.cancel_registry.begin();

        self.agent.start();
        self.drawn_polygon = None;
        self.polygon_override = None;
        self.analysis_override = None;
        self.re_analyzing = false;

        let run_id = Uuid::new_v4();
        info!(target: "kernel::reactor", "Run {} started (generation {})", run_id, generation.0);

        RunTicket {
            run_id,
            generation,
            token,
            request,
        }
    }

    /// Applies one agent frame if it belongs to the current, still-open run.
    /// For hosts that pump the stream themselves; [`Self::drive_run`] goes
    /// through the same path.
    pub fn deliver(&mut self, generation: Generation, payload: &str) -> FrameVerdict {
        let verdict = apply_agent_frame(&self.cancel_registry, &mut self.agent, generation, payload);
        record_verdict(&mut self.telemetry, StreamChannel::Agent, verdict, payload.len());
        verdict
    }

    pub fn finish_run(&mut self, generation: Generation, outcome: &StreamOutcome) {
        if !accepts(&self.cancel_registry, generation) {
            return;
        }
        self.cancel_registry.release(generation);
        self.agent.finish(outcome);
        info!(target: "kernel::reactor", "Generation {} ended: {:?}", generation.0, self.agent.state());
    }

    /// User stop: aborts the stream and returns to idle. An in-flight run ends
    /// without an error; the error of a run that already failed is kept.
    pub fn stop_agent(&mut self) {
        if self.cancel_registry.cancel() {
            info!(target: "kernel::reactor", "Run cancelled by user");
            self.agent.cancel();
        } else {
            self.agent.set_idle();
        }
    }

    /// Opens the agent stream for `ticket` and applies its frames like [`Self::deliver`].
    pub async fn drive_run<T>(&mut self, transport: &T, ticket: &RunTicket) -> StreamOutcome
    where
        T: StreamTransport + ?Sized,
    {
        let generation = ticket.generation;
        let Self {
            agent,
            telemetry,
            cancel_registry,
            ..
        } = self;

        let outcome = drive_stream(
            StreamChannel::Agent,
            transport.open_agent(&ticket.request),
            &ticket.token,
            telemetry,
            |payload| apply_agent_frame(cancel_registry, agent, generation, payload),
        )
        .await;

        self.finish_run(generation, &outcome);
        outcome
    }

    // === Effective zone and analysis ===

    pub fn effective_polygon(&self) -> Option<&Polygon> {
        self.polygon_override
            .as_ref()
            .or(self.drawn_polygon.as_ref())
            .or(self.agent.polygon())
    }

    pub fn effective_analysis(&self) -> Option<&AnalysisResult> {
        self.analysis_override.as_ref().or(self.agent.analysis())
    }

    pub fn is_re_analyzing(&self) -> bool {
        self.re_analyzing
    }

    pub fn agent_state(&self) -> AgentState {
        self.agent.state()
    }

    /// Site latitude from the analysis when known, else the configured one.
    pub fn site_latitude(&self) -> f64 {
        self.effective_analysis()
            .and_then(|a| a.site_info.as_ref())
            .map_or(self.config.latitude, |s| s.latitude)
    }

    // === Drawing ===

    pub fn start_drawing(&mut self) {
        self.drawing = Some(Vec::new());
    }

    pub fn add_drawing_point(&mut self, point: LngLat) -> bool {
        match self.drawing.as_mut() {
            Some(points) => {
                points.push(point);
                true
            }
            None => false,
        }
    }

    /// Closes the drawn ring. Needs at least three corners (a last click back
    /// on the first point does not count); clears previous overrides since the
    /// zone changed. A rejected finish keeps drawing.
    pub fn finish_drawing(&mut self) -> bool {
        let Some(points) = self.drawing.as_ref() else {
            return false;
        };
        if distinct_corners(points) < MIN_DRAWING_POINTS {
            return false;
        }
        let polygon = Polygon::from_ring(points.clone());
        if !polygon.is_closed() {
            return false;
        }
        self.drawing = None;
        self.drawn_polygon = Some(polygon);
        self.polygon_override = None;
        self.analysis_override = None;
        true
    }

    pub fn cancel_drawing(&mut self) {
        self.drawing = None;
    }

    /// Drops the drawn zone and every override, falling back to the agent's zone.
    pub fn clear_zone(&mut self) {
        self.drawn_polygon = None;
        self.polygon_override = None;
        self.analysis_override = None;
        info!(target: "kernel::reactor", "Zone cleared");
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    pub fn drawing_points(&self) -> &[LngLat] {
        self.drawing.as_deref().unwrap_or(&[])
    }

    // === Zone editing ===

    pub fn start_edit(&mut self) -> bool {
        let Some(polygon) = self.effective_polygon().cloned() else {
            return false;
        };
        let started = self.editor.start_edit(&polygon);
        if started {
            self.telemetry.record(TelemetryEvent::ZoneEdit {
                event: EditEventKind::Started,
            });
        }
        started
    }

    pub fn set_edit_mode(&mut self, mode: EditMode) -> bool {
        self.editor.set_mode(mode)
    }

    pub fn pointer_down(&mut self, point: LngLat, target: DragTarget) -> bool {
        self.editor.pointer_down(point, target)
    }

    pub fn pointer_move(&mut self, point: LngLat) -> bool {
        self.editor.pointer_move(point)
    }

    pub fn pointer_up(&mut self) -> Option<DragKind> {
        let kind = self.editor.pointer_up()?;
        let event = match kind {
            DragKind::Translate => EditEventKind::Translated,
            DragKind::Corner => EditEventKind::Resized,
            DragKind::Rotate => EditEventKind::Rotated,
        };
        self.telemetry.record(TelemetryEvent::ZoneEdit { event });
        Some(kind)
    }

    pub fn cancel_edit(&mut self) {
        if self.editor.cancel_edit() {
            self.telemetry.record(TelemetryEvent::ZoneEdit {
                event: EditEventKind::Cancelled,
            });
        }
    }

    /// Commits the edit as the new zone and returns the re-analysis to run.
    pub fn commit_edit(&mut self) -> Option<AnalysisJob> {
        let result = self.editor.commit_edit()?;
        self.telemetry.record(TelemetryEvent::ZoneEdit {
            event: EditEventKind::Committed,
        });
        info!(target: "kernel::reactor", "Zone edit committed (azimuth {:.1}°)", result.azimuth_deg);

        self.polygon_override = Some(result.polygon.clone());
        self.re_analyzing = true;
        Some(AnalysisJob {
            generation: self.cancel_registry.current(),
            request: AnalysisRequest::for_zone(&self.config, result.polygon, result.azimuth_deg),
        })
    }

    /// Analyze a drawn zone directly, or start the agent when there is none.
    pub fn launch(&mut self) -> Launch {
        match self.drawn_polygon.clone() {
            Some(polygon) => {
                self.re_analyzing = true;
                Launch::Analyze(AnalysisJob {
                    generation: self.cancel_registry.current(),
                    request: AnalysisRequest::for_zone(&self.config, polygon, self.config.panels.azimuth_deg),
                })
            }
            None => Launch::Agent(self.begin_run()),
        }
    }

    /// Lands an `analyze` result. Clears the re-analyzing flag whether or not
    /// the call succeeded; a result from a superseded run is ignored.
    pub fn complete_analysis(&mut self, job: &AnalysisJob, result: Option<AnalysisResult>) -> bool {
        if !self.cancel_registry.is_current(job.generation) {
            debug!(target: "kernel::reactor", "Ignoring analysis from generation {}", job.generation.0);
            self.telemetry.record(TelemetryEvent::Reanalysis {
                outcome: ReanalysisOutcome::Stale,
            });
            return false;
        }

        self.re_analyzing = false;
        match result {
            Some(analysis) => {
                self.analysis_override = Some(analysis);
                self.telemetry.record(TelemetryEvent::Reanalysis {
                    outcome: ReanalysisOutcome::Applied,
                });
                true
            }
            None => {
                self.telemetry.record(TelemetryEvent::Reanalysis {
                    outcome: ReanalysisOutcome::Failed,
                });
                false
            }
        }
    }

    /// Commit, analyze, land. Returns true if a new analysis was applied.
    pub async fn apply_edit<A>(&mut self, analyzer: &A) -> bool
    where
        A: SiteAnalyzer + ?Sized,
    {
        let Some(job) = self.commit_edit() else {
            return false;
        };
        let result = analyze_or_none(analyzer, &job.request).await;
        self.complete_analysis(&job, result)
    }

    // === Overlays ===

    /// Shadow bands for a sample of the effective layout's panels at the given
    /// slider position.
    pub fn shadow_overlay(&self, hour: f64, month: u32) -> Vec<Polygon> {
        let Some(analysis) = self.effective_analysis() else {
            return Vec::new();
        };
        let latitude = self.site_latitude();
        let sun = SunPosition::at(hour, month, latitude);
        let params = ShadowParams {
            panel_height_m: self.config.panels.module_height_m,
            panel_tilt_deg: self.config.panels.tilt_deg,
            latitude_deg: latitude,
        };
        let footprints = analysis.panel_footprints();
        project_shadows(footprints.into_iter().step_by(SHADOW_SAMPLE_STRIDE), sun, &params)
    }

    /// Client-side layout preview for the effective zone.
    pub fn panel_grid_preview(&self) -> Option<PanelGrid> {
        let polygon = self.effective_polygon()?;
        let spec = GridSpec::from_defaults(&self.config.panels, self.site_latitude());
        Some(generate_panel_grid(polygon.exterior(), &spec))
    }
}

/// Frames are accepted only until the run is stopped, finished or superseded.
fn accepts(registry: &CancellationRegistry, generation: Generation) -> bool {
    registry.is_current(generation) && registry.in_flight()
}

fn apply_agent_frame(
    registry: &CancellationRegistry,
    agent: &mut AgentSession,
    generation: Generation,
    payload: &str,
) -> FrameVerdict {
    if !accepts(registry, generation) {
        return FrameVerdict::Stale(generation);
    }
    match decode_frame::<AgentEvent>(payload) {
        Ok(event) => {
            agent.apply(event);
            FrameVerdict::Applied
        }
        Err(_) => FrameVerdict::Dropped,
    }
}

/// Corner count of an open or closed ring.
fn distinct_corners(points: &[LngLat]) -> usize {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() > 1 && first == last => points.len() - 1,
        _ => points.len(),
    }
}

/// Calls the collaborator, turning any failure into `None`.
pub async fn analyze_or_none<A>(analyzer: &A, request: &AnalysisRequest) -> Option<AnalysisResult>
where
    A: SiteAnalyzer + ?Sized,
{
    match analyzer.analyze(request).await {
        Ok(result) => Some(result),
        Err(e) => {
            warn!(target: "kernel::reactor", "Analysis failed: {}", e);
            None
        }
    }
}
