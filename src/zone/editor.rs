use tracing::debug;

use super::geometry::{self, Corners};
use crate::geo::{LngLat, Polygon};

/// Lower bound on the resize factor; keeps the shape from collapsing or inverting.
pub const MIN_SCALE: f64 = 0.1;

/// Azimuth of an unrotated zone (panels facing due south).
pub const BASE_AZIMUTH_DEG: f64 = 180.0;

/// Which handle set the host shows. Does not restrict what can be grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditMode {
    #[default]
    Translate,
    Resize,
    Rotate,
}

/// What the pointer went down on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragTarget {
    Body,
    Corner(usize),
    RotateHandle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragKind {
    Translate,
    Corner,
    Rotate,
}

/// One pointer-down → pointer-up gesture.
#[derive(Debug, Clone, PartialEq)]
pub struct DragState {
    pub kind: DragKind,
    pub corner_index: Option<usize>,
    pub start_pointer: LngLat,
    /// Snapshot at pointer-down; every move is recomputed from it.
    pub original_corners: Corners,
    /// Bearing from centroid to `start_pointer`, radians. Rotate only.
    pub start_angle: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditSession {
    corners: Corners,
    mode: EditMode,
    cumulative_rotation_deg: f64,
    drag: Option<DragState>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    pub polygon: Polygon,
    pub azimuth_deg: f64,
}

/// Edit state machine. At most one session, and at most one drag within it.
#[derive(Debug, Default)]
pub struct ZoneEditor {
    session: Option<EditSession>,
}

impl ZoneEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts editing from the first four ring points. Any previous session is
    /// discarded. Returns false if the ring is too short.
    pub fn start_edit(&mut self, polygon: &Polygon) -> bool {
        let ring = polygon.exterior();
        if ring.len() < 4 {
            return false;
        }
        self.session = Some(EditSession {
            corners: [ring[0], ring[1], ring[2], ring[3]],
            mode: EditMode::Translate,
            cumulative_rotation_deg: 0.0,
            drag: None,
        });
        true
    }

    pub fn set_mode(&mut self, mode: EditMode) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                session.mode = mode;
                true
            }
            None => false,
        }
    }

    /// Begins a gesture. Ignored without a session, while another drag is
    /// active, or for a corner index outside 0..4.
    pub fn pointer_down(&mut self, point: LngLat, target: DragTarget) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.drag.is_some() {
            return false;
        }

        let original = session.corners;
        let drag = match target {
            DragTarget::RotateHandle => DragState {
                kind: DragKind::Rotate,
                corner_index: None,
                start_pointer: point,
                original_corners: original,
                start_angle: geometry::bearing(geometry::centroid(&original), point),
            },
            DragTarget::Corner(index) if index < 4 => DragState {
                kind: DragKind::Corner,
                corner_index: Some(index),
                start_pointer: point,
                original_corners: original,
                start_angle: 0.0,
            },
            DragTarget::Corner(index) => {
                debug!(target: "zone::editor", "Ignoring grab on corner {}", index);
                return false;
            }
            DragTarget::Body => DragState {
                kind: DragKind::Translate,
                corner_index: None,
                start_pointer: point,
                original_corners: original,
                start_angle: 0.0,
            },
        };

        session.drag = Some(drag);
        true
    }

    pub fn pointer_move(&mut self, point: LngLat) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        let Some(drag) = session.drag.as_ref() else {
            return false;
        };

        let orig = &drag.original_corners;
        session.corners = match drag.kind {
            DragKind::Translate => geometry::translate(
                orig,
                point.lng - drag.start_pointer.lng,
                point.lat - drag.start_pointer.lat,
            ),
            DragKind::Corner => {
                let center = geometry::centroid(orig);
                let index = drag.corner_index.unwrap_or(0);
                let orig_dist = geometry::distance(center, orig[index]);
                let new_dist = geometry::distance(center, point);
                let ratio = if orig_dist > 0.0 { new_dist / orig_dist } else { 1.0 };
                geometry::scale_from_center(orig, ratio.max(MIN_SCALE), center)
            }
            DragKind::Rotate => {
                let center = geometry::centroid(orig);
                let delta = geometry::bearing(center, point) - drag.start_angle;
                geometry::rotate(orig, delta, center)
            }
        };
        true
    }

    /// Ends the gesture. A rotate gesture folds its net rotation (corner 0's
    /// bearing change) into the session's cumulative rotation.
    pub fn pointer_up(&mut self) -> Option<DragKind> {
        let session = self.session.as_mut()?;
        let drag = session.drag.take()?;

        if drag.kind == DragKind::Rotate {
            let orig = &drag.original_corners;
            let before = geometry::bearing(geometry::centroid(orig), orig[0]);
            let after = geometry::bearing(geometry::centroid(&session.corners), session.corners[0]);
            session.cumulative_rotation_deg += geometry::normalize_delta_deg((after - before).to_degrees());
        }

        Some(drag.kind)
    }

    /// Closes the ring and ends the session.
    pub fn commit_edit(&mut self) -> Option<EditResult> {
        let session = self.session.take()?;
        Some(EditResult {
            polygon: Polygon::from_ring(session.corners.to_vec()),
            azimuth_deg: azimuth_for_rotation(session.cumulative_rotation_deg),
        })
    }

    pub fn cancel_edit(&mut self) -> bool {
        self.session.take().is_some()
    }

    pub fn is_editing(&self) -> bool {
        self.session.is_some()
    }

    pub fn is_dragging(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.drag.is_some())
    }

    pub fn mode(&self) -> Option<EditMode> {
        self.session.as_ref().map(|s| s.mode)
    }

    pub fn corners(&self) -> Option<&Corners> {
        self.session.as_ref().map(|s| &s.corners)
    }

    pub fn drag(&self) -> Option<&DragState> {
        self.session.as_ref().and_then(|s| s.drag.as_ref())
    }

    pub fn cumulative_rotation_deg(&self) -> f64 {
        self.session.as_ref().map_or(0.0, |s| s.cumulative_rotation_deg)
    }

    /// Live preview of the zone being edited, ring closed.
    pub fn edit_polygon(&self) -> Option<Polygon> {
        self.corners().map(|c| Polygon::from_ring(c.to_vec()))
    }
}

/// `((180 + rotation) mod 360 + 360) mod 360`, always in `[0, 360)`.
pub fn azimuth_for_rotation(rotation_deg: f64) -> f64 {
    let azimuth = (BASE_AZIMUTH_DEG + rotation_deg).rem_euclid(360.0);
    // rem_euclid rounds up to 360.0 for sums a few ulps below zero.
    if azimuth >= 360.0 {
        0.0
    } else {
        azimuth
    }
}
