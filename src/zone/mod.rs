//! Interactive quadrilateral zone editing.

pub mod editor;
pub mod geometry;

pub use editor::{DragKind, DragState, DragTarget, EditMode, EditResult, EditSession, ZoneEditor};
pub use geometry::Corners;
