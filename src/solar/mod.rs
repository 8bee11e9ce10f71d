//! Sun position, shadow projection and panel-grid layout.
//!
//! All functions are pure and never fail: degenerate inputs yield empty or
//! zero-sized output.

pub mod grid;
pub mod position;
pub mod shadow;

pub use grid::{generate_panel_grid, GridPanel, GridSpec, PanelGrid};
pub use position::SunPosition;
pub use shadow::{project_shadows, shadow_azimuth_deg, shadow_length_m, ShadowParams};
