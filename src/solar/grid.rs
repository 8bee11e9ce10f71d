use crate::config::PanelDefaults;
use crate::geo::{meters_per_deg_lng, BoundingBox, LngLat, Polygon, METERS_PER_DEG_LAT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub module_width_m: f64,
    pub module_height_m: f64,
    pub row_spacing_m: f64,
    pub latitude_deg: f64,
}

impl GridSpec {
    pub fn from_defaults(panels: &PanelDefaults, latitude_deg: f64) -> Self {
        Self {
            module_width_m: panels.module_width_m,
            module_height_m: panels.module_height_m,
            row_spacing_m: panels.row_spacing_m,
            latitude_deg,
        }
    }

    /// North-south distance between the starts of consecutive rows.
    pub fn row_pitch_m(&self) -> f64 {
        self.module_height_m + self.row_spacing_m
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::from_defaults(&PanelDefaults::default(), 0.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridPanel {
    pub row: usize,
    pub col: usize,
    pub footprint: Polygon,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelGrid {
    pub panels: Vec<GridPanel>,
    pub n_rows: usize,
    pub n_cols: usize,
    module_area_m2: f64,
}

impl PanelGrid {
    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    pub fn total_module_area_m2(&self) -> f64 {
        self.module_area_m2 * self.panels.len() as f64
    }

    /// Module area over zone area. Zero for a degenerate zone.
    pub fn ground_coverage_ratio(&self, zone_area_m2: f64) -> f64 {
        if zone_area_m2 > 0.0 {
            self.total_module_area_m2() / zone_area_m2
        } else {
            0.0
        }
    }
}

/// Tiles the ring's axis-aligned bounding box with modules, row-major from the
/// south-west corner. Panels are not clipped to the ring itself.
pub fn generate_panel_grid(ring: &[LngLat], spec: &GridSpec) -> PanelGrid {
    let mut grid = PanelGrid {
        panels: Vec::new(),
        n_rows: 0,
        n_cols: 0,
        module_area_m2: spec.module_width_m * spec.module_height_m,
    };

    let Some(bbox) = BoundingBox::of(ring) else {
        return grid;
    };

    let lat_scale = METERS_PER_DEG_LAT;
    let lng_scale = meters_per_deg_lng(spec.latitude_deg);
    let (width_m, height_m) = bbox.extent_m(spec.latitude_deg);

    grid.n_cols = fit_count(width_m, spec.module_width_m);
    grid.n_rows = fit_count(height_m, spec.row_pitch_m());
    grid.panels.reserve(grid.n_rows * grid.n_cols);

    for row in 0..grid.n_rows {
        let y_m = row as f64 * spec.row_pitch_m();
        let lat0 = bbox.min_lat + y_m / lat_scale;
        let lat1 = bbox.min_lat + (y_m + spec.module_height_m) / lat_scale;

        for col in 0..grid.n_cols {
            let x_m = col as f64 * spec.module_width_m;
            let lng0 = bbox.min_lng + x_m / lng_scale;
            let lng1 = bbox.min_lng + (x_m + spec.module_width_m) / lng_scale;

            grid.panels.push(GridPanel {
                row,
                col,
                footprint: Polygon::from_ring(vec![
                    LngLat::new(lng0, lat0),
                    LngLat::new(lng1, lat0),
                    LngLat::new(lng1, lat1),
                    LngLat::new(lng0, lat1),
                ]),
            });
        }
    }

    grid
}

fn fit_count(extent_m: f64, pitch_m: f64) -> usize {
    if pitch_m > 0.0 && extent_m.is_finite() && extent_m > 0.0 {
        (extent_m / pitch_m).floor() as usize
    } else {
        0
    }
}
