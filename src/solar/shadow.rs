use super::position::SunPosition;
use crate::geo::{meters_per_deg_lng, LngLat, Polygon, METERS_PER_DEG_LAT};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowParams {
    /// Slant length of the module along its tilted edge.
    pub panel_height_m: f64,
    pub panel_tilt_deg: f64,
    /// Used for the degree/metre conversion of the shadow offset.
    pub latitude_deg: f64,
}

/// Horizontal shadow length cast by the raised edge of a tilted module.
pub fn shadow_length_m(panel_height_m: f64, panel_tilt_deg: f64, elevation_deg: f64) -> f64 {
    panel_height_m * panel_tilt_deg.to_radians().sin() / elevation_deg.to_radians().tan()
}

/// Shadows point away from the sun.
pub fn shadow_azimuth_deg(sun_azimuth_deg: f64) -> f64 {
    (sun_azimuth_deg + 180.0).rem_euclid(360.0)
}

/// Offset `(dlng, dlat)` in degrees for a ground vector of `length_m` towards `azimuth_deg`.
pub fn offset_deg(length_m: f64, azimuth_deg: f64, latitude_deg: f64) -> (f64, f64) {
    let az = azimuth_deg.to_radians();
    let dx = length_m * az.sin();
    let dy = length_m * az.cos();
    (dx / meters_per_deg_lng(latitude_deg), dy / METERS_PER_DEG_LAT)
}

/// One shadow band per panel footprint: the footprint ring traced forward, then
/// its shifted copy traced backward, closed. Empty when the sun is down.
pub fn project_shadows<'a, I>(footprints: I, sun: SunPosition, params: &ShadowParams) -> Vec<Polygon>
where
    I: IntoIterator<Item = &'a Polygon>,
{
    if sun.elevation_deg <= 0.0 {
        return Vec::new();
    }

    let length = shadow_length_m(params.panel_height_m, params.panel_tilt_deg, sun.elevation_deg);
    let (dlng, dlat) = offset_deg(length, shadow_azimuth_deg(sun.azimuth_deg), params.latitude_deg);

    footprints
        .into_iter()
        .filter(|f| !f.exterior().is_empty())
        .map(|footprint| {
            let ring = footprint.exterior();
            let band: Vec<LngLat> = ring
                .iter()
                .copied()
                .chain(ring.iter().rev().map(|p| p.offset(dlng, dlat)))
                .collect();
            Polygon::from_ring(band)
        })
        .collect()
}
