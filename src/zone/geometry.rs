//! Planar helpers in degree space. Callers always pass the gesture-start
//! snapshot so repeated moves never accumulate error.

use crate::geo::LngLat;

pub type Corners = [LngLat; 4];

/// Arithmetic mean of the points (not area-weighted).
pub fn centroid(points: &[LngLat]) -> LngLat {
    if points.is_empty() {
        return LngLat::default();
    }
    let n = points.len() as f64;
    let (sx, sy) = points.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.lng, sy + p.lat));
    LngLat::new(sx / n, sy / n)
}

pub fn translate(corners: &Corners, dlng: f64, dlat: f64) -> Corners {
    corners.map(|p| p.offset(dlng, dlat))
}

pub fn scale_from_center(corners: &Corners, factor: f64, center: LngLat) -> Corners {
    corners.map(|p| {
        LngLat::new(
            center.lng + (p.lng - center.lng) * factor,
            center.lat + (p.lat - center.lat) * factor,
        )
    })
}

/// Counter-clockwise rotation by `angle_rad` about `center`.
pub fn rotate(corners: &Corners, angle_rad: f64, center: LngLat) -> Corners {
    let (sin, cos) = angle_rad.sin_cos();
    corners.map(|p| {
        let dx = p.lng - center.lng;
        let dy = p.lat - center.lat;
        LngLat::new(center.lng + dx * cos - dy * sin, center.lat + dx * sin + dy * cos)
    })
}

/// Angle of `point` seen from `center`, radians, measured from the +lng axis.
pub fn bearing(center: LngLat, point: LngLat) -> f64 {
    (point.lat - center.lat).atan2(point.lng - center.lng)
}

pub fn distance(a: LngLat, b: LngLat) -> f64 {
    (a.lng - b.lng).hypot(a.lat - b.lat)
}

/// Wraps an angle in degrees into (-180, 180].
pub fn normalize_delta_deg(deg: f64) -> f64 {
    let wrapped = (deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}
