use serde::{Deserialize, Serialize};

/// Metres per degree of latitude (flat-earth approximation).
pub const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Metres per degree of longitude at the given latitude.
pub fn meters_per_deg_lng(latitude_deg: f64) -> f64 {
    METERS_PER_DEG_LAT * latitude_deg.to_radians().cos()
}

/// A geographic position. Serialized as a GeoJSON `[lng, lat]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn offset(self, dlng: f64, dlat: f64) -> Self {
        Self::new(self.lng + dlng, self.lat + dlat)
    }
}

impl From<[f64; 2]> for LngLat {
    fn from(pair: [f64; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<LngLat> for [f64; 2] {
    fn from(p: LngLat) -> Self {
        [p.lng, p.lat]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryType {
    #[default]
    Polygon,
}

/// GeoJSON `Polygon` with a single closed exterior ring.
///
/// Values are immutable once built: editing produces a new polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    #[serde(rename = "type")]
    kind: GeometryType,
    coordinates: Vec<Vec<LngLat>>,
}

impl Polygon {
    /// Builds a polygon from a ring, appending the first point if the ring is open.
    pub fn from_ring(mut ring: Vec<LngLat>) -> Self {
        if let (Some(first), Some(last)) = (ring.first().copied(), ring.last().copied()) {
            if first != last || ring.len() == 1 {
                ring.push(first);
            }
        }
        Self {
            kind: GeometryType::Polygon,
            coordinates: vec![ring],
        }
    }

    /// The exterior ring (closed). Empty if the wire value carried no ring.
    pub fn exterior(&self) -> &[LngLat] {
        self.coordinates.first().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_closed(&self) -> bool {
        let ring = self.exterior();
        ring.len() >= 4 && ring.first() == ring.last()
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn of(points: &[LngLat]) -> Option<Self> {
        let first = points.first()?;
        let seed = Self {
            min_lng: first.lng,
            min_lat: first.lat,
            max_lng: first.lng,
            max_lat: first.lat,
        };
        Some(points.iter().fold(seed, |b, p| Self {
            min_lng: b.min_lng.min(p.lng),
            min_lat: b.min_lat.min(p.lat),
            max_lng: b.max_lng.max(p.lng),
            max_lat: b.max_lat.max(p.lat),
        }))
    }

    /// Extent in metres `(width, height)` at the given latitude.
    pub fn extent_m(&self, latitude_deg: f64) -> (f64, f64) {
        (
            (self.max_lng - self.min_lng) * meters_per_deg_lng(latitude_deg),
            (self.max_lat - self.min_lat) * METERS_PER_DEG_LAT,
        )
    }
}

/// Planar ring area in square metres (shoelace on flat-earth projected coordinates).
pub fn ring_area_m2(ring: &[LngLat], latitude_deg: f64) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let sx = meters_per_deg_lng(latitude_deg);
    let sy = METERS_PER_DEG_LAT;
    let twice: f64 = ring
        .iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| (a.lng * sx) * (b.lat * sy) - (b.lng * sx) * (a.lat * sy))
        .sum();
    twice.abs() / 2.0
}
