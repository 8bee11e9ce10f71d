use std::f64::consts::PI;

use serde::Serialize;

/// Sun elevation and azimuth from a low-order approximation.
///
/// Day of year is taken as `month * 30`, declination uses Cooper's formula and
/// the hour angle assumes local solar time. Good enough for overlay shading,
/// not an ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SunPosition {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
}

impl SunPosition {
    /// `hour` in 0..=24 (fractional allowed), `month` in 1..=12.
    pub fn at(hour: f64, month: u32, latitude_deg: f64) -> Self {
        let declination = declination_deg(day_of_year(month)).to_radians();
        let hour_angle = hour_angle_deg(hour);
        let lat = latitude_deg.to_radians();
        let ha = hour_angle.to_radians();

        let sin_elev = lat.sin() * declination.sin() + lat.cos() * declination.cos() * ha.cos();

        Self {
            elevation_deg: sin_elev.clamp(-1.0, 1.0).asin().to_degrees(),
            azimuth_deg: 180.0 + hour_angle,
        }
    }

    pub fn is_up(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

pub fn day_of_year(month: u32) -> f64 {
    f64::from(month) * 30.0
}

pub fn declination_deg(day_of_year: f64) -> f64 {
    23.45 * (2.0 * PI / 365.0 * (day_of_year - 81.0)).sin()
}

/// 15° per hour from solar noon; negative in the morning.
pub fn hour_angle_deg(hour: f64) -> f64 {
    (hour - 12.0) * 15.0
}
