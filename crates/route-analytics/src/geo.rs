//! Great-circle helpers and the coordinate/position types.

use chrono::{DateTime, Utc};
use realtime::{Result, validation};
use serde::{Deserialize, Serialize};

/// Mean Earth radius used for every great-circle distance.
pub const EARTH_RADIUS_KM: f64 = 6_371.0;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check the coordinate is finite and inside the geodetic range.
    ///
    /// # Errors
    ///
    /// Returns a validation error when latitude is outside [-90, 90] or
    /// longitude is outside [-180, 180].
    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(validation!("latitude {} out of range [-90, 90]", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(validation!("longitude {} out of range [-180, 180]", self.longitude));
        }
        Ok(())
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        haversine_km(self.latitude, self.longitude, other.latitude, other.longitude)
    }
}

/// A single observed vehicle position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl Position {
    /// Create a validated position.
    ///
    /// # Errors
    ///
    /// Returns a validation error when the coordinate is out of range.
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Result<Self> {
        Coordinate::new(latitude, longitude).validate()?;
        Ok(Self { latitude, longitude, timestamp })
    }

    #[must_use]
    pub const fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        self.coordinate().distance_km(&other.coordinate())
    }
}

#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_KM * c
}

/// Closest point to `point` on the segment `start`..`end`.
///
/// The segment is flattened with an equirectangular projection centred on its
/// mid latitude, the perpendicular foot is found and clamped to the endpoints,
/// then mapped back to degrees. Routes are short enough that the flattening
/// error is far below GPS noise. Longitude differences take the short way
/// round, so segments crossing the antimeridian project correctly.
#[must_use]
pub fn closest_point_on_segment(
    point: Coordinate, start: Coordinate, end: Coordinate,
) -> Coordinate {
    let cos_lat = f64::midpoint(start.latitude, end.latitude).to_radians().cos();
    let delta_lon = wrap_longitude(end.longitude - start.longitude);

    let dx = delta_lon * cos_lat;
    let dy = end.latitude - start.latitude;
    let px = wrap_longitude(point.longitude - start.longitude) * cos_lat;
    let py = point.latitude - start.latitude;

    let len_sq = dx.mul_add(dx, dy * dy);
    if len_sq <= 0.0 {
        return start;
    }

    let t = (px.mul_add(dx, py * dy) / len_sq).clamp(0.0, 1.0);
    Coordinate::new(
        t.mul_add(end.latitude - start.latitude, start.latitude),
        wrap_longitude(t.mul_add(delta_lon, start.longitude)),
    )
}

// Bring a longitude (or longitude difference) back into [-180, 180].
fn wrap_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}
