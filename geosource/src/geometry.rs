//! Coordinates and distance metrics.
//!
//! Coordinates are `(x, y)` pairs; for geographic data `x` is the longitude
//! and `y` the latitude, both in degrees.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A 2D coordinate (x, y). Serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Calculates the Euclidean distance to another coordinate.
    pub fn distance(&self, other: &Coordinate) -> f64 {
        self.squared_distance(other).sqrt()
    }

    /// Calculates the squared Euclidean distance to another coordinate.
    pub fn squared_distance(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Checks that both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from(value: [f64; 2]) -> Self {
        Coordinate::new(value[0], value[1])
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.x, coord.y]
    }
}

impl Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Distance used to rank cluster groups around a center.
///
/// A single metric is applied to every group of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DistanceMetric {
    /// Squared planar distance in degrees, with the longitude difference
    /// taken the short way round. Fast, locally valid.
    #[default]
    SquaredPlanar,
    /// Great-circle distance in meters, valid across the globe.
    Haversine,
}

impl DistanceMetric {
    /// Measures the distance between two longitude/latitude coordinates.
    pub fn distance(&self, a: &Coordinate, b: &Coordinate) -> f64 {
        match self {
            DistanceMetric::SquaredPlanar => {
                let dx = longitude_delta(a.x, b.x);
                let dy = a.y - b.y;
                dx * dx + dy * dy
            }
            DistanceMetric::Haversine => haversine_distance(a.y, a.x, b.y, b.x),
        }
    }
}

impl Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::SquaredPlanar => write!(f, "squared-planar"),
            DistanceMetric::Haversine => write!(f, "haversine"),
        }
    }
}

/// Difference between two longitudes, wrapped into `[-180, 180]`.
fn longitude_delta(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Earth's mean radius in meters (WGS84)
const EARTH_RADIUS_METERS: f64 = 6_371_008.8;

/// Calculates the great-circle distance in meters using the Haversine formula.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}
