//! Spherical Web Mercator projection into the unit square.
//!
//! Longitude/latitude are mapped to `[0, 1] x [0, 1]` with `y` growing
//! southwards, which is the space both the cluster index and the tile index
//! work in. Tile `(z, x, y)` covers `[x / 2^z, (x + 1) / 2^z]` on each axis.

use std::f64::consts::PI;

/// Projects a longitude in degrees to unit x.
pub fn project_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

/// Projects a latitude in degrees to unit y, clamped to `[0, 1]`.
pub fn project_y(lat: f64) -> f64 {
    let sin = (lat * PI / 180.0).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    if y < 0.0 {
        0.0
    } else if y > 1.0 {
        1.0
    } else {
        y
    }
}

/// Converts unit x back to a longitude in degrees.
pub fn unproject_x(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

/// Converts unit y back to a latitude in degrees.
pub fn unproject_y(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * PI / 180.0;
    360.0 * y2.exp().atan() / PI - 90.0
}
