use serde::{Deserialize, Serialize};

use crate::errors::{GeoError, GeoResult};

/// Highest zoom a cluster index can be built for. Cluster ids keep the
/// origin zoom in their low 5 bits, so `max_zoom + 1` must fit in them.
pub const MAX_CLUSTER_ZOOM: u8 = 30;

/// Configuration of a [`ClusterIndex`](super::ClusterIndex).
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
///
/// # Examples
///
/// ```rust
/// use geosource::ClusterOptions;
///
/// let options = ClusterOptions::default().with_radius(40.0).with_max_zoom(16);
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClusterOptions {
    /// Lowest zoom at which clusters are generated
    pub min_zoom: u8,
    /// Highest zoom at which points are clustered
    pub max_zoom: u8,
    /// Minimum number of points to form a cluster
    pub min_points: usize,
    /// Cluster radius in pixels
    pub radius: f64,
    /// Tile extent the radius is measured against
    pub extent: u32,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0,
            max_zoom: 14,
            min_points: 2,
            radius: 50.0,
            extent: 512,
        }
    }
}

impl ClusterOptions {
    pub fn with_min_zoom(mut self, min_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_min_points(mut self, min_points: usize) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    /// Checks that the options describe a buildable index.
    pub fn validate(&self) -> GeoResult<()> {
        if self.max_zoom > MAX_CLUSTER_ZOOM {
            return Err(GeoError::BuildFailed(format!(
                "Cluster max zoom {} exceeds {}",
                self.max_zoom, MAX_CLUSTER_ZOOM
            )));
        }
        if self.min_zoom > self.max_zoom {
            return Err(GeoError::BuildFailed(format!(
                "Cluster min zoom {} is greater than max zoom {}",
                self.min_zoom, self.max_zoom
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(GeoError::BuildFailed(format!(
                "Cluster radius must be a non-negative number, got {}",
                self.radius
            )));
        }
        if self.extent == 0 {
            return Err(GeoError::BuildFailed("Cluster extent must be positive".to_string()));
        }
        Ok(())
    }
}
