use serde::{Deserialize, Serialize};

use crate::errors::{GeoError, GeoResult};

/// Deepest zoom a tile index can serve.
pub const MAX_TILE_ZOOM: u8 = 24;

/// Configuration of a [`TileIndex`](super::TileIndex).
///
/// Deserializes from camelCase JSON; missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TileOptions {
    /// Deepest zoom tiles are generated for
    pub max_zoom: u8,
    /// Deepest zoom of the initial tiling pass
    pub index_max_zoom: u8,
    /// Tiles holding at most this many points are not split during the
    /// initial pass
    pub index_max_points: usize,
    /// Simplification tolerance, in tile pixels
    pub tolerance: f64,
    /// Tile extent
    pub extent: u32,
    /// Buffer around each tile, in tile pixels
    pub buffer: u32,
}

impl Default for TileOptions {
    fn default() -> Self {
        Self {
            max_zoom: 14,
            index_max_zoom: 5,
            index_max_points: 100_000,
            tolerance: 3.0,
            extent: 4096,
            buffer: 64,
        }
    }
}

impl TileOptions {
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_index_max_zoom(mut self, index_max_zoom: u8) -> Self {
        self.index_max_zoom = index_max_zoom;
        self
    }

    pub fn with_index_max_points(mut self, index_max_points: usize) -> Self {
        self.index_max_points = index_max_points;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    /// Initial tiling depth, never deeper than `max_zoom`.
    pub(crate) fn effective_index_max_zoom(&self) -> u8 {
        self.index_max_zoom.min(self.max_zoom)
    }

    /// Checks that the options describe a buildable index.
    pub fn validate(&self) -> GeoResult<()> {
        if self.max_zoom > MAX_TILE_ZOOM {
            return Err(GeoError::BuildFailed(format!(
                "Tile max zoom {} exceeds {}",
                self.max_zoom, MAX_TILE_ZOOM
            )));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(GeoError::BuildFailed(format!(
                "Tile tolerance must be a non-negative number, got {}",
                self.tolerance
            )));
        }
        if self.extent == 0 {
            return Err(GeoError::BuildFailed("Tile extent must be positive".to_string()));
        }
        Ok(())
    }
}
