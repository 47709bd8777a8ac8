use std::collections::HashMap;

use parking_lot::Mutex;

use crate::errors::GeoResult;
use crate::feature::{Feature, TileFeature};

use super::clip::{clip, Axis};
use super::convert::convert;
use super::projected::VtFeature;
use super::tile::VtTile;
use super::wrap::wrap;
use super::TileOptions;

/// Key of a tile in the cache.
fn tile_key(z: u8, x: u32, y: u32) -> u64 {
    (((1u64 << z) * u64::from(y) + u64::from(x)) << 5) + u64::from(z)
}

/// A pre-clipped tile pyramid over one source.
///
/// Tiles down to `index_max_zoom` are sliced when the index is built;
/// deeper tiles are sliced on first request from the closest ancestor that
/// still holds its source features, then cached.
#[derive(Debug)]
pub struct TileIndex {
    options: TileOptions,
    tiles: Mutex<HashMap<u64, VtTile>>,
}

/// Target of a lazy drill-down.
#[derive(Debug, Clone, Copy)]
struct Drill {
    z: u8,
    x: u32,
    y: u32,
}

impl TileIndex {
    /// Projects, wraps and slices `features`.
    pub fn build(features: &[Feature], options: TileOptions) -> GeoResult<Self> {
        options.validate()?;

        let projected = wrap(convert(features, &options), &options);
        let index = TileIndex {
            options,
            tiles: Mutex::new(HashMap::new()),
        };
        if !projected.is_empty() {
            let mut tiles = index.tiles.lock();
            index.split_tile(&mut tiles, projected, 0, 0, 0, None);
            log::debug!(
                "Built tile index with {} features into {} tiles",
                features.len(),
                tiles.len()
            );
        }
        Ok(index)
    }

    /// Returns the build options.
    pub fn options(&self) -> &TileOptions {
        &self.options
    }

    /// Returns the number of tiles generated so far.
    pub fn tile_count(&self) -> usize {
        self.tiles.lock().len()
    }

    /// Returns the features of tile `(z, x, y)` in tile coordinates, or
    /// `None` if the tile is empty or out of range.
    pub fn tile_at(&self, z: u8, x: u32, y: u32) -> Option<Vec<TileFeature>> {
        if z > self.options.max_zoom {
            return None;
        }
        let z2 = 1u64 << z;
        if u64::from(x) >= z2 || u64::from(y) >= z2 {
            return None;
        }

        let mut tiles = self.tiles.lock();
        let id = tile_key(z, x, y);
        if !tiles.contains_key(&id) {
            let (mut z0, mut x0, mut y0) = (z, x, y);
            let mut parent_source = None;
            while z0 > 0 {
                z0 -= 1;
                x0 >>= 1;
                y0 >>= 1;
                if let Some(parent) = tiles.get(&tile_key(z0, x0, y0)) {
                    parent_source = parent.source.clone();
                    break;
                }
            }
            let source = parent_source?;

            log::debug!("Drilling down from {}/{}/{} to {}/{}/{}", z0, x0, y0, z, x, y);
            self.split_tile(&mut tiles, source, z0, x0, y0, Some(Drill { z, x, y }));
        }

        let features = tiles.get(&id)?.transform(self.options.extent);
        if features.is_empty() {
            None
        } else {
            Some(features)
        }
    }

    /// Slices `features` from tile `(z, x, y)` downwards.
    ///
    /// Without a drill target, splitting stops at `index_max_zoom` or at
    /// tiles with few enough points. With one, only the ancestors of the
    /// target are split.
    fn split_tile(
        &self,
        tiles: &mut HashMap<u64, VtTile>,
        features: Vec<VtFeature>,
        z: u8,
        x: u32,
        y: u32,
        drill: Option<Drill>,
    ) {
        let options = &self.options;
        let index_max_zoom = options.effective_index_max_zoom();
        let k1 = 0.5 * options.buffer as f64 / options.extent as f64;
        let k2 = 0.5 - k1;
        let k3 = 0.5 + k1;
        let k4 = 1.0 + k1;

        let mut stack = vec![(features, z, x, y)];
        while let Some((features, z, x, y)) = stack.pop() {
            let z2 = (1u64 << z) as f64;
            let tile = tiles
                .entry(tile_key(z, x, y))
                .or_insert_with(|| VtTile::create(&features, z, x, y, options));

            let stop = match drill {
                None => z == index_max_zoom || tile.num_points <= options.index_max_points,
                Some(target) => {
                    if z == options.max_zoom || z == target.z {
                        true
                    } else {
                        let steps = target.z - z;
                        x != target.x >> steps || y != target.y >> steps
                    }
                }
            };
            if stop {
                tile.source = Some(features);
                continue;
            }

            // the children hold the geometry from now on
            tile.source = None;
            if features.is_empty() {
                continue;
            }

            let (min_x, max_x, min_y, max_y) = (tile.min_x, tile.max_x, tile.min_y, tile.max_y);
            let (xf, yf) = (x as f64, y as f64);

            let left = clip(&features, z2, xf - k1, xf + k3, Axis::X, min_x, max_x);
            let right = clip(&features, z2, xf + k2, xf + k4, Axis::X, min_x, max_x);
            drop(features);

            let (tl, bl) = split_rows(&left, z2, yf, k1, k2, k3, k4, min_y, max_y);
            let (tr, br) = split_rows(&right, z2, yf, k1, k2, k3, k4, min_y, max_y);

            stack.push((tl, z + 1, x * 2, y * 2));
            stack.push((bl, z + 1, x * 2, y * 2 + 1));
            stack.push((tr, z + 1, x * 2 + 1, y * 2));
            stack.push((br, z + 1, x * 2 + 1, y * 2 + 1));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn split_rows(
    column: &[VtFeature],
    z2: f64,
    y: f64,
    k1: f64,
    k2: f64,
    k3: f64,
    k4: f64,
    min_y: f64,
    max_y: f64,
) -> (Vec<VtFeature>, Vec<VtFeature>) {
    if column.is_empty() {
        return (Vec::new(), Vec::new());
    }
    (
        clip(column, z2, y - k1, y + k3, Axis::Y, min_y, max_y),
        clip(column, z2, y + k2, y + k4, Axis::Y, min_y, max_y),
    )
}
