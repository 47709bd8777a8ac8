//! Pre-clipped vector tile pyramid for non-clustered sources.
//!
//! Features are projected once, wrapped around the antimeridian and sliced
//! into a quad-tree of tiles. Each tile keeps its features simplified for
//! its zoom; output is produced in integer tile coordinates.

mod clip;
mod convert;
mod options;
mod projected;
mod simplify;
mod tile;
mod tile_index;
mod wrap;

pub use options::*;
pub use tile_index::TileIndex;
