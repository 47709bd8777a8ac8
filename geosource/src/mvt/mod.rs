//! Mapbox Vector Tile encoding.

mod encoder;
pub mod vector_tile;

pub use encoder::{
    decode, decode_geometry, decode_properties, is_drawable, TileEncoder, DEFAULT_LAYER_NAME,
};
pub use vector_tile::tile::GeomType;
pub use vector_tile::Tile;
