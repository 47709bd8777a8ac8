//! The spatial index bound to a source, in one of its two flavours.

use std::fmt::{self, Display};

use geojson::GeoJson;
use serde::{Deserialize, Serialize};

use crate::cluster::{ClusterIndex, ClusterOptions};
use crate::errors::GeoResult;
use crate::feature::{features_from_geojson, TileFeature};
use crate::normalize::normalize;
use crate::tile_index::{TileIndex, TileOptions};

/// Address of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Returns the ancestor of this tile at zoom `z`, or the tile itself if
    /// it is not deeper than `z`.
    pub fn ancestor_at(&self, z: u8) -> TileId {
        if self.z <= z {
            return *self;
        }
        let shift = u32::from(self.z - z);
        TileId::new(z, self.x.checked_shr(shift).unwrap_or(0), self.y.checked_shr(shift).unwrap_or(0))
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Something that can render tiles as features in tile coordinates.
pub trait TileSource {
    /// Returns the features of tile `(z, x, y)`, or `None` if it is empty.
    fn tile_at(&self, z: u8, x: u32, y: u32) -> Option<Vec<TileFeature>>;

    /// Returns the extent of the tile coordinate space.
    fn extent(&self) -> u32;
}

impl TileSource for ClusterIndex {
    fn tile_at(&self, z: u8, x: u32, y: u32) -> Option<Vec<TileFeature>> {
        ClusterIndex::tile_at(self, z, x, y)
    }

    fn extent(&self) -> u32 {
        self.options().extent
    }
}

impl TileSource for TileIndex {
    fn tile_at(&self, z: u8, x: u32, y: u32) -> Option<Vec<TileFeature>> {
        TileIndex::tile_at(self, z, x, y)
    }

    fn extent(&self) -> u32 {
        self.options().extent
    }
}

/// The index bound to a source.
#[derive(Debug)]
pub enum SpatialIndex {
    Cluster(ClusterIndex),
    Tile(TileIndex),
}

impl SpatialIndex {
    /// Normalizes `doc` and builds the requested flavour of index over it.
    pub fn build(
        mut doc: GeoJson,
        cluster: bool,
        cluster_options: ClusterOptions,
        tile_options: TileOptions,
    ) -> GeoResult<SpatialIndex> {
        normalize(&mut doc);
        let features = features_from_geojson(&doc)?;
        if cluster {
            Ok(SpatialIndex::Cluster(ClusterIndex::build(&features, cluster_options)?))
        } else {
            Ok(SpatialIndex::Tile(TileIndex::build(&features, tile_options)?))
        }
    }

    /// Returns the cluster index, if this is one.
    pub fn as_cluster(&self) -> Option<&ClusterIndex> {
        match self {
            SpatialIndex::Cluster(index) => Some(index),
            SpatialIndex::Tile(_) => None,
        }
    }

    /// Returns the tile index, if this is one.
    pub fn as_tile(&self) -> Option<&TileIndex> {
        match self {
            SpatialIndex::Tile(index) => Some(index),
            SpatialIndex::Cluster(_) => None,
        }
    }

    /// Returns the index as a tile source.
    pub fn as_tile_source(&self) -> &dyn TileSource {
        match self {
            SpatialIndex::Cluster(index) => index,
            SpatialIndex::Tile(index) => index,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SpatialIndex::Cluster(_) => "cluster",
            SpatialIndex::Tile(_) => "tile",
        }
    }
}
