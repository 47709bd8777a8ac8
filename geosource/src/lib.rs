//! # geosource - GeoJSON Source Indexing
//!
//! This crate keeps GeoJSON documents in memory as spatial indices and
//! answers the queries a map renderer sends for them.
//!
//! ## Features
//!
//! - **Cluster Index**: hierarchical greedy clustering of point sources,
//!   per zoom level, backed by `rstar` R-trees
//! - **Tile Index**: pre-clipped, simplified tile pyramid for any geometry,
//!   with lazy drill-down past the pre-built zooms
//! - **Vector Tiles**: Mapbox Vector Tile (v2) protobuf encoding
//! - **Point Lists**: leaves of the clusters in a window ordered by distance
//!   to a center or along an approximate tour
//! - **Thread Safe**: sources are swapped atomically; queries never observe a
//!   partially built index
//!
//! ## Quick Start
//!
//! ```rust
//! use geosource::{BoundingBox, ClusterOptions, IngestRequest, PointListRequest, SourceStore, TileRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SourceStore::new();
//! let data = r#"{"type":"FeatureCollection","features":[
//!     {"type":"Feature","properties":{"name":"a"},"geometry":{"type":"Point","coordinates":[0,0]}},
//!     {"type":"Feature","properties":{"name":"b"},"geometry":{"type":"Point","coordinates":[0.5,0.5]}},
//!     {"type":"Feature","properties":{"name":"c"},"geometry":{"type":"Point","coordinates":[40,40]}}
//! ]}"#;
//! store.ingest(
//!     IngestRequest::new("places")
//!         .with_data(data)
//!         .clustered(ClusterOptions::default().with_radius(40.0)),
//! )?;
//!
//! // vector tile of the whole world
//! let tile = store.tile_for(&TileRequest::new("places", 0, 0, 0, 14))?;
//! assert!(tile.is_some());
//!
//! // every point in the window, nearest groups first
//! let request = PointListRequest::new("places", BoundingBox::new(-10.0, -10.0, 50.0, 50.0), 2.0)
//!     .with_max_count(10);
//! let list = store.plan(&request)?;
//! assert_eq!(list.ordered_ids.len(), 3);
//! # Ok(())
//! # }
//! ```

// Core model
pub mod bounding_box;
pub mod errors;
pub mod feature;
pub mod geometry;
pub mod normalize;
pub mod projection;

// Indices
pub mod cluster;
pub mod index;
pub mod tile_index;

// Encoding and ordering
pub mod mvt;
pub mod planner;
pub mod tour;

// Store surface
pub mod config;
pub mod request;
pub mod store;

pub use bounding_box::BoundingBox;
pub use errors::{ErrorKind, GeoError, GeoResult};
pub use feature::{
    features_from_geojson, Feature, FeatureId, Geometry, Properties, TileFeature, TileGeometry,
    TilePoint,
};
pub use geometry::{haversine_distance, Coordinate, DistanceMetric};
pub use normalize::normalize;

pub use cluster::{ClusterIndex, ClusterOptions, ClusterOrLeaf, ClusterSummary};
pub use index::{SpatialIndex, TileId, TileSource};
pub use tile_index::{TileIndex, TileOptions};

pub use mvt::{TileEncoder, DEFAULT_LAYER_NAME};
pub use planner::{PointList, PointListPlanner};
pub use tour::approximate_tour;

pub use config::{SourceStoreBuilder, StoreConfig};
pub use request::{
    ClusterChildrenRequest, ClusterExpansionZoomRequest, ClusterLeavesRequest, DocumentLoader,
    IngestRequest, LoadRequest, PointListRequest, RemoveRequest, TileRequest,
};
pub use store::{serve_tile, EncodedTile, SourceStore};
