//! Request types of the store's entry points.
//!
//! All requests deserialize from camelCase JSON so a host can forward the
//! messages it receives without reshaping them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;
use crate::cluster::ClusterOptions;
use crate::errors::GeoResult;
use crate::feature::FeatureId;
use crate::geometry::{Coordinate, DistanceMetric};
use crate::tile_index::TileOptions;

/// Where to fetch a document from. Fetching itself is done by the host's
/// [`DocumentLoader`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl LoadRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Resolves a [`LoadRequest`] into document text.
///
/// Errors are handed back to the caller of the ingest untouched.
pub trait DocumentLoader: Send + Sync {
    fn load(&self, request: &LoadRequest) -> GeoResult<String>;
}

impl<F> DocumentLoader for F
where
    F: Fn(&LoadRequest) -> GeoResult<String> + Send + Sync,
{
    fn load(&self, request: &LoadRequest) -> GeoResult<String> {
        self(request)
    }
}

/// Builds (or rebuilds) the index of a source.
///
/// Exactly one of `request` and `data` must be set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub source_id: String,
    #[serde(default)]
    pub request: Option<LoadRequest>,
    /// Raw GeoJSON text
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub cluster: bool,
    #[serde(default)]
    pub cluster_options: Option<ClusterOptions>,
    #[serde(default)]
    pub tile_options: Option<TileOptions>,
}

impl IngestRequest {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            ..Default::default()
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_request(mut self, request: LoadRequest) -> Self {
        self.request = Some(request);
        self
    }

    /// Builds a cluster index with `options`.
    pub fn clustered(mut self, options: ClusterOptions) -> Self {
        self.cluster = true;
        self.cluster_options = Some(options);
        self
    }

    /// Builds a tile index with `options`.
    pub fn tiled(mut self, options: TileOptions) -> Self {
        self.cluster = false;
        self.tile_options = Some(options);
        self
    }
}

/// Asks for one encoded tile of a source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileRequest {
    pub source_id: String,
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
    /// Deepest zoom the source is tiled at; deeper requests are served from
    /// the ancestor tile at this zoom
    pub max_zoom: u8,
}

impl TileRequest {
    pub fn new(source_id: impl Into<String>, zoom: u8, x: u32, y: u32, max_zoom: u8) -> Self {
        Self {
            source_id: source_id.into(),
            zoom,
            x,
            y,
            max_zoom,
        }
    }
}

/// Asks for the ordered point ids of a cluster source inside a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointListRequest {
    pub source_id: String,
    pub bbox: BoundingBox,
    pub zoom: f64,
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(default)]
    pub max_count: Option<usize>,
    /// Defaults to the center of `bbox`
    #[serde(default)]
    pub center: Option<Coordinate>,
    #[serde(default)]
    pub use_approx_tour: bool,
    /// Defaults to the store's metric
    #[serde(default)]
    pub distance_metric: Option<DistanceMetric>,
}

impl PointListRequest {
    pub fn new(source_id: impl Into<String>, bbox: BoundingBox, zoom: f64) -> Self {
        Self {
            source_id: source_id.into(),
            bbox,
            zoom,
            minzoom: 0,
            maxzoom: 24,
            max_count: None,
            center: None,
            use_approx_tour: false,
            distance_metric: None,
        }
    }

    pub fn with_zoom_range(mut self, minzoom: u8, maxzoom: u8) -> Self {
        self.minzoom = minzoom;
        self.maxzoom = maxzoom;
        self
    }

    pub fn with_max_count(mut self, max_count: usize) -> Self {
        self.max_count = Some(max_count);
        self
    }

    pub fn with_center(mut self, center: Coordinate) -> Self {
        self.center = Some(center);
        self
    }

    pub fn with_approx_tour(mut self, use_approx_tour: bool) -> Self {
        self.use_approx_tour = use_approx_tour;
        self
    }

    pub fn with_distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.distance_metric = Some(metric);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub source_id: String,
}

impl RemoveRequest {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
        }
    }
}

/// Asks for the direct children of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterChildrenRequest {
    pub source_id: String,
    pub cluster_id: FeatureId,
}

/// Asks for a page of the leaves of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterLeavesRequest {
    pub source_id: String,
    pub cluster_id: FeatureId,
    #[serde(default = "default_leaves_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_leaves_limit() -> usize {
    10
}

/// Asks for the zoom at which a cluster splits apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterExpansionZoomRequest {
    pub source_id: String,
    pub cluster_id: FeatureId,
}
