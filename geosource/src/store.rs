//! Registry of indexed sources and the entry points hosts call into.

use std::collections::{HashMap, HashSet};
use std::fmt::{self, Debug};
use std::sync::Arc;

use geojson::{FeatureCollection, GeoJson};
use parking_lot::{Mutex, RwLock};
use serde::{Serialize, Serializer};

use crate::cluster::ClusterOrLeaf;
use crate::config::{SourceStoreBuilder, StoreConfig};
use crate::errors::{GeoError, GeoResult};
use crate::feature::{Feature, TileFeature};
use crate::index::{SpatialIndex, TileId, TileSource};
use crate::mvt::{is_drawable, TileEncoder};
use crate::planner::{PointList, PointListPlanner};
use crate::request::{
    ClusterChildrenRequest, ClusterExpansionZoomRequest, ClusterLeavesRequest, IngestRequest,
    PointListRequest, RemoveRequest, TileRequest,
};

/// An encoded vector tile together with the features it was built from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodedTile {
    /// Protobuf bytes of the vector tile
    #[serde(rename = "encodedTile")]
    pub data: Vec<u8>,
    /// Features in tile coordinates
    #[serde(rename = "rawFeatures", serialize_with = "serialize_raw_features")]
    pub features: Vec<TileFeature>,
    /// Whether the tile had already been served since the source was
    /// (re)ingested. Reloaded tiles are encoded again, not replayed.
    #[serde(skip)]
    pub reloaded: bool,
}

impl EncodedTile {
    /// Returns the features as a GeoJSON feature collection in tile
    /// coordinates.
    pub fn raw_features(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self.features.iter().map(TileFeature::to_geojson).collect(),
            foreign_members: None,
        }
    }
}

fn serialize_raw_features<S: Serializer>(
    features: &[TileFeature],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    FeatureCollection {
        bbox: None,
        features: features.iter().map(TileFeature::to_geojson).collect(),
        foreign_members: None,
    }
    .serialize(serializer)
}

/// Renders and encodes one tile of `source`.
///
/// Features that have no drawable part left in tile space are dropped before
/// encoding, so the raw features always match the encoded ones. Returns
/// `None` when the tile holds no features.
pub fn serve_tile<S: TileSource + ?Sized>(
    source: &S,
    encoder: &TileEncoder,
    tile: TileId,
) -> GeoResult<Option<EncodedTile>> {
    let Some(mut features) = source.tile_at(tile.z, tile.x, tile.y) else {
        return Ok(None);
    };
    let rendered = features.len();
    features.retain(is_drawable);
    if features.len() < rendered {
        log::debug!(
            "Dropped {} features without drawable parts from tile {}",
            rendered - features.len(),
            tile
        );
    }
    if features.is_empty() {
        return Ok(None);
    }
    let data = encoder.encode(&features, source.extent())?;
    Ok(Some(EncodedTile {
        data,
        features,
        reloaded: false,
    }))
}

/// An index bound to a source id, with the addresses of the tiles served
/// from it so far.
#[derive(Debug)]
struct SourceEntry {
    index: SpatialIndex,
    loaded_tiles: Mutex<HashSet<TileId>>,
}

impl SourceEntry {
    fn new(index: SpatialIndex) -> Self {
        Self {
            index,
            loaded_tiles: Mutex::new(HashSet::new()),
        }
    }

    /// Marks `tile` as loaded and tells whether it already was.
    fn mark_loaded(&self, tile: TileId) -> bool {
        !self.loaded_tiles.lock().insert(tile)
    }
}

struct SourceStoreInner {
    config: StoreConfig,
    encoder: TileEncoder,
    sources: RwLock<HashMap<String, Arc<SourceEntry>>>,
}

/// Holds the spatial index of every ingested source.
///
/// The store is cheap to clone; clones share the same registry. `ingest`
/// and `remove` swap whole entries, so a query sees either the index that
/// was registered when it started or none, never a partial one. Queries
/// against an unknown source return empty results instead of errors.
///
/// # Examples
///
/// ```rust
/// use geosource::{IngestRequest, PointListRequest, BoundingBox, ClusterOptions, SourceStore};
///
/// let store = SourceStore::new();
/// let data = r#"{"type":"FeatureCollection","features":[
///     {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[1,1]}},
///     {"type":"Feature","properties":{},"geometry":{"type":"Point","coordinates":[2,2]}}
/// ]}"#;
/// store.ingest(IngestRequest::new("places").with_data(data).clustered(ClusterOptions::default()))?;
///
/// let request = PointListRequest::new("places", BoundingBox::new(-10.0, -10.0, 10.0, 10.0), 14.0);
/// let list = store.plan(&request)?;
/// assert_eq!(list.ordered_ids.len(), 2);
/// # Ok::<(), geosource::GeoError>(())
/// ```
#[derive(Clone)]
pub struct SourceStore {
    inner: Arc<SourceStoreInner>,
}

impl SourceStore {
    /// Creates a store with the default configuration.
    pub fn new() -> Self {
        SourceStore::with_config(StoreConfig::new())
    }

    pub fn builder() -> SourceStoreBuilder {
        SourceStoreBuilder::new()
    }

    pub(crate) fn with_config(config: StoreConfig) -> Self {
        let encoder = TileEncoder::new(config.layer_name());
        SourceStore {
            inner: Arc::new(SourceStoreInner {
                config,
                encoder,
                sources: RwLock::new(HashMap::new()),
            }),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Builds an index for the request's document and registers it under
    /// the request's source id, replacing any previous index.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if not exactly one of `data` and `request` is set,
    ///   if a `request` is given but no loader is configured, or if the
    ///   document is not GeoJSON.
    /// - `BuildFailed` if the index cannot be built from the document.
    /// - Loader errors are returned as they are.
    ///
    /// On error the previous index of the source stays in place.
    pub fn ingest(&self, request: IngestRequest) -> GeoResult<()> {
        let text = self.resolve_document(&request)?;
        let doc = text.parse::<GeoJson>().map_err(|e| {
            log::error!("Source {} is not valid GeoJSON: {}", request.source_id, e);
            GeoError::from(e)
        })?;

        let cluster_options = request.cluster_options.unwrap_or_default();
        let tile_options = request.tile_options.unwrap_or_default();
        let index = SpatialIndex::build(doc, request.cluster, cluster_options, tile_options)
            .inspect_err(|e| log::error!("Failed to index source {}: {}", request.source_id, e))?;

        log::info!(
            "Indexed source {} as {} index",
            request.source_id,
            index.kind()
        );
        let entry = Arc::new(SourceEntry::new(index));
        self.inner.sources.write().insert(request.source_id, entry);
        Ok(())
    }

    fn resolve_document(&self, request: &IngestRequest) -> GeoResult<String> {
        match (&request.data, &request.request) {
            (Some(data), None) => Ok(data.clone()),
            (None, Some(load)) => {
                let Some(loader) = self.inner.config.loader() else {
                    log::error!("No loader configured to fetch {}", load.url);
                    return Err(GeoError::InvalidInput(format!(
                        "No loader configured to fetch {}",
                        load.url
                    )));
                };
                log::debug!("Loading source {} from {}", request.source_id, load.url);
                loader.load(load)
            }
            (Some(_), Some(_)) => {
                log::error!("Ingest of {} has both data and request", request.source_id);
                Err(GeoError::InvalidInput(
                    "Exactly one of data and request must be given, found both".to_string(),
                ))
            }
            (None, None) => {
                log::error!("Ingest of {} has neither data nor request", request.source_id);
                Err(GeoError::InvalidInput(
                    "Exactly one of data and request must be given, found none".to_string(),
                ))
            }
        }
    }

    /// Unregisters a source. Removing an unknown source is a no-op.
    pub fn remove(&self, request: &RemoveRequest) {
        if self.inner.sources.write().remove(&request.source_id).is_some() {
            log::info!("Removed source {}", request.source_id);
        }
    }

    pub fn contains_source(&self, source_id: &str) -> bool {
        self.inner.sources.read().contains_key(source_id)
    }

    /// Returns the registered source ids in ascending order.
    pub fn source_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.inner.sources.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn entry(&self, source_id: &str) -> Option<Arc<SourceEntry>> {
        self.inner.sources.read().get(source_id).cloned()
    }

    /// Returns the encoded tile at the requested address.
    ///
    /// Zooms deeper than `max_zoom` are served from the ancestor tile at
    /// `max_zoom`. Returns `None` for unknown sources and empty tiles. Only
    /// the address of a served tile is remembered; the index keeps its own
    /// tile slices, so a reload encodes the tile again.
    ///
    /// # Errors
    ///
    /// Returns `EncodingFailed` if the features cannot be encoded.
    pub fn tile_for(&self, request: &TileRequest) -> GeoResult<Option<EncodedTile>> {
        let Some(entry) = self.entry(&request.source_id) else {
            log::debug!("Tile requested for unknown source {}", request.source_id);
            return Ok(None);
        };

        let tile = TileId::new(request.zoom, request.x, request.y).ancestor_at(request.max_zoom);
        let served = serve_tile(entry.index.as_tile_source(), &self.inner.encoder, tile)
            .inspect_err(|e| {
                log::error!("Failed to encode tile {} of {}: {}", tile, request.source_id, e)
            })?;
        Ok(served.map(|mut encoded| {
            encoded.reloaded = entry.mark_loaded(tile);
            encoded
        }))
    }

    /// Checks whether a tile has been served since the source was last
    /// ingested.
    pub fn is_tile_loaded(&self, source_id: &str, tile: TileId) -> bool {
        self.entry(source_id)
            .is_some_and(|entry| entry.loaded_tiles.lock().contains(&tile))
    }

    /// Lists the point ids of a cluster source inside a window, ordered
    /// around a center.
    ///
    /// Unknown sources and tile sources yield an empty list.
    pub fn plan(&self, request: &PointListRequest) -> GeoResult<PointList> {
        let Some(entry) = self.entry(&request.source_id) else {
            return Ok(PointList::default());
        };
        let Some(index) = entry.index.as_cluster() else {
            log::debug!("Source {} is not clustered, no points to plan", request.source_id);
            return Ok(PointList::default());
        };
        let metric = request
            .distance_metric
            .unwrap_or_else(|| self.inner.config.distance_metric());
        PointListPlanner::new(metric).plan(index, request)
    }

    /// Returns the direct children of a cluster.
    pub fn cluster_children(&self, request: &ClusterChildrenRequest) -> GeoResult<Vec<ClusterOrLeaf>> {
        match self.entry(&request.source_id) {
            Some(entry) => match entry.index.as_cluster() {
                Some(index) => index.children_of(request.cluster_id),
                None => Ok(Vec::new()),
            },
            None => Ok(Vec::new()),
        }
    }

    /// Returns a page of the leaves of a cluster.
    pub fn cluster_leaves(&self, request: &ClusterLeavesRequest) -> GeoResult<Vec<Feature>> {
        match self.entry(&request.source_id) {
            Some(entry) => match entry.index.as_cluster() {
                Some(index) => index.leaves_page(request.cluster_id, request.limit, request.offset),
                None => Ok(Vec::new()),
            },
            None => Ok(Vec::new()),
        }
    }

    /// Returns the zoom at which a cluster breaks apart, or `None` if the
    /// source is unknown or not clustered.
    pub fn cluster_expansion_zoom(&self, request: &ClusterExpansionZoomRequest) -> GeoResult<Option<u8>> {
        match self.entry(&request.source_id) {
            Some(entry) => match entry.index.as_cluster() {
                Some(index) => index.expansion_zoom(request.cluster_id).map(Some),
                None => Ok(None),
            },
            None => Ok(None),
        }
    }
}

impl Debug for SourceStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceStore")
            .field("config", &self.inner.config)
            .field("sources", &self.source_ids())
            .finish()
    }
}

impl Default for SourceStore {
    fn default() -> Self {
        SourceStore::new()
    }
}
