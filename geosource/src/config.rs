use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::errors::{GeoError, GeoResult};
use crate::geometry::DistanceMetric;
use crate::mvt::DEFAULT_LAYER_NAME;
use crate::request::DocumentLoader;
use crate::store::SourceStore;

/// Settings shared by every source of a [`SourceStore`].
#[derive(Clone)]
pub struct StoreConfig {
    layer_name: String,
    distance_metric: DistanceMetric,
    loader: Option<Arc<dyn DocumentLoader>>,
}

impl StoreConfig {
    pub fn new() -> Self {
        StoreConfig {
            layer_name: DEFAULT_LAYER_NAME.to_string(),
            distance_metric: DistanceMetric::default(),
            loader: None,
        }
    }

    /// Name of the single layer written into encoded tiles.
    pub fn layer_name(&self) -> &str {
        &self.layer_name
    }

    pub fn set_layer_name(&mut self, layer_name: &str) -> GeoResult<()> {
        if layer_name.trim().is_empty() {
            log::error!("Tile layer name cannot be empty");
            return Err(GeoError::InvalidInput(
                "Tile layer name cannot be empty".to_string(),
            ));
        }
        self.layer_name = layer_name.to_string();
        Ok(())
    }

    /// Metric used by point-list queries that do not choose their own.
    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    pub fn set_distance_metric(&mut self, metric: DistanceMetric) {
        self.distance_metric = metric;
    }

    pub fn loader(&self) -> Option<&Arc<dyn DocumentLoader>> {
        self.loader.as_ref()
    }

    pub fn set_loader(&mut self, loader: Arc<dyn DocumentLoader>) {
        self.loader = Some(loader);
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::new()
    }
}

impl Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("layer_name", &self.layer_name)
            .field("distance_metric", &self.distance_metric)
            .field("loader", &self.loader.is_some())
            .finish()
    }
}

/// Builder of a [`SourceStore`].
///
/// The first invalid setting is remembered and reported by [`build`](Self::build).
#[derive(Default)]
pub struct SourceStoreBuilder {
    error: Option<GeoError>,
    config: StoreConfig,
}

impl SourceStoreBuilder {
    pub fn new() -> Self {
        SourceStoreBuilder {
            error: None,
            config: StoreConfig::new(),
        }
    }

    pub fn layer_name(mut self, layer_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_layer_name(layer_name) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn distance_metric(mut self, metric: DistanceMetric) -> Self {
        self.config.set_distance_metric(metric);
        self
    }

    /// Sets the loader that resolves `request` ingests.
    pub fn loader<L: DocumentLoader + 'static>(mut self, loader: L) -> Self {
        self.config.set_loader(Arc::new(loader));
        self
    }

    pub fn build(self) -> GeoResult<SourceStore> {
        if let Some(error) = self.error {
            return Err(error);
        }
        Ok(SourceStore::with_config(self.config))
    }
}
