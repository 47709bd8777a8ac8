//! Ordering of the points of a cluster source around a center.
//!
//! The clusters and points visible in a window are expanded into their
//! leaves, grouped per cluster, and the groups are ordered either by distance
//! to a center or along an approximate tour.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;
use crate::cluster::{ClusterIndex, ClusterOrLeaf};
use crate::errors::{GeoError, GeoResult};
use crate::feature::FeatureId;
use crate::geometry::{Coordinate, DistanceMetric};
use crate::request::PointListRequest;
use crate::tour::approximate_tour;

/// Result of a point-list query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointList {
    /// Leaf ids, group after group
    pub ordered_ids: Vec<FeatureId>,
    /// Group of every listed leaf: its cluster id, or its own id when the
    /// leaf is not clustered at the query zoom
    pub cluster_of: HashMap<FeatureId, FeatureId>,
}

impl PointList {
    pub fn len(&self) -> usize {
        self.ordered_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered_ids.is_empty()
    }
}

#[derive(Debug)]
struct Group {
    id: FeatureId,
    representative: Coordinate,
    members: Vec<FeatureId>,
}

/// Plans point lists with one distance metric.
#[derive(Debug, Clone, Copy, Default)]
pub struct PointListPlanner {
    metric: DistanceMetric,
}

impl PointListPlanner {
    pub fn new(metric: DistanceMetric) -> Self {
        Self { metric }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Lists the leaves of the clusters and points inside the request's
    /// window.
    ///
    /// Clusters are expanded in query order until `max_count` leaves have
    /// been collected; the last cluster may be cut short. Each group is
    /// placed by the coordinate of its first leaf.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a NaN zoom, a non-finite window or a
    /// `minzoom` above `maxzoom`, and propagates cluster lookups that the
    /// index rejects.
    pub fn plan(&self, index: &ClusterIndex, request: &PointListRequest) -> GeoResult<PointList> {
        validate(request)?;

        let zoom = effective_zoom(request.zoom, request.minzoom, request.maxzoom);
        let center = request.center.unwrap_or_else(|| window_center(&request.bbox));
        let budget = request.max_count.unwrap_or(usize::MAX);

        let mut groups = Vec::new();
        let mut collected = 0usize;
        for item in index.clusters_in(&request.bbox, i32::from(zoom)) {
            if collected >= budget {
                break;
            }
            let group = match item {
                ClusterOrLeaf::Leaf(leaf) => Group {
                    id: leaf.id,
                    representative: leaf.first_coordinate().unwrap_or_default(),
                    members: vec![leaf.id],
                },
                ClusterOrLeaf::Cluster(summary) => {
                    let leaves = index.leaves_of(summary.id, zoom, budget - collected)?;
                    let Some(first) = leaves.first() else {
                        continue;
                    };
                    Group {
                        id: summary.id,
                        representative: first.first_coordinate().unwrap_or(summary.coordinate),
                        members: leaves.iter().map(|leaf| leaf.id).collect(),
                    }
                }
            };
            collected += group.members.len();
            groups.push(group);
        }

        if request.use_approx_tour {
            let points: Vec<Coordinate> = groups.iter().map(|g| g.representative).collect();
            let order = approximate_tour(&points, Some(center));
            let mut slots: Vec<Option<Group>> = groups.into_iter().map(Some).collect();
            groups = order.into_iter().filter_map(|i| slots[i].take()).collect();
        } else {
            let metric = self.metric;
            let mut keyed: Vec<(f64, Group)> = groups
                .into_iter()
                .map(|g| (metric.distance(&g.representative, &center), g))
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            groups = keyed.into_iter().map(|(_, g)| g).collect();
        }

        let mut list = PointList::default();
        for group in groups {
            for member in group.members {
                list.ordered_ids.push(member);
                list.cluster_of.insert(member, group.id);
            }
        }
        log::debug!(
            "Planned {} points in {} at zoom {}",
            list.len(),
            request.bbox,
            zoom
        );
        Ok(list)
    }
}

fn validate(request: &PointListRequest) -> GeoResult<()> {
    if request.zoom.is_nan() {
        log::error!("Point-list zoom is NaN");
        return Err(GeoError::InvalidInput("Zoom must be a number".to_string()));
    }
    if !request.bbox.is_finite() {
        log::error!("Point-list window {} is not finite", request.bbox);
        return Err(GeoError::InvalidInput(format!(
            "Window {} must be finite",
            request.bbox
        )));
    }
    if request.center.is_some_and(|c| !c.is_finite()) {
        return Err(GeoError::InvalidInput("Center must be finite".to_string()));
    }
    if request.minzoom > request.maxzoom {
        log::error!(
            "Point-list minzoom {} is above maxzoom {}",
            request.minzoom,
            request.maxzoom
        );
        return Err(GeoError::InvalidInput(format!(
            "minzoom {} is above maxzoom {}",
            request.minzoom, request.maxzoom
        )));
    }
    Ok(())
}

/// Midpoint of a lng/lat window. A window whose `min_x` lies east of its
/// `max_x` crosses the antimeridian.
pub(crate) fn window_center(bbox: &BoundingBox) -> Coordinate {
    let (x, y) = bbox.center();
    if bbox.min_x <= bbox.max_x {
        return Coordinate::new(x, y);
    }
    let x = (bbox.min_x + bbox.max_x + 360.0) / 2.0;
    Coordinate::new((x + 180.0).rem_euclid(360.0) - 180.0, y)
}

/// `floor(zoom)` clamped to `[minzoom, maxzoom]`.
pub(crate) fn effective_zoom(zoom: f64, minzoom: u8, maxzoom: u8) -> u8 {
    zoom.floor().clamp(f64::from(minzoom), f64::from(maxzoom)) as u8
}
