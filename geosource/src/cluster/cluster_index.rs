//! Hierarchical greedy point clustering.
//!
//! Points are projected into the unit Mercator square and stored in one
//! R-tree per zoom level, from `max_zoom + 1` (the raw points) down to
//! `min_zoom`. Each level is derived from the one above it: every node that
//! has not been merged yet absorbs its unmerged neighbours within the zoom's
//! radius, and if enough points come together a new cluster node replaces
//! them at their weighted centroid.
//!
//! Cluster ids are `(index << 5) + (zoom + 1) + leaf_count`, where `index` is
//! the position of the seed node in the level above and `zoom` the level the
//! cluster was formed at. Because `leaf_count` is added, cluster ids never
//! collide with leaf ids, and the origin of a cluster can be recovered from
//! its id alone.

use rstar::primitives::GeomWithData;
use rstar::{RTree, AABB};
use serde_json::Value;

use crate::bounding_box::BoundingBox;
use crate::errors::{GeoError, GeoResult};
use crate::feature::{Feature, FeatureId, Geometry, Properties, TileFeature, TileGeometry, TilePoint};
use crate::geometry::Coordinate;
use crate::projection::{project_x, project_y, unproject_x, unproject_y};

use super::ClusterOptions;

type Entry = GeomWithData<[f64; 2], usize>;

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeKind {
    /// Position of the point in the leaf table
    Leaf(usize),
    Cluster(FeatureId),
}

#[derive(Debug, Clone)]
struct Node {
    x: f64,
    y: f64,
    /// Last zoom this node was processed at
    zoom: i32,
    kind: NodeKind,
    parent_id: Option<FeatureId>,
    num_points: usize,
}

#[derive(Debug, Default)]
struct Level {
    nodes: Vec<Node>,
    tree: RTree<Entry>,
}

impl Level {
    fn new(nodes: Vec<Node>) -> Self {
        let entries = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| GeomWithData::new([node.x, node.y], i))
            .collect();
        Self {
            tree: RTree::bulk_load(entries),
            nodes,
        }
    }

    /// Node positions within `radius` of `(x, y)`, in ascending order.
    fn within(&self, x: f64, y: f64, radius: f64) -> Vec<usize> {
        let mut ids: Vec<usize> = self
            .tree
            .locate_within_distance([x, y], radius * radius)
            .map(|entry| entry.data)
            .collect();
        ids.sort_unstable();
        ids
    }

    fn range(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<usize> {
        let envelope = AABB::from_corners([min_x, min_y], [max_x, max_y]);
        self.tree
            .locate_in_envelope(&envelope)
            .map(|entry| entry.data)
            .collect()
    }
}

/// Summary of a cluster node.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    pub id: FeatureId,
    /// Weighted centroid of the member points, in degrees
    pub coordinate: Coordinate,
    pub point_count: usize,
}

impl ClusterSummary {
    /// Properties attached to a cluster when it is rendered as a feature.
    pub fn properties(&self) -> Properties {
        let mut properties = Properties::new();
        properties.insert("cluster".to_string(), Value::Bool(true));
        properties.insert("cluster_id".to_string(), Value::from(self.id));
        properties.insert("point_count".to_string(), Value::from(self.point_count));
        properties.insert(
            "point_count_abbreviated".to_string(),
            abbreviate(self.point_count),
        );
        properties
    }
}

fn abbreviate(count: usize) -> Value {
    if count >= 10_000 {
        Value::from(format!("{}k", (count as f64 / 1000.0).round()))
    } else if count >= 1000 {
        Value::from(format!("{}k", (count as f64 / 100.0).round() / 10.0))
    } else {
        Value::from(count)
    }
}

/// Either an aggregate of points or a single point.
#[derive(Debug, Clone, PartialEq)]
pub enum ClusterOrLeaf {
    Cluster(ClusterSummary),
    Leaf(Feature),
}

impl ClusterOrLeaf {
    /// The cluster id or the leaf id.
    pub fn id(&self) -> FeatureId {
        match self {
            ClusterOrLeaf::Cluster(summary) => summary.id,
            ClusterOrLeaf::Leaf(feature) => feature.id,
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        match self {
            ClusterOrLeaf::Cluster(summary) => summary.coordinate,
            ClusterOrLeaf::Leaf(feature) => feature.first_coordinate().unwrap_or_default(),
        }
    }

    pub fn point_count(&self) -> usize {
        match self {
            ClusterOrLeaf::Cluster(summary) => summary.point_count,
            ClusterOrLeaf::Leaf(_) => 1,
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self, ClusterOrLeaf::Cluster(_))
    }
}

/// A point clustering index over one source.
#[derive(Debug)]
pub struct ClusterIndex {
    options: ClusterOptions,
    points: Vec<Feature>,
    /// Indexed by zoom, `0..=max_zoom + 1`. Levels below `min_zoom` are empty.
    levels: Vec<Level>,
}

impl ClusterIndex {
    /// Builds the index over every point of `features`.
    ///
    /// Multi-points contribute one leaf per member. Leaf ids are positions
    /// in that expanded point list. Features that are not points are skipped.
    pub fn build(features: &[Feature], options: ClusterOptions) -> GeoResult<Self> {
        options.validate()?;

        let mut points = Vec::new();
        let mut skipped = 0usize;
        for feature in features {
            match &feature.geometry {
                Geometry::Point(coord) => push_point(&mut points, *coord, &feature.properties),
                Geometry::MultiPoint(coords) => {
                    for coord in coords {
                        push_point(&mut points, *coord, &feature.properties);
                    }
                }
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            log::warn!("Skipped {} non-point features while clustering", skipped);
        }

        let leaves: Vec<Node> = points
            .iter()
            .enumerate()
            .filter_map(|(i, point)| {
                point.first_coordinate().map(|coord| Node {
                    x: project_x(coord.x),
                    y: project_y(coord.y),
                    zoom: i32::MAX,
                    kind: NodeKind::Leaf(i),
                    parent_id: None,
                    num_points: 1,
                })
            })
            .collect();

        let max_zoom = options.max_zoom as usize;
        let mut levels: Vec<Level> = (0..=max_zoom + 1).map(|_| Level::default()).collect();
        levels[max_zoom + 1] = Level::new(leaves);

        let mut index = ClusterIndex {
            options,
            points,
            levels,
        };
        for zoom in (index.options.min_zoom..=index.options.max_zoom).rev() {
            let nodes = index.cluster_level(zoom);
            index.levels[zoom as usize] = Level::new(nodes);
        }

        log::debug!(
            "Built cluster index with {} points over zooms {}..={}",
            index.points.len(),
            index.options.min_zoom,
            index.options.max_zoom
        );
        Ok(index)
    }

    /// Derives the nodes of level `zoom` from level `zoom + 1`, recording
    /// parent links on the latter.
    fn cluster_level(&mut self, zoom: u8) -> Vec<Node> {
        let leaf_count = self.points.len() as u64;
        let min_points = self.options.min_points;
        let radius = self.radius_at(zoom);
        let z = zoom as i32;
        let level = &mut self.levels[zoom as usize + 1];

        let mut next = Vec::new();
        for i in 0..level.nodes.len() {
            if level.nodes[i].zoom <= z {
                continue;
            }
            level.nodes[i].zoom = z;

            let (x, y, origin_points) = {
                let node = &level.nodes[i];
                (node.x, node.y, node.num_points)
            };
            let neighbors = level.within(x, y, radius);

            let num_points = origin_points
                + neighbors
                    .iter()
                    .map(|&k| &level.nodes[k])
                    .filter(|n| n.zoom > z)
                    .map(|n| n.num_points)
                    .sum::<usize>();

            if num_points > origin_points && num_points >= min_points {
                let id = ((i as u64) << 5) + (zoom as u64 + 1) + leaf_count;
                let mut wx = x * origin_points as f64;
                let mut wy = y * origin_points as f64;
                for &k in &neighbors {
                    let neighbor = &mut level.nodes[k];
                    if neighbor.zoom <= z {
                        continue;
                    }
                    neighbor.zoom = z;
                    neighbor.parent_id = Some(id);
                    wx += neighbor.x * neighbor.num_points as f64;
                    wy += neighbor.y * neighbor.num_points as f64;
                }
                level.nodes[i].parent_id = Some(id);

                next.push(Node {
                    x: wx / num_points as f64,
                    y: wy / num_points as f64,
                    zoom: i32::MAX,
                    kind: NodeKind::Cluster(id),
                    parent_id: None,
                    num_points,
                });
            } else {
                next.push(level.nodes[i].clone());
                if num_points > 1 {
                    for &k in &neighbors {
                        let neighbor = &mut level.nodes[k];
                        if neighbor.zoom <= z {
                            continue;
                        }
                        neighbor.zoom = z;
                        next.push(neighbor.clone());
                    }
                }
            }
        }
        next
    }

    fn radius_at(&self, zoom: u8) -> f64 {
        self.options.radius / (self.options.extent as f64 * 2f64.powi(zoom as i32))
    }

    fn limit_zoom(&self, zoom: i32) -> usize {
        let max = self.options.max_zoom as i32 + 1;
        zoom.min(max).max(self.options.min_zoom as i32) as usize
    }

    /// Returns the build options.
    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Returns the number of leaf points.
    pub fn point_count(&self) -> usize {
        self.points.len()
    }

    /// Returns the clusters and points inside `bbox` at `zoom`.
    ///
    /// Longitudes are wrapped into `[-180, 180)` and latitudes clamped; a box
    /// crossing the antimeridian is queried as two boxes.
    pub fn clusters_in(&self, bbox: &BoundingBox, zoom: i32) -> Vec<ClusterOrLeaf> {
        if !bbox.is_finite() {
            return Vec::new();
        }

        let mut min_lng = wrap_longitude(bbox.min_x);
        let min_lat = bbox.min_y.clamp(-90.0, 90.0);
        let mut max_lng = if bbox.max_x == 180.0 {
            180.0
        } else {
            wrap_longitude(bbox.max_x)
        };
        let max_lat = bbox.max_y.clamp(-90.0, 90.0);

        if bbox.max_x - bbox.min_x >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        } else if min_lng > max_lng {
            let mut east = self.clusters_in(&BoundingBox::new(min_lng, min_lat, 180.0, max_lat), zoom);
            let west = self.clusters_in(&BoundingBox::new(-180.0, min_lat, max_lng, max_lat), zoom);
            east.extend(west);
            return east;
        }

        let level = &self.levels[self.limit_zoom(zoom)];
        level
            .range(
                project_x(min_lng),
                project_y(max_lat),
                project_x(max_lng),
                project_y(min_lat),
            )
            .into_iter()
            .map(|i| self.to_output(&level.nodes[i]))
            .collect()
    }

    /// Returns the immediate children of a cluster one zoom level up.
    pub fn children_of(&self, cluster_id: FeatureId) -> GeoResult<Vec<ClusterOrLeaf>> {
        Ok(self
            .child_nodes(cluster_id)?
            .into_iter()
            .map(|node| self.to_output(node))
            .collect())
    }

    /// Returns up to `limit` leaf points of a cluster.
    ///
    /// `zoom` is only used for diagnostics: the cluster id already encodes
    /// the level it belongs to.
    pub fn leaves_of(&self, cluster_id: FeatureId, zoom: u8, limit: usize) -> GeoResult<Vec<Feature>> {
        log::debug!("Expanding cluster {} requested at zoom {}", cluster_id, zoom);
        self.leaves_page(cluster_id, limit, 0)
    }

    /// Returns up to `limit` leaf points of a cluster, skipping the first
    /// `offset`.
    pub fn leaves_page(&self, cluster_id: FeatureId, limit: usize, offset: usize) -> GeoResult<Vec<Feature>> {
        let mut leaves = Vec::new();
        if limit == 0 {
            // still reject unknown ids
            self.origin_of(cluster_id)?;
            return Ok(leaves);
        }
        self.append_leaves(&mut leaves, cluster_id, limit, offset, 0)?;
        Ok(leaves)
    }

    /// Returns the zoom at which a cluster breaks apart into several children.
    pub fn expansion_zoom(&self, cluster_id: FeatureId) -> GeoResult<u8> {
        let (_, origin_zoom) = self.origin_of(cluster_id)?;
        let mut expansion_zoom = origin_zoom - 1;
        let mut cluster_id = cluster_id;
        while expansion_zoom <= self.options.max_zoom as usize {
            let children = self.child_nodes(cluster_id)?;
            expansion_zoom += 1;
            match children.as_slice() {
                [only] => match only.kind {
                    NodeKind::Cluster(id) => cluster_id = id,
                    NodeKind::Leaf(_) => break,
                },
                _ => break,
            }
        }
        Ok(expansion_zoom as u8)
    }

    /// Renders the clusters and points around tile `(z, x, y)` as point
    /// features in tile coordinates. Returns `None` for an empty tile.
    pub fn tile_at(&self, z: u8, x: u32, y: u32) -> Option<Vec<TileFeature>> {
        if z > 31 || u64::from(x) >= 1u64 << z || u64::from(y) >= 1u64 << z {
            return None;
        }

        let level = &self.levels[self.limit_zoom(z as i32)];
        let z2 = 2f64.powi(z as i32);
        let p = self.options.radius / self.options.extent as f64;
        let (xf, yf) = (x as f64, y as f64);
        let top = (yf - p) / z2;
        let bottom = (yf + 1.0 + p) / z2;

        let mut features = Vec::new();
        let ids = level.range((xf - p) / z2, top, (xf + 1.0 + p) / z2, bottom);
        self.add_tile_features(&mut features, level, ids, xf, yf, z2);

        // points near the antimeridian show up on the opposite edge tile
        if x == 0 {
            let ids = level.range(1.0 - p / z2, top, 1.0, bottom);
            self.add_tile_features(&mut features, level, ids, z2, yf, z2);
        }
        if xf == z2 - 1.0 {
            let ids = level.range(0.0, top, p / z2, bottom);
            self.add_tile_features(&mut features, level, ids, -1.0, yf, z2);
        }

        if features.is_empty() {
            None
        } else {
            Some(features)
        }
    }

    fn add_tile_features(
        &self,
        out: &mut Vec<TileFeature>,
        level: &Level,
        ids: Vec<usize>,
        x: f64,
        y: f64,
        z2: f64,
    ) {
        let extent = self.options.extent as f64;
        for i in ids {
            let node = &level.nodes[i];
            let (id, properties) = match self.to_output(node) {
                ClusterOrLeaf::Cluster(summary) => (summary.id, summary.properties()),
                ClusterOrLeaf::Leaf(feature) => (feature.id, feature.properties),
            };
            let point = TilePoint::new(
                (extent * (node.x * z2 - x)).round() as i32,
                (extent * (node.y * z2 - y)).round() as i32,
            );
            out.push(TileFeature {
                id: Some(id),
                geometry: TileGeometry::Point(vec![point]),
                properties,
            });
        }
    }

    fn append_leaves(
        &self,
        result: &mut Vec<Feature>,
        cluster_id: FeatureId,
        limit: usize,
        offset: usize,
        mut skipped: usize,
    ) -> GeoResult<usize> {
        for child in self.child_nodes(cluster_id)? {
            match child.kind {
                NodeKind::Cluster(id) => {
                    if skipped + child.num_points <= offset {
                        skipped += child.num_points;
                    } else {
                        skipped = self.append_leaves(result, id, limit, offset, skipped)?;
                    }
                }
                NodeKind::Leaf(i) => {
                    if skipped < offset {
                        skipped += 1;
                    } else {
                        result.push(self.points[i].clone());
                    }
                }
            }
            if result.len() >= limit {
                break;
            }
        }
        Ok(skipped)
    }

    fn child_nodes(&self, cluster_id: FeatureId) -> GeoResult<Vec<&Node>> {
        let (index, origin_zoom) = self.origin_of(cluster_id)?;
        let level = &self.levels[origin_zoom];
        let origin = &level.nodes[index];
        let radius = self.radius_at((origin_zoom - 1) as u8);

        let children: Vec<&Node> = level
            .within(origin.x, origin.y, radius)
            .into_iter()
            .map(|k| &level.nodes[k])
            .filter(|node| node.parent_id == Some(cluster_id))
            .collect();

        if children.is_empty() {
            return Err(unknown_cluster(cluster_id));
        }
        Ok(children)
    }

    /// Decodes a cluster id into the seed node position and its level.
    fn origin_of(&self, cluster_id: FeatureId) -> GeoResult<(usize, usize)> {
        let leaf_count = self.points.len() as u64;
        if cluster_id < leaf_count {
            return Err(unknown_cluster(cluster_id));
        }
        let origin = cluster_id - leaf_count;
        let zoom = (origin % 32) as usize;
        let index = (origin >> 5) as usize;
        if zoom == 0 || zoom >= self.levels.len() || index >= self.levels[zoom].nodes.len() {
            return Err(unknown_cluster(cluster_id));
        }
        Ok((index, zoom))
    }

    fn to_output(&self, node: &Node) -> ClusterOrLeaf {
        match node.kind {
            NodeKind::Cluster(id) => ClusterOrLeaf::Cluster(ClusterSummary {
                id,
                coordinate: Coordinate::new(unproject_x(node.x), unproject_y(node.y)),
                point_count: node.num_points,
            }),
            NodeKind::Leaf(i) => ClusterOrLeaf::Leaf(self.points[i].clone()),
        }
    }
}

fn push_point(points: &mut Vec<Feature>, coord: Coordinate, properties: &Properties) {
    let id = points.len() as FeatureId;
    points.push(Feature::new(id, Geometry::Point(coord), properties.clone()));
}

fn wrap_longitude(lng: f64) -> f64 {
    ((lng + 180.0) % 360.0 + 360.0) % 360.0 - 180.0
}

fn unknown_cluster(cluster_id: FeatureId) -> GeoError {
    GeoError::InvalidInput(format!("No cluster with the specified id {}", cluster_id))
}
