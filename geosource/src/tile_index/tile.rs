//! Tiles of the tile index: simplified geometry in unit space, and its
//! transformation into integer tile coordinates.

use std::sync::Arc;

use crate::feature::{FeatureId, Properties, TileFeature, TileGeometry, TilePoint};

use super::projected::{VtFeature, VtGeometry, VtRing};
use super::TileOptions;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SimplifiedKind {
    Point,
    LineString,
    Polygon,
}

/// A feature simplified for one zoom, still in unit space.
#[derive(Debug, Clone)]
pub(crate) struct SimplifiedFeature {
    pub id: Option<FeatureId>,
    pub kind: SimplifiedKind,
    /// Points hold a single part; lines and polygons one part per ring
    pub parts: Vec<Vec<[f64; 2]>>,
    pub properties: Arc<Properties>,
}

#[derive(Debug)]
pub(crate) struct VtTile {
    pub z: u8,
    pub x: u32,
    pub y: u32,
    pub features: Vec<SimplifiedFeature>,
    pub num_points: usize,
    pub num_simplified: usize,
    /// Unsliced features kept for lazy drill-down
    pub source: Option<Vec<VtFeature>>,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl VtTile {
    /// Builds tile `(z, x, y)` from the features clipped to it.
    pub fn create(features: &[VtFeature], z: u8, x: u32, y: u32, options: &TileOptions) -> Self {
        let tolerance = if z == options.max_zoom {
            0.0
        } else {
            options.tolerance / ((1u64 << z) as f64 * options.extent as f64)
        };

        let mut tile = VtTile {
            z,
            x,
            y,
            features: Vec::new(),
            num_points: 0,
            num_simplified: 0,
            source: None,
            min_x: 2.0,
            min_y: 1.0,
            max_x: -1.0,
            max_y: 0.0,
        };
        for feature in features {
            tile.add_feature(feature, tolerance);
        }
        tile
    }

    fn add_feature(&mut self, feature: &VtFeature, tolerance: f64) {
        self.min_x = self.min_x.min(feature.min_x);
        self.min_y = self.min_y.min(feature.min_y);
        self.max_x = self.max_x.max(feature.max_x);
        self.max_y = self.max_y.max(feature.max_y);

        let mut parts = Vec::new();
        let kind = match &feature.geometry {
            VtGeometry::Point(points) => {
                parts.push(points.iter().map(|p| [p.x, p.y]).collect());
                self.num_points += points.len();
                self.num_simplified += points.len();
                SimplifiedKind::Point
            }
            VtGeometry::LineString(ring) => {
                self.add_line(&mut parts, ring, tolerance, false, false);
                SimplifiedKind::LineString
            }
            VtGeometry::MultiLineString(rings) => {
                for ring in rings {
                    self.add_line(&mut parts, ring, tolerance, false, false);
                }
                SimplifiedKind::LineString
            }
            VtGeometry::Polygon(rings) => {
                for (i, ring) in rings.iter().enumerate() {
                    self.add_line(&mut parts, ring, tolerance, true, i == 0);
                }
                SimplifiedKind::Polygon
            }
            VtGeometry::MultiPolygon(polygons) => {
                for rings in polygons {
                    for (i, ring) in rings.iter().enumerate() {
                        self.add_line(&mut parts, ring, tolerance, true, i == 0);
                    }
                }
                SimplifiedKind::Polygon
            }
        };

        if parts.iter().any(|part: &Vec<[f64; 2]>| !part.is_empty()) {
            self.features.push(SimplifiedFeature {
                id: feature.id,
                kind,
                parts,
                properties: Arc::clone(&feature.properties),
            });
        }
    }

    fn add_line(
        &mut self,
        parts: &mut Vec<Vec<[f64; 2]>>,
        ring: &VtRing,
        tolerance: f64,
        is_polygon: bool,
        is_outer: bool,
    ) {
        let sq_tolerance = tolerance * tolerance;
        let min_size = if is_polygon { sq_tolerance } else { tolerance };
        if tolerance > 0.0 && ring.size < min_size {
            // too small to show at this zoom
            self.num_points += ring.points.len();
            return;
        }

        let mut part = Vec::with_capacity(ring.points.len());
        for point in &ring.points {
            if tolerance == 0.0 || point.z > sq_tolerance {
                self.num_simplified += 1;
                part.push([point.x, point.y]);
            }
            self.num_points += 1;
        }

        if is_polygon {
            rewind(&mut part, is_outer);
        }
        parts.push(part);
    }

    /// Converts the tile into integer tile coordinates.
    pub fn transform(&self, extent: u32) -> Vec<TileFeature> {
        let extent = extent as f64;
        let z2 = (1u64 << self.z) as f64;
        let (tx, ty) = (self.x as f64, self.y as f64);
        let to_tile = |p: &[f64; 2]| {
            TilePoint::new(
                (extent * (p[0] * z2 - tx)).round() as i32,
                (extent * (p[1] * z2 - ty)).round() as i32,
            )
        };

        self.features
            .iter()
            .map(|feature| {
                let mut parts: Vec<Vec<TilePoint>> = feature
                    .parts
                    .iter()
                    .map(|part| part.iter().map(to_tile).collect())
                    .collect();
                let geometry = match feature.kind {
                    SimplifiedKind::Point => TileGeometry::Point(parts.pop().unwrap_or_default()),
                    SimplifiedKind::LineString => TileGeometry::LineString(parts),
                    SimplifiedKind::Polygon => TileGeometry::Polygon(parts),
                };
                TileFeature {
                    id: feature.id,
                    geometry,
                    properties: (*feature.properties).clone(),
                }
            })
            .collect()
    }
}

/// Orients a ring so that, in y-down space, outer rings have positive
/// shoelace area and holes negative.
fn rewind(ring: &mut [[f64; 2]], clockwise: bool) {
    let mut area = 0.0;
    let len = ring.len();
    if len == 0 {
        return;
    }
    let mut j = len - 1;
    for i in 0..len {
        area += (ring[i][0] - ring[j][0]) * (ring[i][1] + ring[j][1]);
        j = i;
    }
    if (area > 0.0) == clockwise {
        ring.reverse();
    }
}
