//! Features in projected unit space, as the tile index slices them.

use std::sync::Arc;

use crate::feature::{FeatureId, Properties};

/// A projected point. `z` is the simplification importance: a point is kept
/// at a zoom when its importance exceeds that zoom's squared tolerance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct VtPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl VtPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// A line or ring with its length (lines) or absolute area (rings), used to
/// drop features too small to see at a zoom.
#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct VtRing {
    pub points: Vec<VtPoint>,
    pub size: f64,
}

impl VtRing {
    /// An empty ring carrying the size of `source`.
    pub fn sized_like(source: &VtRing) -> Self {
        Self {
            points: Vec::new(),
            size: source.size,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum VtGeometry {
    /// Points and multi-points
    Point(Vec<VtPoint>),
    LineString(VtRing),
    MultiLineString(Vec<VtRing>),
    Polygon(Vec<VtRing>),
    MultiPolygon(Vec<Vec<VtRing>>),
}

impl VtGeometry {
    fn for_each_point(&self, mut f: impl FnMut(&VtPoint)) {
        match self {
            VtGeometry::Point(points) => points.iter().for_each(&mut f),
            VtGeometry::LineString(ring) => ring.points.iter().for_each(&mut f),
            VtGeometry::MultiLineString(rings) | VtGeometry::Polygon(rings) => rings
                .iter()
                .flat_map(|ring| ring.points.iter())
                .for_each(&mut f),
            VtGeometry::MultiPolygon(polygons) => polygons
                .iter()
                .flatten()
                .flat_map(|ring| ring.points.iter())
                .for_each(&mut f),
        }
    }

    /// Returns a copy with every x shifted by `offset`.
    pub fn shifted(&self, offset: f64) -> VtGeometry {
        let shift_points = |points: &[VtPoint]| -> Vec<VtPoint> {
            points
                .iter()
                .map(|p| VtPoint::new(p.x + offset, p.y, p.z))
                .collect()
        };
        let shift_ring = |ring: &VtRing| VtRing {
            points: shift_points(&ring.points),
            size: ring.size,
        };
        match self {
            VtGeometry::Point(points) => VtGeometry::Point(shift_points(points)),
            VtGeometry::LineString(ring) => VtGeometry::LineString(shift_ring(ring)),
            VtGeometry::MultiLineString(rings) => {
                VtGeometry::MultiLineString(rings.iter().map(shift_ring).collect())
            }
            VtGeometry::Polygon(rings) => VtGeometry::Polygon(rings.iter().map(shift_ring).collect()),
            VtGeometry::MultiPolygon(polygons) => VtGeometry::MultiPolygon(
                polygons
                    .iter()
                    .map(|rings| rings.iter().map(shift_ring).collect())
                    .collect(),
            ),
        }
    }
}

/// A projected feature with its bounding box in unit space.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct VtFeature {
    pub id: Option<FeatureId>,
    pub geometry: VtGeometry,
    pub properties: Arc<Properties>,
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl VtFeature {
    pub fn new(id: Option<FeatureId>, geometry: VtGeometry, properties: Arc<Properties>) -> Self {
        let mut feature = VtFeature {
            id,
            geometry,
            properties,
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        let (mut min_x, mut min_y, mut max_x, mut max_y) =
            (feature.min_x, feature.min_y, feature.max_x, feature.max_y);
        feature.geometry.for_each_point(|p| {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        });
        feature.min_x = min_x;
        feature.min_y = min_y;
        feature.max_x = max_x;
        feature.max_y = max_y;
        feature
    }

    /// Returns a copy moved horizontally by whole worlds.
    pub fn shifted(&self, offset: f64) -> VtFeature {
        VtFeature::new(self.id, self.geometry.shifted(offset), Arc::clone(&self.properties))
    }
}
