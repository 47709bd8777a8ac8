//! Feature model shared by the indices, the tile encoder and the planner.
//!
//! Two shapes exist:
//! - [`Feature`] carries geometry in longitude/latitude degrees, as ingested.
//! - [`TileFeature`] carries geometry in integer tile coordinates, ready for
//!   vector tile encoding.

use geojson::{GeoJson, Position, Value};
use serde::Serialize;

use crate::errors::{GeoError, GeoResult};
use crate::geometry::Coordinate;

/// Identifier of a leaf feature or of a cluster.
pub type FeatureId = u64;

/// Feature properties. Keys are unique, values are arbitrary JSON.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Geometry of an ingested feature, in degrees.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    Point(Coordinate),
    MultiPoint(Vec<Coordinate>),
    LineString(Vec<Coordinate>),
    MultiLineString(Vec<Vec<Coordinate>>),
    /// Exterior ring first, then holes
    Polygon(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
}

impl Geometry {
    /// Returns the first coordinate of the geometry, if any.
    pub fn first_coordinate(&self) -> Option<Coordinate> {
        match self {
            Geometry::Point(coord) => Some(*coord),
            Geometry::MultiPoint(coords) | Geometry::LineString(coords) => coords.first().copied(),
            Geometry::MultiLineString(lines) | Geometry::Polygon(lines) => {
                lines.first().and_then(|line| line.first().copied())
            }
            Geometry::MultiPolygon(polygons) => polygons
                .first()
                .and_then(|rings| rings.first())
                .and_then(|ring| ring.first().copied()),
        }
    }

    /// Checks whether the geometry holds no coordinates at all.
    pub fn is_empty(&self) -> bool {
        self.first_coordinate().is_none()
    }

    fn to_value(&self) -> Value {
        fn pos(coord: &Coordinate) -> Position {
            vec![coord.x, coord.y]
        }
        fn line(coords: &[Coordinate]) -> Vec<Position> {
            coords.iter().map(pos).collect()
        }
        fn rings(rings: &[Vec<Coordinate>]) -> Vec<Vec<Position>> {
            rings.iter().map(|ring| line(ring)).collect()
        }

        match self {
            Geometry::Point(coord) => Value::Point(pos(coord)),
            Geometry::MultiPoint(coords) => Value::MultiPoint(line(coords)),
            Geometry::LineString(coords) => Value::LineString(line(coords)),
            Geometry::MultiLineString(lines) => Value::MultiLineString(rings(lines)),
            Geometry::Polygon(polygon) => Value::Polygon(rings(polygon)),
            Geometry::MultiPolygon(polygons) => {
                Value::MultiPolygon(polygons.iter().map(|p| rings(p)).collect())
            }
        }
    }
}

/// An ingested feature with its builder-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,
    pub geometry: Geometry,
    pub properties: Properties,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry, properties: Properties) -> Self {
        Self {
            id,
            geometry,
            properties,
        }
    }

    /// Returns the first coordinate of the feature geometry.
    pub fn first_coordinate(&self) -> Option<Coordinate> {
        self.geometry.first_coordinate()
    }

    /// Converts this feature back into a GeoJSON feature.
    pub fn to_geojson(&self) -> geojson::Feature {
        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(self.geometry.to_value())),
            id: Some(geojson::feature::Id::Number(self.id.into())),
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

/// Flattens a GeoJSON document into features.
///
/// Each input feature receives its zero-based position in the document as
/// identifier. Members of a geometry collection become separate features
/// sharing the identifier and properties of their parent. Features without a
/// geometry, or with an empty one, are skipped.
///
/// # Errors
///
/// Returns `BuildFailed` for non-finite coordinates, positions with fewer
/// than two values, lines with fewer than 2 positions and polygon rings with
/// fewer than 4 positions.
pub fn features_from_geojson(doc: &GeoJson) -> GeoResult<Vec<Feature>> {
    let mut features = Vec::new();
    match doc {
        GeoJson::FeatureCollection(collection) => {
            for (index, feature) in collection.features.iter().enumerate() {
                push_feature(&mut features, index as FeatureId, feature)?;
            }
        }
        GeoJson::Feature(feature) => push_feature(&mut features, 0, feature)?,
        GeoJson::Geometry(geometry) => {
            push_geometry(&mut features, 0, &geometry.value, &Properties::new())?
        }
    }
    Ok(features)
}

fn push_feature(
    out: &mut Vec<Feature>,
    id: FeatureId,
    feature: &geojson::Feature,
) -> GeoResult<()> {
    let Some(geometry) = &feature.geometry else {
        return Ok(());
    };
    let properties = feature.properties.clone().unwrap_or_default();
    push_geometry(out, id, &geometry.value, &properties)
}

fn push_geometry(
    out: &mut Vec<Feature>,
    id: FeatureId,
    value: &Value,
    properties: &Properties,
) -> GeoResult<()> {
    let geometry = match value {
        Value::Point(position) => Geometry::Point(coordinate(position)?),
        Value::MultiPoint(positions) => Geometry::MultiPoint(coordinates(positions)?),
        Value::LineString(positions) => Geometry::LineString(line(positions)?),
        Value::MultiLineString(lines) => {
            Geometry::MultiLineString(lines.iter().map(|l| line(l)).collect::<GeoResult<_>>()?)
        }
        Value::Polygon(rings) => Geometry::Polygon(polygon(rings)?),
        Value::MultiPolygon(polygons) => Geometry::MultiPolygon(
            polygons.iter().map(|p| polygon(p)).collect::<GeoResult<_>>()?,
        ),
        Value::GeometryCollection(members) => {
            for member in members {
                push_geometry(out, id, &member.value, properties)?;
            }
            return Ok(());
        }
    };

    if !geometry.is_empty() {
        out.push(Feature::new(id, geometry, properties.clone()));
    }
    Ok(())
}

fn coordinate(position: &Position) -> GeoResult<Coordinate> {
    if position.len() < 2 {
        return Err(GeoError::BuildFailed(format!(
            "Position requires at least 2 values, got {}",
            position.len()
        )));
    }
    let coord = Coordinate::new(position[0], position[1]);
    if !coord.is_finite() {
        return Err(GeoError::BuildFailed(format!("Non-finite coordinate {}", coord)));
    }
    Ok(coord)
}

fn coordinates(positions: &[Position]) -> GeoResult<Vec<Coordinate>> {
    positions.iter().map(coordinate).collect()
}

fn line(positions: &[Position]) -> GeoResult<Vec<Coordinate>> {
    if positions.len() < 2 {
        return Err(GeoError::BuildFailed(
            "LineString requires at least 2 positions".to_string(),
        ));
    }
    coordinates(positions)
}

fn polygon(rings: &[Vec<Position>]) -> GeoResult<Vec<Vec<Coordinate>>> {
    rings
        .iter()
        .map(|ring| {
            if ring.len() < 4 {
                return Err(GeoError::BuildFailed(
                    "Polygon ring requires at least 4 positions".to_string(),
                ));
            }
            coordinates(ring)
        })
        .collect()
}

/// A point in integer tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TilePoint {
    pub x: i32,
    pub y: i32,
}

impl TilePoint {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Geometry of a tile feature, grouped the way vector tiles encode it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum TileGeometry {
    /// One or more points
    Point(Vec<TilePoint>),
    /// One or more line parts
    LineString(Vec<Vec<TilePoint>>),
    /// Rings of one or more polygons; exterior rings are clockwise on screen
    Polygon(Vec<Vec<TilePoint>>),
}

impl TileGeometry {
    pub fn is_empty(&self) -> bool {
        match self {
            TileGeometry::Point(points) => points.is_empty(),
            TileGeometry::LineString(parts) | TileGeometry::Polygon(parts) => {
                parts.iter().all(|part| part.is_empty())
            }
        }
    }
}

/// A feature clipped to one tile, in tile coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileFeature {
    pub id: Option<FeatureId>,
    pub geometry: TileGeometry,
    pub properties: Properties,
}

impl TileFeature {
    /// Converts this feature into a GeoJSON feature whose positions are the
    /// integer tile coordinates.
    ///
    /// Single parts become `Point` / `LineString` / `Polygon`, several parts
    /// their multi counterparts. Polygon rings are grouped per exterior ring
    /// using the winding of each ring.
    pub fn to_geojson(&self) -> geojson::Feature {
        fn pos(point: &TilePoint) -> Position {
            vec![f64::from(point.x), f64::from(point.y)]
        }
        fn line(points: &[TilePoint]) -> Vec<Position> {
            points.iter().map(pos).collect()
        }

        let value = match &self.geometry {
            TileGeometry::Point(points) => match points.as_slice() {
                [single] => Value::Point(pos(single)),
                _ => Value::MultiPoint(line(points)),
            },
            TileGeometry::LineString(parts) => match parts.as_slice() {
                [single] => Value::LineString(line(single)),
                _ => Value::MultiLineString(parts.iter().map(|p| line(p)).collect()),
            },
            TileGeometry::Polygon(rings) => {
                let mut polygons: Vec<Vec<Vec<Position>>> = Vec::new();
                for ring in rings {
                    // exterior rings have a positive area in y-down space
                    if tile_ring_area(ring) > 0.0 || polygons.is_empty() {
                        polygons.push(vec![line(ring)]);
                    } else if let Some(polygon) = polygons.last_mut() {
                        polygon.push(line(ring));
                    }
                }
                if polygons.len() == 1 {
                    Value::Polygon(polygons.remove(0))
                } else {
                    Value::MultiPolygon(polygons)
                }
            }
        };

        geojson::Feature {
            bbox: None,
            geometry: Some(geojson::Geometry::new(value)),
            id: self.id.map(|id| geojson::feature::Id::Number(id.into())),
            properties: Some(self.properties.clone()),
            foreign_members: None,
        }
    }
}

fn tile_ring_area(ring: &[TilePoint]) -> f64 {
    let mut sum = 0.0;
    for (i, p) in ring.iter().enumerate() {
        let q = &ring[(i + 1) % ring.len()];
        sum += f64::from(p.x) * f64::from(q.y) - f64::from(q.x) * f64::from(p.y);
    }
    sum / 2.0
}
