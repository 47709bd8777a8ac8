//! Projection of ingested features into the tile index's unit space.

use std::sync::Arc;

use crate::feature::{Feature, Geometry};
use crate::geometry::Coordinate;
use crate::projection::{project_x, project_y};

use super::projected::{VtFeature, VtGeometry, VtPoint, VtRing};
use super::simplify::simplify;
use super::TileOptions;

/// Projects features and ranks their vertices for simplification.
pub(crate) fn convert(features: &[Feature], options: &TileOptions) -> Vec<VtFeature> {
    let scale = (1u64 << options.max_zoom) as f64 * options.extent as f64;
    let sq_tolerance = (options.tolerance / scale).powi(2);

    features
        .iter()
        .map(|feature| {
            let geometry = convert_geometry(&feature.geometry, sq_tolerance);
            VtFeature::new(Some(feature.id), geometry, Arc::new(feature.properties.clone()))
        })
        .collect()
}

fn convert_geometry(geometry: &Geometry, sq_tolerance: f64) -> VtGeometry {
    match geometry {
        Geometry::Point(coord) => VtGeometry::Point(vec![project_point(coord)]),
        Geometry::MultiPoint(coords) => VtGeometry::Point(coords.iter().map(project_point).collect()),
        Geometry::LineString(coords) => {
            VtGeometry::LineString(convert_line(coords, sq_tolerance, false))
        }
        Geometry::MultiLineString(lines) => {
            VtGeometry::MultiLineString(convert_lines(lines, sq_tolerance, false))
        }
        Geometry::Polygon(rings) => VtGeometry::Polygon(convert_lines(rings, sq_tolerance, true)),
        Geometry::MultiPolygon(polygons) => VtGeometry::MultiPolygon(
            polygons
                .iter()
                .map(|rings| convert_lines(rings, sq_tolerance, true))
                .collect(),
        ),
    }
}

fn project_point(coord: &Coordinate) -> VtPoint {
    VtPoint::new(project_x(coord.x), project_y(coord.y), 0.0)
}

fn convert_lines(lines: &[Vec<Coordinate>], sq_tolerance: f64, is_polygon: bool) -> Vec<VtRing> {
    lines
        .iter()
        .map(|line| convert_line(line, sq_tolerance, is_polygon))
        .collect()
}

/// Projects one line or ring. Its size is the absolute area for rings and
/// the length for lines; both ends always survive simplification.
fn convert_line(coords: &[Coordinate], sq_tolerance: f64, is_polygon: bool) -> VtRing {
    let mut points: Vec<VtPoint> = coords.iter().map(project_point).collect();
    let mut size = 0.0;
    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if is_polygon {
            size += (a.x * b.y - b.x * a.y) / 2.0;
        } else {
            size += ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt();
        }
    }

    if let Some(last) = points.len().checked_sub(1) {
        points[0].z = 1.0;
        if last > 0 {
            simplify(&mut points, 0, last, sq_tolerance);
        }
        points[last].z = 1.0;
    }

    VtRing {
        points,
        size: size.abs(),
    }
}
