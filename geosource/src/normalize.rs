//! Polygon winding normalization.
//!
//! Rings are rewound in place to the right-hand rule: exterior rings
//! counter-clockwise, holes clockwise, measured by signed area in
//! longitude/latitude space. Everything that is not a polygon is left alone.

use geojson::{GeoJson, Geometry, Position, Value};

/// Rewinds every polygon ring of the document. Idempotent and infallible.
pub fn normalize(doc: &mut GeoJson) {
    match doc {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features.iter_mut() {
                if let Some(geometry) = feature.geometry.as_mut() {
                    normalize_geometry(geometry);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry.as_mut() {
                normalize_geometry(geometry);
            }
        }
        GeoJson::Geometry(geometry) => normalize_geometry(geometry),
    }
}

fn normalize_geometry(geometry: &mut Geometry) {
    match &mut geometry.value {
        Value::Polygon(rings) => rewind_polygon(rings),
        Value::MultiPolygon(polygons) => polygons.iter_mut().for_each(|rings| rewind_polygon(rings)),
        Value::GeometryCollection(members) => members.iter_mut().for_each(normalize_geometry),
        _ => {}
    }
}

fn rewind_polygon(rings: &mut [Vec<Position>]) {
    for (i, ring) in rings.iter_mut().enumerate() {
        let area = signed_area(ring);
        let exterior = i == 0;
        // positive area is counter-clockwise
        if (exterior && area < 0.0) || (!exterior && area > 0.0) {
            ring.reverse();
        }
    }
}

/// Shoelace signed area; positive for counter-clockwise rings.
fn signed_area(ring: &[Position]) -> f64 {
    if ring.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (Some(a), Some(b)) = (xy(&ring[j]), xy(&ring[i])) else {
            return 0.0;
        };
        sum += (a.0 - b.0) * (a.1 + b.1);
        j = i;
    }
    sum / 2.0
}

fn xy(position: &Position) -> Option<(f64, f64)> {
    match position.as_slice() {
        [x, y, ..] => Some((*x, *y)),
        _ => None,
    }
}
