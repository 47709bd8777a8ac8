//! Axis-aligned clipping of projected features.
//!
//! Features are clipped to the stripe `k1 <= coord < k2` along one axis.
//! Lines leaving the stripe are split into parts, polygon rings are closed
//! along the stripe edges. Intersection points get importance 1 so they
//! survive every simplification pass.

use std::mem;

use super::projected::{VtFeature, VtGeometry, VtPoint, VtRing};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Axis {
    X,
    Y,
}

impl Axis {
    fn of(&self, point: &VtPoint) -> f64 {
        match self {
            Axis::X => point.x,
            Axis::Y => point.y,
        }
    }

    fn bounds(&self, feature: &VtFeature) -> (f64, f64) {
        match self {
            Axis::X => (feature.min_x, feature.max_x),
            Axis::Y => (feature.min_y, feature.max_y),
        }
    }

    /// Point where segment `a`-`b` crosses the line `coord == k`.
    fn intersect(&self, a: &VtPoint, b: &VtPoint, k: f64) -> VtPoint {
        match self {
            Axis::X => {
                let t = (k - a.x) / (b.x - a.x);
                VtPoint::new(k, a.y + (b.y - a.y) * t, 1.0)
            }
            Axis::Y => {
                let t = (k - a.y) / (b.y - a.y);
                VtPoint::new(a.x + (b.x - a.x) * t, k, 1.0)
            }
        }
    }
}

/// Clips `features` to `[k1, k2)` along `axis`, with both bounds given in
/// tiles of the zoom whose tile count per axis is `scale`.
///
/// `min_all` and `max_all` bound every feature on the axis and let whole
/// feature sets be accepted or rejected without looking at them.
pub(crate) fn clip(
    features: &[VtFeature],
    scale: f64,
    k1: f64,
    k2: f64,
    axis: Axis,
    min_all: f64,
    max_all: f64,
) -> Vec<VtFeature> {
    let k1 = k1 / scale;
    let k2 = k2 / scale;

    if min_all >= k1 && max_all < k2 {
        return features.to_vec();
    }
    if max_all < k1 || min_all >= k2 {
        return Vec::new();
    }

    let mut clipped = Vec::new();
    for feature in features {
        let (min, max) = axis.bounds(feature);
        if min >= k1 && max < k2 {
            clipped.push(feature.clone());
            continue;
        }
        if max < k1 || min >= k2 {
            continue;
        }

        let geometry = match &feature.geometry {
            VtGeometry::Point(points) => {
                let kept: Vec<VtPoint> = points
                    .iter()
                    .filter(|p| {
                        let a = axis.of(p);
                        a >= k1 && a <= k2
                    })
                    .copied()
                    .collect();
                (!kept.is_empty()).then_some(VtGeometry::Point(kept))
            }
            VtGeometry::LineString(ring) => {
                let mut parts = Vec::new();
                clip_line(ring, &mut parts, k1, k2, axis, false);
                line_parts(parts)
            }
            VtGeometry::MultiLineString(rings) => {
                let mut parts = Vec::new();
                for ring in rings {
                    clip_line(ring, &mut parts, k1, k2, axis, false);
                }
                line_parts(parts)
            }
            VtGeometry::Polygon(rings) => {
                let clipped_rings = clip_rings(rings, k1, k2, axis);
                (!clipped_rings.is_empty()).then_some(VtGeometry::Polygon(clipped_rings))
            }
            VtGeometry::MultiPolygon(polygons) => {
                let kept: Vec<Vec<VtRing>> = polygons
                    .iter()
                    .map(|rings| clip_rings(rings, k1, k2, axis))
                    .filter(|rings| !rings.is_empty())
                    .collect();
                (!kept.is_empty()).then_some(VtGeometry::MultiPolygon(kept))
            }
        };

        if let Some(geometry) = geometry {
            clipped.push(VtFeature::new(feature.id, geometry, feature.properties.clone()));
        }
    }
    clipped
}

fn line_parts(mut parts: Vec<VtRing>) -> Option<VtGeometry> {
    match parts.len() {
        0 => None,
        1 => parts.pop().map(VtGeometry::LineString),
        _ => Some(VtGeometry::MultiLineString(parts)),
    }
}

fn clip_rings(rings: &[VtRing], k1: f64, k2: f64, axis: Axis) -> Vec<VtRing> {
    let mut out = Vec::new();
    for ring in rings {
        clip_line(ring, &mut out, k1, k2, axis, true);
    }
    out
}

fn clip_line(ring: &VtRing, out: &mut Vec<VtRing>, k1: f64, k2: f64, axis: Axis, is_polygon: bool) {
    let points = &ring.points;
    let Some(last) = points.last() else {
        return;
    };
    let mut slice = VtRing::sized_like(ring);

    for pair in points.windows(2) {
        let (pa, pb) = (&pair[0], &pair[1]);
        let a = axis.of(pa);
        let b = axis.of(pb);
        let mut exited = false;

        if a < k1 {
            // ---|-->  |
            if b > k1 {
                slice.points.push(axis.intersect(pa, pb, k1));
            }
        } else if a > k2 {
            // |  <--|---
            if b < k2 {
                slice.points.push(axis.intersect(pa, pb, k2));
            }
        } else {
            slice.points.push(*pa);
        }
        if b < k1 && a >= k1 {
            // <--|---  |
            slice.points.push(axis.intersect(pa, pb, k1));
            exited = true;
        }
        if b > k2 && a <= k2 {
            // |  ---|-->
            slice.points.push(axis.intersect(pa, pb, k2));
            exited = true;
        }

        if !is_polygon && exited {
            out.push(mem::replace(&mut slice, VtRing::sized_like(ring)));
        }
    }

    let a = axis.of(last);
    if a >= k1 && a <= k2 {
        slice.points.push(*last);
    }

    // close the ring if clipping opened it
    if is_polygon && slice.points.len() >= 2 {
        let first = slice.points[0];
        let end = slice.points[slice.points.len() - 1];
        if first.x != end.x || first.y != end.y {
            slice.points.push(first);
        }
    }

    if !slice.points.is_empty() {
        out.push(slice);
    }
}
