use super::clip::{clip, Axis};
use super::projected::VtFeature;
use super::TileOptions;

/// Copies features that spill over the antimeridian into the neighbouring
/// world, so that edge tiles see them within their buffer.
pub(crate) fn wrap(features: Vec<VtFeature>, options: &TileOptions) -> Vec<VtFeature> {
    let buffer = options.buffer as f64 / options.extent as f64;

    let left = clip(&features, 1.0, -1.0 - buffer, buffer, Axis::X, -1.0, 2.0);
    let right = clip(&features, 1.0, 1.0 - buffer, 2.0 + buffer, Axis::X, -1.0, 2.0);
    if left.is_empty() && right.is_empty() {
        return features;
    }

    let center = clip(&features, 1.0, -buffer, 1.0 + buffer, Axis::X, -1.0, 2.0);
    let mut merged: Vec<VtFeature> = left.iter().map(|f| f.shifted(1.0)).collect();
    merged.extend(center);
    merged.extend(right.iter().map(|f| f.shifted(-1.0)));
    merged
}
