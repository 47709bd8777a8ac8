//! Short visiting order over a small point set.
//!
//! Farthest insertion: the path starts at the first point, then repeatedly
//! takes the unplaced point farthest from the path and inserts it where it
//! lengthens the closed tour the least. Runs in O(n²) time and space.

use crate::geometry::Coordinate;

/// Pairwise distances of normalized points.
struct DistanceMatrix {
    n: usize,
    values: Vec<f64>,
}

impl DistanceMatrix {
    fn new(points: &[Coordinate]) -> Self {
        let n = points.len();
        let mut values = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance(&points[j]);
                values[i * n + j] = d;
                values[j * n + i] = d;
            }
        }
        Self { n, values }
    }

    #[inline]
    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j]
    }
}

/// Scales x and y independently into `[0, 1]`. An axis without extent maps
/// to 0.
fn normalize(points: &[Coordinate]) -> Vec<Coordinate> {
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let scale = |v: f64, min: f64, max: f64| {
        let range = max - min;
        if range > 0.0 {
            (v - min) / range
        } else {
            0.0
        }
    };
    points
        .iter()
        .map(|p| Coordinate::new(scale(p.x, min_x, max_x), scale(p.y, min_y, max_y)))
        .collect()
}

/// Returns an approximately shortest visiting order of `points` as indexes
/// into `points`.
///
/// The result is a permutation of `0..points.len()` and only depends on the
/// input order. Inputs of at most two points come back unchanged. `hint` is
/// accepted for seeding the tour near a location but does not influence the
/// current heuristic.
pub fn approximate_tour(points: &[Coordinate], hint: Option<Coordinate>) -> Vec<usize> {
    let n = points.len();
    if n <= 2 {
        return (0..n).collect();
    }
    if let Some(hint) = hint {
        log::trace!("Building tour over {} points near {}", n, hint);
    }

    let dist = DistanceMatrix::new(&normalize(points));

    let mut path = Vec::with_capacity(n);
    path.push(0);
    let mut placed = vec![false; n];
    placed[0] = true;
    // distance of every point to the nearest placed point
    let mut nearest: Vec<f64> = (0..n).map(|i| dist.get(0, i)).collect();

    for _ in 1..n {
        let mut next = None;
        let mut farthest = f64::NEG_INFINITY;
        for i in 0..n {
            if !placed[i] && nearest[i] > farthest {
                farthest = nearest[i];
                next = Some(i);
            }
        }
        let Some(next) = next else {
            break;
        };

        // inserting on the closing edge appends to the path
        let mut best_pos = path.len();
        let last = path[path.len() - 1];
        let mut best_cost = dist.get(last, next) + dist.get(next, path[0]) - dist.get(last, path[0]);
        for i in 0..path.len() - 1 {
            let (a, b) = (path[i], path[i + 1]);
            let cost = dist.get(a, next) + dist.get(next, b) - dist.get(a, b);
            if cost < best_cost || (cost == best_cost && i + 1 < best_pos) {
                best_cost = cost;
                best_pos = i + 1;
            }
        }
        path.insert(best_pos, next);
        placed[next] = true;

        for i in 0..n {
            let d = dist.get(next, i);
            if d < nearest[i] {
                nearest[i] = d;
            }
        }
    }
    path
}
