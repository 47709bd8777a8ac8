use super::projected::VtPoint;

/// Douglas-Peucker importance ranking.
///
/// Marks the point between `first` and `last` farthest from their segment
/// with its squared distance, then recurses into both halves. Points whose
/// distance never exceeds `sq_tolerance` keep importance 0.
pub(crate) fn simplify(points: &mut [VtPoint], first: usize, last: usize, sq_tolerance: f64) {
    let mut max_sq_dist = sq_tolerance;
    let mid = first + (last - first) / 2;
    let mut min_pos_to_mid = last - first;
    let mut index = None;

    let a = points[first];
    let b = points[last];

    for i in first + 1..last {
        let d = sq_seg_dist(points[i], a, b);
        if d > max_sq_dist {
            index = Some(i);
            max_sq_dist = d;
        } else if d == max_sq_dist {
            // prefer the point closest to the middle on ties
            let pos_to_mid = i.abs_diff(mid);
            if pos_to_mid < min_pos_to_mid {
                index = Some(i);
                min_pos_to_mid = pos_to_mid;
            }
        }
    }

    if max_sq_dist > sq_tolerance {
        if let Some(index) = index {
            if index - first > 1 {
                simplify(points, first, index, sq_tolerance);
            }
            points[index].z = max_sq_dist;
            if last - index > 1 {
                simplify(points, index, last, sq_tolerance);
            }
        }
    }
}

/// Squared distance from `p` to the segment `a`-`b`.
fn sq_seg_dist(p: VtPoint, a: VtPoint, b: VtPoint) -> f64 {
    let (mut x, mut y) = (a.x, a.y);
    let mut dx = b.x - x;
    let mut dy = b.y - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.x - x) * dx + (p.y - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.x;
            y = b.y;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    dx = p.x - x;
    dy = p.y - y;
    dx * dx + dy * dy
}
