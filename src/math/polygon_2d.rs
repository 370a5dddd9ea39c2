use super::{Point2, TOLERANCE};

/// Computes the signed area of a closed polyline (shoelace formula).
///
/// Positive for counter-clockwise, negative for clockwise.
#[must_use]
pub fn signed_area_2d(points: &[Point2]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..n {
        let j = (i + 1) % n;
        sum += points[i].x * points[j].y - points[j].x * points[i].y;
    }
    sum * 0.5
}

/// Counts crossings of the ray `+x` from `point` with a closed polyline.
fn crossings(point: &Point2, polygon: &[Point2]) -> usize {
    let n = polygon.len();
    let mut count = 0;
    for i in 0..n {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        if (a.y > point.y) != (b.y > point.y) {
            let x = a.x + (point.y - a.y) / (b.y - a.y) * (b.x - a.x);
            if x > point.x {
                count += 1;
            }
        }
    }
    count
}

/// Even-odd containment test of a point against a set of closed loops.
///
/// The loops together describe one region: an outer boundary and its holes.
#[must_use]
pub fn point_in_loops(point: &Point2, loops: &[Vec<Point2>]) -> bool {
    let total: usize = loops.iter().map(|l| crossings(point, l)).sum();
    total % 2 == 1
}

/// Even-odd containment test against a single closed polyline.
#[must_use]
pub fn point_in_polygon_2d(point: &Point2, polygon: &[Point2]) -> bool {
    crossings(point, polygon) % 2 == 1
}

/// Distance from a point to the segment `[a, b]`.
#[must_use]
pub fn distance_to_segment(point: &Point2, a: &Point2, b: &Point2) -> f64 {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        return (point - a).norm();
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    (point - (a + ab * t)).norm()
}

/// Scanline bands searched for inner points, widest first.
const MAX_BANDS: usize = 16;

/// Distance from `point` to the nearest edge of `loops`.
fn clearance(point: &Point2, loops: &[Vec<Point2>]) -> f64 {
    let mut best = f64::INFINITY;
    for lp in loops {
        let n = lp.len();
        for i in 0..n {
            best = best.min(distance_to_segment(point, &lp[i], &lp[(i + 1) % n]));
        }
    }
    best
}

/// Points strictly inside the region bounded by `loops`, best first.
///
/// Scanlines run halfway between consecutive distinct vertex heights, so
/// they never pass through a vertex or along a horizontal edge. Each inside
/// span gives its middle as a candidate; candidates are ranked by their
/// distance to the loops and those within [`TOLERANCE`] of an edge are
/// dropped.
#[must_use]
pub fn interior_points(loops: &[Vec<Point2>]) -> Vec<Point2> {
    let mut ys: Vec<f64> = loops.iter().flatten().map(|p| p.y).collect();
    ys.sort_by(f64::total_cmp);
    ys.dedup_by(|b, a| *b - *a <= TOLERANCE);
    let mut bands: Vec<(f64, f64)> = ys.windows(2).map(|w| (w[0], w[1])).collect();
    bands.sort_by(|a, b| (b.1 - b.0).total_cmp(&(a.1 - a.0)));
    bands.truncate(MAX_BANDS);

    let mut candidates: Vec<(f64, Point2)> = Vec::new();
    for (lo, hi) in bands {
        let y = 0.5 * (lo + hi);
        let mut xs = Vec::new();
        for lp in loops {
            let n = lp.len();
            for i in 0..n {
                let a = lp[i];
                let b = lp[(i + 1) % n];
                if (a.y > y) != (b.y > y) {
                    xs.push(a.x + (y - a.y) / (b.y - a.y) * (b.x - a.x));
                }
            }
        }
        xs.sort_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            let p = Point2::new(0.5 * (pair[0] + pair[1]), y);
            let gap = clearance(&p, loops);
            if gap > TOLERANCE {
                candidates.push((gap, p));
            }
        }
    }
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.into_iter().map(|(_, p)| p).collect()
}

/// The point of [`interior_points`] farthest from the loops.
#[must_use]
pub fn interior_point(loops: &[Vec<Point2>]) -> Option<Point2> {
    interior_points(loops).into_iter().next()
}
