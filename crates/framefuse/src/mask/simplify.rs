//! Collinear-run removal and the two Ramer–Douglas–Peucker variants.

use crate::geometry::{
    glue, remove_consecutive_duplicates, segment_angle, Glue, Point, Polygon,
};

/// Relative comparison used for segment angles.
#[inline]
fn fuzzy_angle_eq(a: f64, b: f64) -> bool {
    (a - b).abs() * 1e12 <= a.abs().min(b.abs())
}

/// Remove points that do not change the overall shape: interior points lying
/// on a straight run of consecutive edges sharing the same direction.
///
/// Closed polygons stay closed; the wrap-around edge participates in the
/// collinearity check so a redundant closing point is dropped too.
pub fn simplify_polygon(poly: &[Point]) -> Polygon {
    if poly.len() < 3 {
        return poly.to_vec();
    }

    let mut res: Polygon = vec![poly[0]];
    let mut angle = 0.0;
    let mut i = 1;
    while i < poly.len() - 1 {
        if poly[i] == poly[i - 1] {
            i += 1;
            continue;
        }
        angle = segment_angle(poly[i - 1], poly[i]);
        let mut new_angle = 0.0;
        while i < poly.len() - 1 {
            new_angle = segment_angle(poly[i], poly[i + 1]);
            if !fuzzy_angle_eq(new_angle, angle) {
                break;
            }
            i += 1;
        }
        if i < poly.len() {
            res.push(poly[i]);
            angle = new_angle;
        }
        i += 1;
    }

    let last = poly[poly.len() - 1];
    let closing_angle = if poly[0] == last {
        segment_angle(poly[poly.len() - 2], last)
    } else {
        segment_angle(last, poly[0])
    };
    if *res.last().expect("result holds the first point") != last
        && !fuzzy_angle_eq(closing_angle, angle)
    {
        res.push(last);
    }

    res
}

// ── Expansion-only RDP ─────────────────────────────────────────────────────

/// Signed distance of each point to the chord `start -> end`; when the chord
/// is degenerate, plain Euclidean distances to `start`.
fn line_dists(points: &[Point], start: Point, end: Point) -> Vec<f64> {
    if start == end {
        return points
            .iter()
            .map(|p| {
                let dx = p[0] - start[0];
                let dy = p[1] - start[1];
                (dx * dx + dy * dy).sqrt()
            })
            .collect();
    }

    let vec = [start[0] - end[0], start[1] - end[1]];
    let norm = (vec[0] * vec[0] + vec[1] * vec[1]).sqrt();
    points
        .iter()
        .map(|p| {
            let diff = [start[0] - p[0], start[1] - p[1]];
            (vec[0] * diff[1] - vec[1] * diff[0]) / norm
        })
        .collect()
}

fn max_index_abs(v: &[f64]) -> usize {
    let mut max = v[0].abs();
    let mut index = 0;
    for (i, x) in v.iter().enumerate().skip(1) {
        if x.abs() > max {
            max = x.abs();
            index = i;
        }
    }
    index
}

fn argmin(v: &[f64]) -> usize {
    let mut min = v[0];
    let mut index = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x < min {
            min = x;
            index = i;
        }
    }
    index
}

/// Recursive expansion-only RDP over an open point run.
///
/// Unlike classical RDP, a run whose points all sit within `epsilon` of the
/// chord is not replaced by the raw chord: the chord is translated parallel
/// to itself through the farthest point on the negative-distance side, so
/// the simplified outline never cuts into the traced region.
fn rdp_open(points: &[Point], epsilon: f64) -> Polygon {
    let start = points[0];
    let end = points[points.len() - 1];
    let dists = line_dists(points, start, end);

    let index = max_index_abs(&dists);
    let dmax = dists[index].abs();

    if dmax > epsilon {
        let result1 = rdp_open(&points[..=index], epsilon);
        let result2 = rdp_open(&points[index..], epsilon);
        let gl = glue(
            (result1[result1.len() - 2], result1[result1.len() - 1]),
            (result2[0], result2[1]),
        );
        let mut result: Polygon = result1[..result1.len() - 1].to_vec();
        match gl {
            Glue::Point(p) => result.push(p),
            Glue::Segment(p, q) => {
                result.push(p);
                result.push(q);
            }
        }
        result.extend_from_slice(&result2[1..]);
        result
    } else {
        let mut new_start = start;
        let mut new_end = end;
        let vec = [end[0] - start[0], end[1] - start[1]];
        let norm = (vec[0] * vec[0] + vec[1] * vec[1]).sqrt();
        if norm != 0.0 {
            let index_min = argmin(&dists);
            let dmin = -dists[index_min];
            if dmin > 0.0 {
                let rot90 = [-vec[1] / norm * dmin, vec[0] / norm * dmin];
                new_start = [start[0] + rot90[0], start[1] + rot90[1]];
                new_end = [end[0] + rot90[0], end[1] + rot90[1]];
            }
        }
        vec![new_start, new_end]
    }
}

/// Simplify a polygon with the expansion-only Ramer–Douglas–Peucker variant.
///
/// The result is closed: the first and last simplified segments are glued
/// back together, falling back to a plain connecting edge when the glue
/// system is singular (parallel end segments). That fallback can produce a
/// visible kink on pathological outlines and is kept as-is since mask
/// consumers depend on the exact output.
pub fn rdp_simplify(points: &[Point], epsilon: f64) -> Polygon {
    if points.len() < 3 {
        return points.to_vec();
    }

    let new_points = rdp_open(points, epsilon);
    let gl = glue(
        (
            new_points[new_points.len() - 2],
            new_points[new_points.len() - 1],
        ),
        (new_points[0], new_points[1]),
    );
    match gl {
        Glue::Point(p) => {
            let mut res: Polygon = vec![p];
            res.extend_from_slice(&new_points[1..new_points.len() - 1]);
            res.push(p);
            res
        }
        Glue::Segment(..) => {
            let mut res = new_points;
            res.push(res[0]);
            res
        }
    }
}

// ── Point-budget RDP ───────────────────────────────────────────────────────

fn dist_squared(p1: Point, p2: Point) -> f64 {
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    dx * dx + dy * dy
}

fn segment_ratio(s1: Point, s2: Point, point: Point) -> f64 {
    let len_sq = dist_squared(s1, s2);
    if len_sq == 0.0 {
        return dist_squared(point, s1);
    }
    ((point[0] - s1[0]) * (s2[0] - s1[0]) + (point[1] - s1[1]) * (s2[1] - s1[1])) / len_sq
}

fn distance_to_squared(s1: Point, s2: Point, point: Point) -> f64 {
    let t = segment_ratio(s1, s2, point);
    if t < 0.0 {
        return dist_squared(point, s1);
    }
    if t > 1.0 {
        return dist_squared(point, s2);
    }
    dist_squared(
        point,
        [s1[0] + t * (s2[0] - s1[0]), s1[1] + t * (s2[1] - s1[1])],
    )
}

/// Assign each interior point the maximum squared deviation observed within
/// its recursive partition.
fn douglas_peucker(start: usize, end: usize, points: &[Point], weights: &mut [f64]) {
    if end > start + 1 {
        let mut max_dist = -1.0;
        let mut max_dist_index = 0;
        for i in start + 1..end {
            let dist = distance_to_squared(points[start], points[end], points[i]);
            if dist > max_dist {
                max_dist = dist;
                max_dist_index = i;
            }
        }
        weights[max_dist_index] = max_dist;

        douglas_peucker(start, max_dist_index, points, weights);
        douglas_peucker(max_dist_index, end, points, weights);
    }
}

/// Classical RDP driven by a target point budget instead of an epsilon.
///
/// Keeps exactly `min(max_points, n)` points of the deduplicated input,
/// endpoints always included (their weight is forced to infinity).
pub fn rdp_simplify_budget(points: &[Point], max_points: usize) -> Polygon {
    let points = remove_consecutive_duplicates(points);
    if max_points == 0 || points.is_empty() {
        return Polygon::new();
    }
    if points.len() <= max_points {
        return points;
    }

    let mut weights = vec![0.0f64; points.len()];
    douglas_peucker(0, points.len() - 1, &points, &mut weights);
    weights[0] = f64::INFINITY;
    *weights.last_mut().expect("non-empty") = f64::INFINITY;

    let mut sorted = weights.clone();
    sorted.sort_by(|a, b| a.partial_cmp(b).expect("weights are not NaN"));
    let threshold = sorted[sorted.len() - max_points];

    // Equal weights are resolved left to right so the output size is exact.
    let above = weights.iter().filter(|&&w| w > threshold).count();
    let mut ties_left = max_points - above;
    let mut res = Polygon::with_capacity(max_points);
    for (i, &w) in weights.iter().enumerate() {
        if w > threshold {
            res.push(points[i]);
        } else if w == threshold && ties_left > 0 {
            res.push(points[i]);
            ties_left -= 1;
        }
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{close_polygon, distance_to_segment, is_clockwise, signed_area};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn simplify_removes_collinear_runs() {
        let p = vec![
            [0.0, 0.0],
            [1.0, 0.0],
            [2.0, 0.0],
            [4.0, 0.0],
            [4.0, 2.0],
            [4.0, 4.0],
            [0.0, 4.0],
        ];
        let s = simplify_polygon(&p);
        assert_eq!(s, vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
    }

    #[test]
    fn simplify_handles_closed_polygons() {
        let p = vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 4.0],
            [0.0, 4.0],
            [0.0, 2.0],
            [0.0, 0.0],
        ];
        let s = simplify_polygon(&p);
        // The run through the closing edge is collapsed.
        assert!(!s.contains(&[0.0, 2.0]));
        assert_eq!(s[0], [0.0, 0.0]);
    }

    #[test]
    fn rdp_zero_epsilon_keeps_non_collinear_points() {
        let p = vec![
            [0.0, 0.0],
            [0.0, 2.0],
            [0.0, 4.0],
            [4.0, 4.0],
            [4.0, 0.0],
        ];
        assert!(is_clockwise(&p));
        let s = rdp_simplify(&p, 0.0);
        assert_eq!(s.first(), s.last(), "result must be closed");
        for corner in [[0.0, 0.0], [0.0, 4.0], [4.0, 4.0], [4.0, 0.0]] {
            assert!(
                s.iter().any(|q| dist_squared(*q, corner) < 1e-18),
                "missing corner {:?} in {:?}",
                corner,
                s
            );
        }
        assert!(!s.contains(&[0.0, 2.0]));
    }

    /// Even-odd point-in-polygon with boundary slack.
    fn inside_buffered(pt: Point, poly: &[Point], buffer: f64) -> bool {
        let closed = close_polygon(poly);
        for w in closed.windows(2) {
            if distance_to_segment(pt, w[0], w[1]) <= buffer {
                return true;
            }
        }
        let mut inside = false;
        for w in closed.windows(2) {
            let (a, b) = (w[0], w[1]);
            if (a[1] <= pt[1]) != (b[1] <= pt[1]) {
                let x = a[0] + (pt[1] - a[1]) / (b[1] - a[1]) * (b[0] - a[0]);
                if x > pt[0] {
                    inside = !inside;
                }
            }
        }
        inside
    }

    #[test]
    fn rdp_is_expansion_only_for_clockwise_outlines() {
        let mut rng = StdRng::seed_from_u64(0xd0_0d);
        for _ in 0..30 {
            // Random star polygon around the origin, wound clockwise
            // (negative shoelace sum), the orientation the algorithm assumes.
            let n = rng.random_range(6..24);
            let mut p: Polygon = (0..n)
                .map(|i| {
                    let a = -(i as f64) * 2.0 * std::f64::consts::PI / n as f64;
                    let r = rng.random_range(2.0..6.0);
                    [r * a.cos(), r * a.sin()]
                })
                .collect();
            if signed_area(&p) > 0.0 {
                p.reverse();
            }
            let epsilon = rng.random_range(0.0..1.5);
            let s = rdp_simplify(&p, epsilon);
            assert!(s.len() >= 3);
            for q in &p {
                assert!(
                    inside_buffered(*q, &s, epsilon + 1e-9),
                    "point {:?} escapes simplification (eps {})",
                    q,
                    epsilon
                );
            }
        }
    }

    #[test]
    fn budget_rdp_returns_exact_count_with_endpoints() {
        let mut rng = StdRng::seed_from_u64(42);
        let p: Polygon = (0..50)
            .map(|i| [i as f64, rng.random_range(-3.0..3.0)])
            .collect();
        for k in [2usize, 5, 10, 49, 50, 80] {
            let s = rdp_simplify_budget(&p, k);
            assert_eq!(s.len(), k.min(p.len()));
            assert_eq!(s[0], p[0]);
            assert_eq!(s.last(), p.last());
        }
    }

    #[test]
    fn budget_rdp_prefers_high_deviation_points() {
        let p = vec![
            [0.0, 0.0],
            [1.0, 0.01],
            [2.0, 5.0],
            [3.0, -0.01],
            [4.0, 0.0],
        ];
        let s = rdp_simplify_budget(&p, 3);
        assert_eq!(s, vec![[0.0, 0.0], [2.0, 5.0], [4.0, 0.0]]);
    }
}
