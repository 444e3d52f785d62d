//! Polygon interpolation for shape morphing.
//!
//! Produces an intermediate polygon between two outlines for a blend factor
//! in `[0, 1]`. The non-degenerate path matches the closest vertex pair,
//! aligns winding and centers, and resamples both outlines onto a shared
//! arclength parameterization so the blend stays perceptually smooth even
//! when the two polygons have very different point densities. A plain
//! ratio-based vertex lerp tends to twist incompatible polygons instead.

use crate::geometry::{
    bounding_rect, is_clockwise, is_rect, remove_consecutive_duplicates, reorder_polygon,
    segment_length, Point, Polygon,
};
use crate::series::{extract_times, ResamplePolicy};

/// Piecewise-linear resample of a polyline at the parameter values `times`.
///
/// `sample_x` carries the monotonic parameter of each point in `sample_y`.
/// Out-of-range targets repeat the boundary points.
fn resample_polyline(sample_x: &[f64], sample_y: &[Point], times: &[f64]) -> Polygon {
    let size = sample_x.len();
    let mut it = 0usize;
    let mut res = Polygon::with_capacity(times.len());

    let lerp = |a: Point, b: Point, factor: f64| -> Point {
        [
            b[0] * factor + (1.0 - factor) * a[0],
            b[1] * factor + (1.0 - factor) * a[1],
        ]
    };

    for &time in times {
        if it == size {
            res.push(sample_y[size - 1]);
            continue;
        }

        let sx = sample_x[it];
        if time == sx {
            res.push(sample_y[it]);
            it += 1;
        } else if time < sx {
            if it == 0 {
                res.push(sample_y[it]);
            } else {
                let factor = (time - sample_x[it - 1]) / (sx - sample_x[it - 1]);
                res.push(lerp(sample_y[it - 1], sample_y[it], factor));
            }
        } else {
            while it < size && sample_x[it] < time {
                it += 1;
            }
            if it < size {
                if sample_x[it] == time {
                    res.push(sample_y[it]);
                } else {
                    let factor =
                        (time - sample_x[it - 1]) / (sample_x[it] - sample_x[it - 1]);
                    res.push(lerp(sample_y[it - 1], sample_y[it], factor));
                }
            } else {
                res.push(sample_y[size - 1]);
            }
        }
    }
    res
}

/// Cumulative arclength of a polyline, normalized to `[0, 1]`.
fn normalized_arclength(poly: &[Point]) -> Vec<f64> {
    let mut total = 0.0;
    for w in poly.windows(2) {
        total += segment_length(w[0], w[1]);
    }
    let mut res = Vec::with_capacity(poly.len());
    res.push(0.0);
    let mut cum = 0.0;
    for w in poly.windows(2) {
        cum += segment_length(w[0], w[1]);
        res.push(cum / total);
    }
    res
}

/// Interpolate two polygons by the blend factor `advance` in `[0, 1]`.
///
/// `advance <= 0` returns `p1` unchanged and `advance >= 1` returns `p2`
/// unchanged. Single-point and rectangle inputs take cheap exact paths; the
/// general case resamples both polygons onto a merged arclength base, so the
/// result never exceeds `p1.len() + p2.len() - 2` points.
pub fn interpolate_polygons(p1: &[Point], p2: &[Point], advance: f64) -> Polygon {
    if advance >= 1.0 {
        return p2.to_vec();
    }
    if advance <= 0.0 {
        return p1.to_vec();
    }
    if p1.is_empty() || p2.is_empty() {
        return if advance < 0.5 { p1.to_vec() } else { p2.to_vec() };
    }

    let lerp = |a: Point, b: Point| -> Point {
        [
            a[0] * (1.0 - advance) + b[0] * advance,
            a[1] * (1.0 - advance) + b[1] * advance,
        ]
    };

    // Two axis-aligned rectangles interpolate corner by corner.
    if let (Some(r1), Some(r2)) = (is_rect(p1), is_rect(p2)) {
        return r1
            .corners()
            .iter()
            .zip(r2.corners().iter())
            .map(|(&a, &b)| lerp(a, b))
            .collect();
    }

    let mut poly1 = remove_consecutive_duplicates(p1);
    let mut poly2 = remove_consecutive_duplicates(p2);

    // A single effective point pulls every point of the other polygon.
    if poly1.len() == 1 {
        let pt1 = p1[0];
        for q in poly2.iter_mut() {
            *q = lerp(pt1, *q);
        }
        return poly2;
    }
    if poly2.len() == 1 {
        let pt2 = p2[0];
        for q in poly1.iter_mut() {
            *q = lerp(*q, pt2);
        }
        return poly1;
    }

    if is_clockwise(&poly1) != is_clockwise(&poly2) {
        poly1.reverse();
    }

    // Move p2's bounding-box center onto p1's.
    let c1 = bounding_rect(p1).expect("p1 is non-empty").center();
    let c2 = bounding_rect(p2).expect("p2 is non-empty").center();
    let diff = [c2[0] - c1[0], c2[1] - c1[1]];
    for q in poly2.iter_mut() {
        q[0] -= diff[0];
        q[1] -= diff[1];
    }

    // The closest vertex pair becomes the common start point.
    let mut id1 = 0;
    let mut id2 = 0;
    let mut best = f64::MAX;
    for (i, a) in poly1.iter().enumerate() {
        for (j, b) in poly2.iter().enumerate() {
            let d = segment_length(*a, *b);
            if d < best {
                best = d;
                id1 = i;
                id2 = j;
            }
        }
    }
    let poly1 = reorder_polygon(&poly1, id1);
    let poly2 = reorder_polygon(&poly2, id2);

    // Shared arclength parameterization of both outlines.
    let len1 = normalized_arclength(&poly1);
    let len2 = normalized_arclength(&poly2);
    let merged = extract_times(&[&len1, &len2], ResamplePolicy::Union);

    let poly1 = resample_polyline(&len1, &poly1, &merged);
    let mut poly2 = resample_polyline(&len2, &poly2, &merged);

    // Move p2 back to its original center, then blend.
    for q in poly2.iter_mut() {
        q[0] += diff[0];
        q[1] += diff[1];
    }
    poly1
        .iter()
        .zip(poly2.iter())
        .map(|(&a, &b)| lerp(a, b))
        .collect()
}
