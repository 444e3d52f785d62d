//! Convex hull (gift wrapping) and the combined convexity/simplicity test.

use super::{angle_between, segment_angle, tolerance_eq, Point, Polygon};

/// Convex hull of the given points by gift wrapping.
///
/// Wrapping starts at the bottom-most point (maximum y under the y-down
/// convention) and repeatedly picks the point with the smallest turn angle
/// from the current edge direction; turns within floating tolerance of zero
/// collapse collinear points into one. The result is open (the first point
/// is not repeated at the end).
pub fn convex_hull(poly: &[Point]) -> Polygon {
    if poly.len() < 3 {
        return poly.to_vec();
    }

    // Remove consecutive duplicates and the closing point, tracking the
    // bottom-most point on the way.
    let mut p = Polygon::with_capacity(poly.len());
    p.push(poly[0]);
    let mut bottom = poly[0][1];
    let mut bottom_i = 0usize;
    for i in 1..poly.len() - 1 {
        if poly[i] != poly[i - 1] {
            p.push(poly[i]);
            if poly[i][1] > bottom {
                bottom = poly[i][1];
                bottom_i = p.len() - 1;
            }
        }
    }
    let last = poly[poly.len() - 1];
    if last != poly[0] && last != poly[poly.len() - 2] {
        p.push(last);
        if last[1] > bottom {
            bottom_i = p.len() - 1;
        }
    }

    let mut to_inspect = p.clone();
    let mut res: Polygon = vec![p[bottom_i]];

    // Initial edge direction: horizontal, arriving at the start point.
    let mut line = ([p[bottom_i][0] - 1.0, p[bottom_i][1]], p[bottom_i]);

    while !to_inspect.is_empty() {
        let mut angle = 361.0;
        let mut index = usize::MAX;
        let line_dir = segment_angle(line.0, line.1);
        for (i, cand) in to_inspect.iter().enumerate() {
            if *cand != *res.last().expect("hull is non-empty") {
                let a = angle_between(line_dir, segment_angle(line.1, *cand));
                if a < angle {
                    angle = a;
                    index = i;
                }
            }
        }
        if index == usize::MAX {
            break;
        }

        let chosen = to_inspect[index];
        line = (line.1, chosen);

        if tolerance_eq(angle, 0.0) && res.len() > 1 {
            // Collinear with the previous edge: keep only the farthest point.
            *res.last_mut().expect("hull is non-empty") = chosen;
        } else {
            res.push(chosen);
        }
        if res.last() == res.first() && res.len() > 1 {
            res.pop();
            break;
        }
        to_inspect.remove(index);
    }

    res
}

/// Returns true when the polygon is convex and simple.
///
/// Walks consecutive edge direction changes: the signed turn must keep one
/// sign throughout, and the accumulated turning must sum to plus-or-minus
/// one full revolution. Self-intersecting polygons and polygons with
/// degenerate edges fail one of the two conditions.
pub fn is_non_concave(poly: &[Point]) -> bool {
    if poly.len() < 4 {
        return true;
    }

    let two_pi = 2.0 * std::f64::consts::PI;
    let mut old = poly[poly.len() - 2];
    let mut new = poly[poly.len() - 1];
    let mut new_direction = (new[1] - old[1]).atan2(new[0] - old[0]);
    let mut angle_sum = 0.0;
    let mut orientation = 0.0;

    for &point in poly {
        if point == new {
            continue;
        }
        let old_direction = new_direction;
        old = new;
        new = point;
        new_direction = (new[1] - old[1]).atan2(new[0] - old[0]);

        // Normalized direction change in the half-open interval (-pi, pi].
        let mut angle = new_direction - old_direction;
        if angle <= -std::f64::consts::PI {
            angle += two_pi;
        } else if angle > std::f64::consts::PI {
            angle -= two_pi;
        }

        if orientation == 0.0 {
            if angle == 0.0 {
                continue;
            }
            orientation = if angle > 0.0 { 1.0 } else { -1.0 };
        } else if orientation * angle <= 0.0 {
            return false;
        }
        angle_sum += angle;
    }

    (angle_sum / two_pi).round().abs() == 1.0
}
