//! Minimum-area oriented bounding box by edge-aligned rotation of the hull.

use serde::{Deserialize, Serialize};

use super::{convex_hull, is_non_concave, Point, Polygon};

/// Oriented rectangle, as returned by [`minimum_area_bbox`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrientedRect {
    /// The four corners of the bounding rectangle.
    pub bounding_points: Polygon,
    /// The convex hull the box was computed from.
    pub hull_points: Polygon,
    /// Box center.
    pub center: Point,
    /// Smaller box side.
    pub width: f64,
    /// Larger box side.
    pub height: f64,
    /// Angle between the smaller box side and the x axis, in radians.
    /// Positive means the box leans from bottom right to top left.
    pub width_angle: f64,
    /// Angle between the larger box side and the x axis, in radians.
    /// Positive means the box leans from bottom left to top right.
    pub height_angle: f64,
}

fn angle_to_x_axis(p1: Point, p2: Point) -> f64 {
    let dx = p1[0] - p2[0];
    let dy = p1[1] - p2[1];
    -(dy / dx).atan()
}

fn rotate(p: Point, angle: f64) -> Point {
    let (s, c) = angle.sin_cos();
    [p[0] * c - p[1] * s, p[0] * s + p[1] * c]
}

/// Minimum-area oriented bounding box around a set of points.
///
/// For every hull edge, all hull points are rotated so the edge aligns with
/// the x axis; the minimum-area axis-aligned box over those rotations is
/// rotated back. Set `check_convex` to false if the input polygon is already
/// convex.
pub fn minimum_area_bbox(poly: &[Point], check_convex: bool) -> OrientedRect {
    let hull: Polygon = if check_convex {
        if is_non_concave(poly) {
            poly.to_vec()
        } else {
            convex_hull(poly)
        }
    } else {
        poly.to_vec()
    };
    if hull.len() <= 1 {
        return OrientedRect::default();
    }

    // (left, top, right, bottom) of the best box in its rotated frame.
    let mut min_box = (0.0f64, 0.0f64, 0.0f64, 0.0f64);
    let mut min_angle = 0.0f64;
    let mut have_box = false;

    for i in 0..hull.len() {
        let current = hull[i];
        let next = hull[(i + 1) % hull.len()];
        let angle = angle_to_x_axis(current, next);

        let mut top = f64::MAX;
        let mut bottom = f64::MIN;
        let mut left = f64::MAX;
        let mut right = f64::MIN;
        for &p in &hull {
            let r = rotate(p, angle);
            top = top.min(r[1]);
            bottom = bottom.max(r[1]);
            left = left.min(r[0]);
            right = right.max(r[0]);
        }

        let empty = !have_box || min_box.2 - min_box.0 <= 0.0 || min_box.3 - min_box.1 <= 0.0;
        let min_area = (min_box.2 - min_box.0) * (min_box.3 - min_box.1);
        if empty || min_area > (right - left) * (bottom - top) {
            min_box = (left, top, right, bottom);
            min_angle = angle;
            have_box = true;
        }
    }

    let (left, top, right, bottom) = min_box;
    let mut corners = [
        [left, top],
        [right, top],
        [right, bottom],
        [left, bottom],
    ];

    let abs_x = (corners[0][0] - corners[1][0]).abs();
    let abs_y = (corners[1][1] - corners[2][1]).abs();
    let width = abs_x.min(abs_y);
    let height = abs_x.max(abs_y);

    // Rotate the box back into the input frame and take its center.
    let mut sum = [0.0, 0.0];
    for c in corners.iter_mut() {
        *c = rotate(*c, -min_angle);
        sum[0] += c[0];
        sum[1] += c[1];
    }
    let center = [sum[0] / 4.0, sum[1] / 4.0];

    let (hp1, hp2) = if abs_x > abs_y {
        (corners[0], corners[1])
    } else {
        (corners[1], corners[2])
    };
    let height_angle = angle_to_x_axis(hp1, hp2);
    let width_angle = if height_angle > 0.0 {
        height_angle - std::f64::consts::FRAC_PI_2
    } else {
        height_angle + std::f64::consts::FRAC_PI_2
    };

    OrientedRect {
        bounding_points: corners.to_vec(),
        hull_points: hull,
        center,
        width,
        height,
        width_angle,
        height_angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn axis_aligned_rect_is_its_own_bbox() {
        let p = vec![[0.0, 0.0], [6.0, 0.0], [6.0, 2.0], [0.0, 2.0]];
        let r = minimum_area_bbox(&p, true);
        assert!((r.width - 2.0).abs() < 1e-9);
        assert!((r.height - 6.0).abs() < 1e-9);
        assert!((r.center[0] - 3.0).abs() < 1e-9);
        assert!((r.center[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn rotated_rect_dimensions_recovered() {
        // A 4x1 rectangle rotated by 30 degrees around the origin.
        let a = 30.0_f64.to_radians();
        let base = [[0.0, 0.0], [4.0, 0.0], [4.0, 1.0], [0.0, 1.0]];
        let p: Vec<Point> = base.iter().map(|&q| rotate(q, a)).collect();
        let r = minimum_area_bbox(&p, true);
        assert!((r.width - 1.0).abs() < 1e-6);
        assert!((r.height - 4.0).abs() < 1e-6);
    }

    #[test]
    fn beats_brute_force_angle_sweep() {
        let mut rng = StdRng::seed_from_u64(97);
        for _ in 0..20 {
            let pts: Vec<Point> = (0..10)
                .map(|_| [rng.random_range(-5.0..5.0), rng.random_range(-5.0..5.0)])
                .collect();
            let hull = convex_hull(&pts);
            if hull.len() < 3 {
                continue;
            }
            let r = minimum_area_bbox(&hull, false);
            let best = r.width * r.height;

            for step in 0..90 {
                let angle = (step as f64) * std::f64::consts::PI / 90.0;
                let mut lo = [f64::MAX, f64::MAX];
                let mut hi = [f64::MIN, f64::MIN];
                for &p in &hull {
                    let q = rotate(p, angle);
                    lo[0] = lo[0].min(q[0]);
                    lo[1] = lo[1].min(q[1]);
                    hi[0] = hi[0].max(q[0]);
                    hi[1] = hi[1].max(q[1]);
                }
                let area = (hi[0] - lo[0]) * (hi[1] - lo[1]);
                assert!(best <= area + 1e-6, "sweep found a smaller box");
            }
        }
    }

    #[test]
    fn degenerate_inputs_return_default() {
        let r = minimum_area_bbox(&[[1.0, 1.0]], true);
        assert!(r.bounding_points.is_empty());
        assert_eq!(r.width, 0.0);
    }
}
