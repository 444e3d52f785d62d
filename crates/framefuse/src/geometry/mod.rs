//! Geometry kernel: 2×2 linear solves, segment helpers, polygon primitives.
//!
//! Points are `[f64; 2]` in pixel-like coordinates (x right, y down). A
//! polygon is a plain `Vec<Point>`; it is closed iff its first and last
//! points are equal. Orientation is never stored, it is derived from the
//! signed shoelace sum.

mod hull;
mod obb;
mod polygon;

pub use hull::{convex_hull, is_non_concave};
pub use obb::{minimum_area_bbox, OrientedRect};
pub use polygon::{
    bounding_rect, close_polygon, is_clockwise, is_rect, open_polygon, polygon_area,
    polygon_area_rasterize, polygon_centroid, polygon_descriptors, remove_consecutive_duplicates,
    reorder_polygon, reverse_polygon, set_polygon_orientation, signed_area, BoundingRect,
    PolygonDescriptors,
};

use nalgebra::{Matrix2, Vector2};

/// A 2D point, `[x, y]`.
pub type Point = [f64; 2];

/// An ordered point sequence; closed iff `first == last`.
pub type Polygon = Vec<Point>;

/// Determinant magnitude below which a 2×2 matrix is treated as singular.
const SINGULAR_EPS: f64 = 1e-12;

/// Relative floating-point comparison: `|x - y| <= eps * max(1, |x|, |y|)`.
#[inline]
pub(crate) fn tolerance_eq(x: f64, y: f64) -> bool {
    let scale = 1.0_f64.max(x.abs()).max(y.abs());
    (x - y).abs() <= f64::EPSILON * scale
}

/// Direction of the segment `p1 -> p2` in degrees, counter-clockwise from
/// the +x axis under the y-down convention, normalized to `[0, 360)`.
#[inline]
pub(crate) fn segment_angle(p1: Point, p2: Point) -> f64 {
    let deg = (-(p2[1] - p1[1])).atan2(p2[0] - p1[0]).to_degrees();
    if deg < 0.0 {
        deg + 360.0
    } else {
        deg
    }
}

/// Angle swept from direction `from` to direction `to`, in `[0, 360)` degrees.
#[inline]
pub(crate) fn angle_between(from: f64, to: f64) -> f64 {
    let delta = (to - from) % 360.0;
    if delta < 0.0 {
        delta + 360.0
    } else {
        delta
    }
}

#[inline]
pub(crate) fn segment_length(p1: Point, p2: Point) -> f64 {
    let dx = p2[0] - p1[0];
    let dy = p2[1] - p1[1];
    (dx * dx + dy * dy).sqrt()
}

/// Invert a 2×2 matrix. Returns `None` when `|det| <= 1e-12`.
pub fn invert_2x2(m: &Matrix2<f64>) -> Option<Matrix2<f64>> {
    let det = m[(0, 0)] * m[(1, 1)] - m[(0, 1)] * m[(1, 0)];
    if det.abs() <= SINGULAR_EPS {
        return None;
    }
    Some(Matrix2::new(m[(1, 1)], -m[(0, 1)], -m[(1, 0)], m[(0, 0)]) / det)
}

/// Result of [`glue`]: either a single intersection-like point both segments
/// can be extended to, or a connecting segment between the raw endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Glue {
    Point(Point),
    Segment(Point, Point),
}

/// Glue two segments together.
///
/// Given segments `a = (a1, a2)` extendable toward `a2` and `b = (b1, b2)`
/// extendable toward `b1`, solves the 2×2 system for the extension pair
/// `(t, -s)` and accepts the solution only while `0 <= t <= 2` and
/// `-1 <= s <= 1`, so a segment never more than doubles in length. On a
/// singular system (parallel segments) or a rejected solution, the two
/// nearest endpoints are connected directly instead of extrapolating.
pub fn glue(seg1: (Point, Point), seg2: (Point, Point)) -> Glue {
    let x1 = seg1.0;
    let dir1 = [seg1.1[0] - x1[0], seg1.1[1] - x1[1]];
    let x2 = seg2.0;
    let dir2 = [seg2.1[0] - x2[0], seg2.1[1] - x2[1]];

    let mat = Matrix2::new(dir1[0], dir2[0], dir1[1], dir2[1]);
    if let Some(inv) = invert_2x2(&mat) {
        let diff = Vector2::new(x2[0] - x1[0], x2[1] - x1[1]);
        let t_s = inv * diff;
        // Solved for [t, -s]: require t >= 0 and s <= 1, i.e. t_s[1] >= -1,
        // and don't let a segment more than double.
        if (0.0..=2.0).contains(&t_s[0]) && (-1.0..=1.0).contains(&t_s[1]) {
            return Glue::Point([x1[0] + dir1[0] * t_s[0], x1[1] + dir1[1] * t_s[0]]);
        }
    }
    Glue::Segment(seg1.1, seg2.0)
}

/// Minimum distance from `pt` to the segment `(s1, s2)`.
///
/// The projection parameter is clamped to `[0, 1]` first, so this measures
/// the distance to the closest point on the segment, not on the infinite
/// line through it.
pub fn distance_to_segment(pt: Point, s1: Point, s2: Point) -> f64 {
    let a = pt[0] - s1[0];
    let b = pt[1] - s1[1];
    let c = s2[0] - s1[0];
    let d = s2[1] - s1[1];

    let dot = a * c + b * d;
    let len_sq = c * c + d * d;
    let mut param = -1.0;
    if len_sq != 0.0 {
        param = dot / len_sq;
    }

    let (xx, yy) = if param < 0.0 {
        (s1[0], s1[1])
    } else if param > 1.0 {
        (s2[0], s2[1])
    } else {
        (s1[0] + param * c, s1[1] + param * d)
    };

    let dx = pt[0] - xx;
    let dy = pt[1] - yy;
    (dx * dx + dy * dy).sqrt()
}
