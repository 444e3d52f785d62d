//! Shoelace-family polygon primitives: orientation, area, centroid, moments.

use serde::{Deserialize, Serialize};

use super::{Point, Polygon};

// ── Orientation and basic edits ────────────────────────────────────────────

/// Unnormalized shoelace sum. Negative means clockwise under the y-down
/// convention.
pub fn signed_area(poly: &[Point]) -> f64 {
    let mut sum = 0.0;
    for i in 0..poly.len() {
        let p = poly[i];
        let n = if i == poly.len() - 1 { poly[0] } else { poly[i + 1] };
        sum += p[0] * n[1] - n[0] * p[1];
    }
    sum
}

/// Tells whether the polygon's points are listed in clockwise order.
pub fn is_clockwise(poly: &[Point]) -> bool {
    signed_area(poly) < 0.0
}

/// Reverse the point order.
pub fn reverse_polygon(poly: &[Point]) -> Polygon {
    poly.iter().rev().copied().collect()
}

/// Reverse the polygon if needed so it winds in the requested direction.
pub fn set_polygon_orientation(poly: &[Point], clockwise: bool) -> Polygon {
    if poly.is_empty() {
        return poly.to_vec();
    }
    if is_clockwise(poly) == clockwise {
        poly.to_vec()
    } else {
        reverse_polygon(poly)
    }
}

/// Close the polygon if necessary (`last == first`).
pub fn close_polygon(poly: &[Point]) -> Polygon {
    let mut res = poly.to_vec();
    if let (Some(&first), Some(&last)) = (poly.first(), poly.last()) {
        if first != last {
            res.push(first);
        }
    }
    res
}

/// Open the polygon if necessary (`last != first`).
pub fn open_polygon(poly: &[Point]) -> Polygon {
    if poly.len() > 1 && poly.first() == poly.last() {
        poly[..poly.len() - 1].to_vec()
    } else {
        poly.to_vec()
    }
}

/// Remove consecutive duplicated points.
pub fn remove_consecutive_duplicates(poly: &[Point]) -> Polygon {
    let mut res = Polygon::with_capacity(poly.len());
    let Some(&first) = poly.first() else {
        return res;
    };
    res.push(first);
    for i in 1..poly.len() {
        if poly[i] != poly[i - 1] {
            res.push(poly[i]);
        }
    }
    res
}

/// Rotate the point order so tracing starts at index `new_start`.
/// The output keeps the original size.
pub fn reorder_polygon(poly: &[Point], new_start: usize) -> Polygon {
    let mut res = Polygon::with_capacity(poly.len());
    let mut pos = new_start;
    for _ in 0..poly.len() {
        if pos >= poly.len() {
            pos = 0;
        }
        res.push(poly[pos]);
        pos += 1;
    }
    res
}

// ── Bounding rectangle ─────────────────────────────────────────────────────

/// Axis-aligned bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    /// Top-left corner (minimum x and y).
    pub min: Point,
    /// Bottom-right corner (maximum x and y).
    pub max: Point,
}

impl BoundingRect {
    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn center(&self) -> Point {
        [
            0.5 * (self.min[0] + self.max[0]),
            0.5 * (self.min[1] + self.max[1]),
        ]
    }

    /// Corners in tracing order: top-left, top-right, bottom-right,
    /// bottom-left.
    pub fn corners(&self) -> [Point; 4] {
        [
            self.min,
            [self.max[0], self.min[1]],
            self.max,
            [self.min[0], self.max[1]],
        ]
    }
}

/// Axis-aligned bounds of a point set, or `None` for an empty set.
pub fn bounding_rect(poly: &[Point]) -> Option<BoundingRect> {
    let first = poly.first()?;
    let mut min = *first;
    let mut max = *first;
    for p in &poly[1..] {
        min[0] = min[0].min(p[0]);
        min[1] = min[1].min(p[1]);
        max[0] = max[0].max(p[0]);
        max[1] = max[1].max(p[1]);
    }
    Some(BoundingRect { min, max })
}

/// Tells whether the polygon traces an axis-aligned rectangle and returns it.
///
/// Collinear runs are collapsed first, then all points must use at most two
/// distinct x values and two distinct y values.
pub fn is_rect(poly: &[Point]) -> Option<BoundingRect> {
    if poly.len() < 4 {
        return None;
    }

    let p = crate::mask::simplify_polygon(poly);

    let mut xs = [p[0][0], 0.0];
    let mut ys = [p[0][1], 0.0];
    let mut nx = 1;
    let mut ny = 1;

    for pt in &p[1..] {
        if nx == 1 {
            if pt[0] != xs[0] {
                xs[1] = pt[0];
                nx = 2;
            }
        } else if pt[0] != xs[0] && pt[0] != xs[1] {
            return None;
        }

        if ny == 1 {
            if pt[1] != ys[0] {
                ys[1] = pt[1];
                ny = 2;
            }
        } else if pt[1] != ys[0] && pt[1] != ys[1] {
            return None;
        }
    }

    if nx == 1 {
        xs[1] = xs[0];
    } else if xs[0] > xs[1] {
        xs.swap(0, 1);
    }
    if ny == 1 {
        ys[1] = ys[0];
    } else if ys[0] > ys[1] {
        ys.swap(0, 1);
    }

    Some(BoundingRect {
        min: [xs[0], ys[0]],
        max: [xs[1], ys[1]],
    })
}

// ── Area, centroid, moments ────────────────────────────────────────────────

/// Polygon area via the shoelace algorithm (orientation-independent).
pub fn polygon_area(poly: &[Point]) -> f64 {
    if poly.len() < 3 {
        return 0.0;
    }
    (signed_area(&close_polygon(poly)) * 0.5).abs()
}

/// Polygon centroid via the shoelace moment formulas.
pub fn polygon_centroid(poly: &[Point]) -> Point {
    let p = close_polygon(poly);
    let mut cross_sum = 0.0;
    let mut gx = 0.0;
    let mut gy = 0.0;
    for i in 0..p.len().saturating_sub(1) {
        let cross = p[i][0] * p[i + 1][1] - p[i + 1][0] * p[i][1];
        cross_sum += cross;
        gx += (p[i][0] + p[i + 1][0]) * cross;
        gy += (p[i][1] + p[i + 1][1]) * cross;
    }
    let area = cross_sum * 0.5;
    if area == 0.0 {
        return poly.first().copied().unwrap_or([0.0, 0.0]);
    }
    [gx / (6.0 * area), gy / (6.0 * area)]
}

/// Shape descriptors derived from the closed, counter-clockwise polygon.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PolygonDescriptors {
    pub area: f64,
    pub centroid: Point,
    /// Second moment of area about the origin (xx).
    pub ixx: f64,
    /// Second moment of area about the origin (yy).
    pub iyy: f64,
    /// Second moment of area about the origin (xy).
    pub ixy: f64,
    /// Principal orientation in degrees, counter-clockwise from the x axis.
    pub orientation: f64,
}

/// Area, centroid and second moments of a polygon about the origin.
pub fn polygon_descriptors(poly: &[Point]) -> PolygonDescriptors {
    let p = close_polygon(&set_polygon_orientation(poly, false));
    if p.len() < 3 {
        return PolygonDescriptors::default();
    }

    let mut sum1 = 0.0;
    let mut sum2 = 0.0;
    let mut gx = 0.0;
    let mut gy = 0.0;
    let mut ixx = 0.0;
    let mut iyy = 0.0;
    let mut ixy = 0.0;

    for i in 0..p.len() - 1 {
        let xy1 = p[i][0] * p[i + 1][1];
        let yx1 = p[i][1] * p[i + 1][0];
        let cross = xy1 - yx1;

        sum1 += xy1;
        sum2 += yx1;
        gx += (p[i][0] + p[i + 1][0]) * cross;
        gy += (p[i][1] + p[i + 1][1]) * cross;

        ixx += cross * (p[i][1] * p[i][1] + p[i][1] * p[i + 1][1] + p[i + 1][1] * p[i + 1][1]);
        iyy += cross * (p[i][0] * p[i][0] + p[i][0] * p[i + 1][0] + p[i + 1][0] * p[i + 1][0]);
        ixy += cross * (xy1 + 2.0 * p[i][0] * p[i][1] + 2.0 * p[i + 1][0] * p[i + 1][1] + yx1);
    }

    // Closing terms of the shoelace sums.
    sum1 += p[p.len() - 1][0] * p[0][1];
    sum2 += p[0][0] * p[p.len() - 1][1];

    let area = (sum1 - sum2).abs() * 0.5;
    let ixx = ixx / 12.0;
    let iyy = iyy / 12.0;
    let ixy = ixy / 24.0;

    PolygonDescriptors {
        area,
        centroid: if area == 0.0 {
            [0.0, 0.0]
        } else {
            [gx / (6.0 * area), gy / (6.0 * area)]
        },
        ixx,
        iyy,
        ixy,
        orientation: (0.5 * (2.0 * ixy / (iyy - ixx)).atan()).to_degrees(),
    }
}

/// Polygon area measured by rasterization: the number of integer pixels
/// whose center lies inside the polygon (even-odd rule).
///
/// Returns 0 instead of failing on degenerate or absurdly large inputs.
pub fn polygon_area_rasterize(poly: &[Point]) -> usize {
    const MAX_RASTER_PIXELS: f64 = (1u64 << 31) as f64;

    let Some(rect) = bounding_rect(poly) else {
        return 0;
    };
    if poly.len() < 3 {
        return 0;
    }
    if rect.width() * rect.height() > MAX_RASTER_PIXELS {
        return 0;
    }

    let p = close_polygon(poly);
    let y0 = rect.min[1].floor() as i64;
    let y1 = rect.max[1].ceil() as i64;

    let mut count = 0usize;
    let mut crossings: Vec<f64> = Vec::new();
    for row in y0..y1 {
        let yc = row as f64 + 0.5;
        crossings.clear();
        for w in p.windows(2) {
            let (a, b) = (w[0], w[1]);
            if (a[1] <= yc) != (b[1] <= yc) {
                let t = (yc - a[1]) / (b[1] - a[1]);
                crossings.push(a[0] + t * (b[0] - a[0]));
            }
        }
        crossings.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for pair in crossings.chunks_exact(2) {
            let first = (pair[0] - 0.5).ceil() as i64;
            let last = (pair[1] - 0.5).floor() as i64;
            if last >= first {
                count += (last - first + 1) as usize;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Polygon {
        vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]
    }

    #[test]
    fn orientation_follows_signed_area() {
        // y-down: this square traces counter-clockwise on screen.
        assert!(!is_clockwise(&square()));
        assert!(is_clockwise(&reverse_polygon(&square())));
    }

    #[test]
    fn area_and_centroid_of_square() {
        assert!((polygon_area(&square()) - 16.0).abs() < 1e-12);
        let c = polygon_centroid(&square());
        assert!((c[0] - 2.0).abs() < 1e-12);
        assert!((c[1] - 2.0).abs() < 1e-12);
        // Orientation must not flip the centroid.
        let c = polygon_centroid(&reverse_polygon(&square()));
        assert!((c[0] - 2.0).abs() < 1e-12 && (c[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn close_open_roundtrip() {
        let closed = close_polygon(&square());
        assert_eq!(closed.len(), 5);
        assert_eq!(closed.first(), closed.last());
        assert_eq!(open_polygon(&closed), square());
    }

    #[test]
    fn is_rect_accepts_redundant_outline() {
        // Rectangle outline with extra collinear points.
        let p = vec![
            [0.0, 0.0],
            [2.0, 0.0],
            [5.0, 0.0],
            [5.0, 3.0],
            [0.0, 3.0],
            [0.0, 0.0],
        ];
        let r = is_rect(&p).unwrap();
        assert_eq!(r.min, [0.0, 0.0]);
        assert_eq!(r.max, [5.0, 3.0]);
        assert!(is_rect(&[[0.0, 0.0], [1.0, 0.0], [2.0, 2.0], [0.0, 1.0]]).is_none());
    }

    #[test]
    fn reorder_keeps_size_and_rotates() {
        let p = square();
        let r = reorder_polygon(&p, 2);
        assert_eq!(r.len(), 4);
        assert_eq!(r[0], [4.0, 4.0]);
        assert_eq!(r[3], [4.0, 0.0]);
    }

    #[test]
    fn descriptors_of_centered_rect() {
        // 4x2 rectangle centered on the origin: Ixy about the origin is 0 and
        // the principal orientation is along x.
        let p = vec![[-2.0, -1.0], [2.0, -1.0], [2.0, 1.0], [-2.0, 1.0]];
        let d = polygon_descriptors(&p);
        assert!((d.area - 8.0).abs() < 1e-12);
        assert!(d.centroid[0].abs() < 1e-12 && d.centroid[1].abs() < 1e-12);
        assert!(d.ixy.abs() < 1e-9);
        assert!(d.orientation.abs() < 1e-9);
        // Ixx = w*h^3/12, Iyy = h*w^3/12 for a centered rectangle.
        assert!((d.ixx - 4.0 * 2.0_f64.powi(3) / 12.0).abs() < 1e-9);
        assert!((d.iyy - 2.0 * 4.0_f64.powi(3) / 12.0).abs() < 1e-9);
    }

    #[test]
    fn rasterized_area_matches_shoelace_for_rect() {
        let n = polygon_area_rasterize(&square());
        assert_eq!(n, 16);
        assert_eq!(polygon_area_rasterize(&[[0.0, 0.0], [1.0, 0.0]]), 0);
    }
}
