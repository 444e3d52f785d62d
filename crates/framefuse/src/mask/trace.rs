//! Moore-neighbor boundary tracing over labeled rasters.

use image::{ImageBuffer, Luma, Primitive};
use num_traits::NumCast;

use crate::geometry::{Point, Polygon};

use super::simplify::rdp_simplify;

type Raster<T> = ImageBuffer<Luma<T>, Vec<T>>;
type IntPoint = (i64, i64);

/// Moore tracing probes neighbors by rotating the previous step direction in
/// 45-degree increments, clockwise on screen.
fn rotate_clockwise_45(pt: IntPoint) -> IntPoint {
    const C: f64 = std::f64::consts::FRAC_1_SQRT_2;
    let x = (C * pt.0 as f64 - C * pt.1 as f64).round() as i64;
    let y = (C * pt.0 as f64 + C * pt.1 as f64).round() as i64;
    (x, y)
}

#[inline]
fn pixel<T: Primitive>(ar: &Raster<T>, x: i64, y: i64) -> T {
    ar.as_raw()[y as usize * ar.width() as usize + x as usize]
}

/// A valid boundary pixel: foreground, and adjacent to background or to the
/// raster border.
fn check_point<T: Primitive>(x: i64, y: i64, ar: &Raster<T>, mask_value: T) -> bool {
    let w = ar.width() as i64;
    let h = ar.height() as i64;
    if x < 0 || y < 0 || x >= w || y >= h {
        return false;
    }
    if pixel(ar, x, y) == mask_value {
        if x == 0
            || y == 0
            || x == w - 1
            || y == h - 1
            || pixel(ar, x - 1, y) != mask_value
            || pixel(ar, x + 1, y) != mask_value
            || pixel(ar, x, y - 1) != mask_value
            || pixel(ar, x, y + 1) != mask_value
        {
            return true;
        }
    }
    false
}

fn next_point<T: Primitive>(prev: IntPoint, center: IntPoint, ar: &Raster<T>, mask_value: T) -> IntPoint {
    let mut diff = (prev.0 - center.0, prev.1 - center.1);

    // Start probing from the direction one step past the previous pixel.
    for _ in 0..8 {
        diff = rotate_clockwise_45(diff);
        let pt = (diff.0 + center.0, diff.1 + center.1);
        if check_point(pt.0, pt.1, ar, mask_value) {
            return pt;
        }
    }
    // No valid neighbor: single-pixel region.
    center
}

/// Nudge boundary pixels half a pixel outward on sides facing background or
/// the raster border, so the polygon hugs the pixel extent.
fn adjust_point<T: Primitive>(pt: IntPoint, ar: &Raster<T>, mask_value: T) -> Point {
    let mut res = [pt.0 as f64, pt.1 as f64];
    if pt.0 == ar.width() as i64 - 1 || pixel(ar, pt.0 + 1, pt.1) != mask_value {
        res[0] += 0.5;
    }
    if pt.1 == ar.height() as i64 - 1 || pixel(ar, pt.0, pt.1 + 1) != mask_value {
        res[1] += 0.5;
    }
    res
}

fn trace_from<T: Primitive>(start: IntPoint, ar: &Raster<T>, mask_value: T, epsilon: f64) -> Polygon {
    let mut out: Vec<IntPoint> = vec![start];
    let mut prev = (start.0 - 1, start.1);
    let mut pt = start;

    loop {
        let tmp = next_point(prev, pt, ar, mask_value);
        prev = pt;
        pt = tmp;

        // Back at the start pixel: close the boundary and stop.
        if pt == out[0] {
            out.push(pt);
            break;
        }
        out.push(pt);
    }

    if out.len() == 2 {
        // Single pixel: close the polygon (three times the same point).
        out.push(out[0]);
        return out.iter().map(|p| [p.0 as f64, p.1 as f64]).collect();
    }

    // Drop pixels strictly inside straight horizontal/vertical runs.
    if out.len() > 3 {
        let mut filtered = Vec::with_capacity(out.len());
        filtered.push(out[0]);
        for i in 1..out.len() - 1 {
            let p = out[i];
            let run_x = p.0 == out[i - 1].0 && p.0 == out[i + 1].0;
            let run_y = p.1 == out[i - 1].1 && p.1 == out[i + 1].1;
            if !(run_x || run_y) {
                filtered.push(p);
            }
        }
        filtered.push(*out.last().expect("trace is non-empty"));
        out = filtered;
    }

    let mut poly: Polygon = out.iter().map(|p| [p.0 as f64, p.1 as f64]).collect();

    if poly.len() > 9 && epsilon > 0.0 {
        poly = rdp_simplify(&poly, epsilon);
    }
    poly
}

/// Extract the bounding polygon of a mask region.
///
/// The mask is a 2D raster where foreground pixels equal `foreground`. When
/// the raster contains several regions with that value, only the region
/// containing `seed` is traced; without a seed (or with a seed lying in the
/// background) the first region encountered from the top-left corner is
/// used. The traced outline is smoothed with the closed expansion-only RDP
/// when it exceeds 9 points and `epsilon > 0`.
pub fn extract_mask_polygon<T: Primitive>(
    ar: &Raster<T>,
    foreground: f64,
    epsilon: f64,
    seed: Option<(u32, u32)>,
) -> Polygon {
    if ar.width() == 0 || ar.height() == 0 {
        return Polygon::new();
    }
    let mask_value: T = match NumCast::from(foreground) {
        Some(v) => v,
        None => return Polygon::new(),
    };

    let seed = seed.filter(|&(x, y)| {
        x < ar.width() && y < ar.height() && pixel(ar, x as i64, y as i64) == mask_value
    });

    let trace = |start: IntPoint| -> Polygon {
        let poly = trace_from(start, ar, mask_value, epsilon);
        poly.iter()
            .map(|p| adjust_point((p[0].round() as i64, p[1].round() as i64), ar, mask_value))
            .collect()
    };

    match seed {
        None => {
            // Search from the top-left corner.
            for y in 0..ar.height() as i64 {
                for x in 0..ar.width() as i64 {
                    if pixel(ar, x, y) == mask_value {
                        return trace((x, y));
                    }
                }
            }
            Polygon::new()
        }
        Some((sx, sy)) => {
            // Walk up from the seed to the region's top border.
            for y in (0..sy as i64).rev() {
                if pixel(ar, sx as i64, y) != mask_value {
                    return trace((sx as i64, y + 1));
                }
            }
            trace((sx as i64, sy as i64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(w: u32, h: u32, fg: &[(u32, u32)]) -> Raster<u8> {
        let mut img = Raster::<u8>::new(w, h);
        for &(x, y) in fg {
            img.put_pixel(x, y, Luma([1]));
        }
        img
    }

    #[test]
    fn traces_a_filled_block() {
        let mut fg = Vec::new();
        for y in 1..=3 {
            for x in 1..=3 {
                fg.push((x, y));
            }
        }
        let img = raster(5, 5, &fg);
        let poly = extract_mask_polygon(&img, 1.0, 0.0, None);
        assert_eq!(
            poly,
            vec![
                [1.0, 1.0],
                [3.5, 1.0],
                [3.5, 3.5],
                [1.0, 3.5],
                [1.0, 1.0]
            ]
        );
    }

    #[test]
    fn single_pixel_region_closes_immediately() {
        let img = raster(5, 5, &[(2, 2)]);
        let poly = extract_mask_polygon(&img, 1.0, 0.0, None);
        assert_eq!(poly.len(), 3);
        for p in &poly {
            assert_eq!(*p, [2.5, 2.5]);
        }
    }

    #[test]
    fn seed_selects_the_region() {
        // Two separate blocks with the same value.
        let img = raster(8, 4, &[(1, 1), (5, 1), (6, 1), (5, 2), (6, 2)]);
        let poly = extract_mask_polygon(&img, 1.0, 0.0, Some((6, 2)));
        assert!(poly.iter().all(|p| p[0] >= 4.0), "traced wrong region: {:?}", poly);
        // Without a seed the top-left region wins.
        let poly = extract_mask_polygon(&img, 1.0, 0.0, None);
        assert!(poly.iter().all(|p| p[0] <= 2.0));
    }

    #[test]
    fn background_seed_falls_back_to_scan() {
        let img = raster(4, 4, &[(2, 2)]);
        let poly = extract_mask_polygon(&img, 1.0, 0.0, Some((0, 0)));
        assert_eq!(poly.len(), 3);
    }

    #[test]
    fn empty_mask_yields_empty_polygon() {
        let img = Raster::<u8>::new(4, 4);
        assert!(extract_mask_polygon(&img, 1.0, 0.0, None).is_empty());
        // A foreground value outside the pixel type range is degenerate too.
        let img = raster(4, 4, &[(1, 1)]);
        assert!(extract_mask_polygon(&img, 1e9, 0.0, None).is_empty());
    }

    #[test]
    fn works_for_float_rasters() {
        let mut img = Raster::<f32>::new(4, 4);
        img.put_pixel(1, 1, Luma([0.5]));
        img.put_pixel(2, 1, Luma([0.5]));
        let poly = extract_mask_polygon(&img, 0.5, 0.0, None);
        assert!(!poly.is_empty());
        assert_eq!(poly.first(), poly.last());
    }
}
