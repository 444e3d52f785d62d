//! Single-pass connected-component labeling with an equivalence array.

use image::{ImageBuffer, Luma, Primitive};
use rayon::prelude::*;

type Raster<T> = ImageBuffer<Luma<T>, Vec<T>>;

/// Label connected components of `input`.
///
/// Pixels equal to `background` get label 0; every other pixel joins the
/// component of neighbors sharing the same source value (left/top, plus the
/// two upper diagonals under 8-connectivity). Conflicting provisional labels
/// are merged through a relabeling array, always keeping the smallest label.
/// A final pass follows the relabel chains and renumbers the surviving
/// labels densely starting at 1; that pass is pure per-pixel work and runs
/// in parallel.
///
/// Returns the label raster and the number of components.
pub fn label_image<T: Primitive>(
    input: &Raster<T>,
    background: T,
    connectivity_8: bool,
) -> (Raster<u32>, u32) {
    let w = input.width() as usize;
    let h = input.height() as usize;
    let size = w * h;
    if size == 0 {
        return (Raster::<u32>::new(input.width(), input.height()), 0);
    }

    let src = input.as_raw();
    let mut out = vec![0u32; size];
    let mut relabel: Vec<u32> = (0..=size as u32).collect();
    let mut next_label = 1u32;

    // Merge a provisional label with a neighbor's, keeping the smallest.
    fn merge(label: &mut u32, other: u32, relabel: &mut [u32]) {
        if other == 0 {
            return;
        }
        if *label != other && *label != 0 {
            if *label > other {
                relabel[*label as usize] = relabel[other as usize];
                *label = other;
            } else {
                relabel[other as usize] = relabel[*label as usize];
            }
        } else {
            *label = other;
        }
    }

    for y in 0..h {
        for x in 0..w {
            let value = src[y * w + x];
            if value == background {
                continue;
            }

            let mut label = 0u32;

            if x > 0 && src[y * w + x - 1] == value {
                label = out[y * w + x - 1];
            }
            if y > 0 && src[(y - 1) * w + x] == value {
                merge(&mut label, out[(y - 1) * w + x], &mut relabel);
            }
            if connectivity_8 {
                if y > 0 && x > 0 && src[(y - 1) * w + x - 1] == value {
                    merge(&mut label, out[(y - 1) * w + x - 1], &mut relabel);
                }
                if y > 0 && x + 1 < w && src[(y - 1) * w + x + 1] == value {
                    merge(&mut label, out[(y - 1) * w + x + 1], &mut relabel);
                }
            }

            if label == 0 {
                label = next_label;
                next_label += 1;
            }
            out[y * w + x] = label;
        }
    }

    // Labels that do not move through the relabel array are the survivors;
    // number them consecutively from 1.
    let mut final_labels: Vec<u32> = (0..next_label).collect();
    let mut label_count = 0u32;
    for i in 1..next_label as usize {
        if relabel[i] == i as u32 {
            label_count += 1;
            final_labels[i] = label_count;
        }
    }

    // Follow all indirections and write the dense label.
    out.par_iter_mut().for_each(|v| {
        let mut value = *v;
        while value != relabel[value as usize] {
            value = relabel[value as usize];
        }
        *v = final_labels[value as usize];
    });

    let labels = Raster::<u32>::from_raw(input.width(), input.height(), out)
        .expect("label buffer matches raster dimensions");
    (labels, label_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(w: u32, h: u32, values: &[u8]) -> Raster<u8> {
        Raster::<u8>::from_raw(w, h, values.to_vec()).unwrap()
    }

    #[test]
    fn checkerboard_connectivity() {
        let mut values = vec![0u8; 16];
        for y in 0..4usize {
            for x in 0..4usize {
                if (x + y) % 2 == 0 {
                    values[y * 4 + x] = 1;
                }
            }
        }
        let img = raster(4, 4, &values);

        // Isolated cells under 4-connectivity.
        let (_, count4) = label_image(&img, 0, false);
        assert_eq!(count4, 8);

        // Diagonally touching cells merge under 8-connectivity.
        let (_, count8) = label_image(&img, 0, true);
        assert_eq!(count8, 1);
    }

    #[test]
    fn u_shape_merges_conflicting_labels() {
        // The two prongs get separate provisional labels that meet on the
        // bottom row; the relabel chain must collapse them into one.
        #[rustfmt::skip]
        let values = [
            1, 0, 1,
            1, 1, 1,
        ];
        let img = raster(3, 2, &values);
        let (labels, count) = label_image(&img, 0, false);
        assert_eq!(count, 1);
        let raw = labels.as_raw();
        assert_eq!(raw[0], 1);
        assert_eq!(raw[2], 1);
        assert_eq!(raw[1], 0);
    }

    #[test]
    fn distinct_values_stay_distinct() {
        // Touching pixels with different source values are separate
        // components.
        #[rustfmt::skip]
        let values = [
            1, 2,
            1, 2,
        ];
        let img = raster(2, 2, &values);
        let (labels, count) = label_image(&img, 0, false);
        assert_eq!(count, 2);
        let raw = labels.as_raw();
        assert_ne!(raw[0], raw[1]);
    }

    #[test]
    fn labels_are_dense_from_one() {
        #[rustfmt::skip]
        let values = [
            1, 0, 1, 0, 1,
            0, 0, 0, 0, 0,
            1, 0, 0, 0, 1,
        ];
        let img = raster(5, 3, &values);
        let (labels, count) = label_image(&img, 0, false);
        assert_eq!(count, 5);
        let mut seen: Vec<u32> = labels.as_raw().iter().copied().filter(|&v| v != 0).collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn empty_raster() {
        let img = Raster::<u8>::new(0, 0);
        let (_, count) = label_image(&img, 0, false);
        assert_eq!(count, 0);
    }
}
