//! Time-series resampling: shared time bases, merge-walk interpolation,
//! union/intersection alignment of irregularly sampled curves.
//!
//! A sample is `[time, value]`. Within one logical stream a NaN time acts as
//! a restart sentinel: the runs on both sides of it are treated as
//! independent segments when merging time bases.

use serde::{Deserialize, Serialize};

/// One time-tagged sample, `[x, y]` with `x` the time coordinate.
pub type Sample = [f64; 2];

/// An ordered sample sequence with strictly increasing times.
pub type SampleVector = Vec<Sample>;

/// Hard cap on the number of generated samples; beyond it the resampling
/// degenerates to an empty result with a warning.
const MAX_RESAMPLE_SIZE: i64 = 200_000_000;

/// Samples used per vector when inferring a sampling period: the median of
/// the first few positive deltas, to keep one large acquisition gap from
/// skewing the estimate.
const SAMPLING_PROBE_COUNT: usize = 10;

// ── Time range ─────────────────────────────────────────────────────────────

/// Closed time interval. The default value is invalid (empty).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl Default for TimeRange {
    fn default() -> Self {
        Self {
            start: f64::MAX,
            end: f64::MIN,
        }
    }
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end && self.start.is_finite() && self.end.is_finite()
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

// ── Boundaries ─────────────────────────────────────────────────────────────

fn median(values: &mut Vec<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).expect("deltas are not NaN"));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid] + values[mid - 1]) / 2.0
    } else {
        values[mid]
    }
}

/// Union of the per-vector time ranges, and the smallest inferred sampling
/// period across vectors (`None` when no vector has two increasing samples).
pub fn find_boundaries(vectors: &[SampleVector]) -> (TimeRange, Option<f64>) {
    if vectors.is_empty() {
        return (TimeRange::default(), None);
    }

    let mut range = TimeRange::default();
    let mut sampling = f64::MAX;
    let mut found = false;
    let mut probes: Vec<f64> = Vec::with_capacity(SAMPLING_PROBE_COUNT + 1);

    for vec in vectors {
        if vec.is_empty() {
            continue;
        }
        range.start = range.start.min(vec[0][0]);
        range.end = range.end.max(vec[vec.len() - 1][0]);

        if vec.len() > 1 {
            probes.clear();
            for w in vec.windows(2) {
                let delta = w[1][0] - w[0][0];
                if delta > 0.0 {
                    probes.push(delta);
                    if probes.len() > SAMPLING_PROBE_COUNT {
                        break;
                    }
                }
            }
            if !probes.is_empty() {
                sampling = sampling.min(median(&mut probes));
                found = true;
            }
        }
    }

    (range, found.then_some(sampling))
}

// ── Fixed-step resampling ──────────────────────────────────────────────────

/// Resample onto the uniform base `range.start + i * sampling`.
///
/// Produces exactly `floor(range.width() / sampling) + 1` samples. The walk
/// takes exact time matches as-is, extrapolates flat before the first and
/// after the last source sample, and interpolates linearly in between, in
/// O(targets + source). A non-positive `sampling` or an output that would
/// exceed the internal size cap yields an empty vector with a warning.
pub fn resample_vector(vector: &[Sample], range: TimeRange, sampling: f64) -> SampleVector {
    if sampling <= 0.0 {
        tracing::warn!(sampling, "cannot resample with a non-positive sampling period");
        return SampleVector::new();
    }

    let size = (range.width() / sampling + 1.0).floor() as i64;
    if !(0..=MAX_RESAMPLE_SIZE).contains(&size) {
        tracing::warn!(size, "cannot resample: output size out of bounds");
        return SampleVector::new();
    }
    let size = size as usize;

    if vector.is_empty() {
        return (0..size)
            .map(|i| [range.start + i as f64 * sampling, 0.0])
            .collect();
    }

    let first = vector[0];
    let last = vector[vector.len() - 1];

    if first[0] >= range.end || vector.len() == 1 {
        return (0..size)
            .map(|i| [range.start + i as f64 * sampling, first[1]])
            .collect();
    }
    if last[0] <= range.start {
        return (0..size)
            .map(|i| [range.start + i as f64 * sampling, last[1]])
            .collect();
    }

    let mut pos = 0usize;
    let mut res = SampleVector::with_capacity(size);
    for i in 0..size {
        let x = range.start + i as f64 * sampling;

        if x <= first[0] {
            res.push([x, first[1]]);
        } else if x >= last[0] {
            res.push([x, last[1]]);
        } else {
            let mut x_val = vector[pos][0];
            let mut next = vector[pos + 1][0];
            while next < x {
                pos += 1;
                x_val = next;
                next = vector[pos + 1][0];
            }
            let factor = (x - x_val) / (next - x_val);
            res.push([x, (1.0 - factor) * vector[pos][1] + factor * vector[pos + 1][1]]);
        }
    }
    res
}

/// Resample every vector onto one shared uniform time base.
pub fn resample_vectors(
    vectors: &[SampleVector],
    range: TimeRange,
    sampling: f64,
) -> Vec<SampleVector> {
    if vectors.is_empty() {
        return Vec::new();
    }
    if !range.is_valid() || sampling <= 0.0 {
        return Vec::new();
    }
    vectors
        .iter()
        .map(|v| resample_vector(v, range, sampling))
        .collect()
}

/// Union-policy resampling: infer the shared range and sampling period from
/// the inputs via [`find_boundaries`], then resample everything onto that
/// base. When no sampling period is inferable, the range is split into a
/// fixed number of steps as a fallback; a degenerate (zero-width) range
/// returns the inputs unchanged.
pub fn resample_vectors_auto(vectors: &[SampleVector]) -> Vec<SampleVector> {
    if vectors.len() < 2 {
        return vectors.to_vec();
    }

    let (range, sampling) = find_boundaries(vectors);
    if !range.is_valid() {
        return Vec::new();
    }
    let sampling = match sampling {
        Some(s) => s,
        None if range.width() > 0.0 => range.width() / 99.0,
        None => return vectors.to_vec(),
    };
    resample_vectors(vectors, range, sampling)
}

// ── Shared time-base alignment ─────────────────────────────────────────────

/// Whether a merged time base spans the union or only the overlap of the
/// input time ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResamplePolicy {
    Union,
    Intersection,
}

/// Fill value for union-policy samples outside a vector's own range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Padding {
    /// Repeat the nearest boundary value.
    Hold,
    /// Use a fixed constant.
    Constant(f64),
}

/// Options for [`resample_pair`] / [`resample_all`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampleOptions {
    pub policy: ResamplePolicy,
    /// Interpolate linearly between brackets; otherwise take the nearest
    /// neighbor value.
    pub interpolate: bool,
    pub padding: Padding,
}

impl Default for ResampleOptions {
    fn default() -> Self {
        Self {
            policy: ResamplePolicy::Intersection,
            interpolate: true,
            padding: Padding::Hold,
        }
    }
}

/// N-way sorted merge of time sequences into one strictly increasing
/// sequence holding every distinct time value.
///
/// Each input is split at its first NaN sentinel and the two runs merge
/// independently. Under the intersection policy every run is first trimmed
/// to the overlap of the full input ranges; a null overlap yields an empty
/// result.
pub fn extract_times(inputs: &[&[f64]], policy: ResamplePolicy) -> Vec<f64> {
    if inputs.is_empty() {
        return Vec::new();
    }
    if inputs.len() == 1 {
        return inputs[0].to_vec();
    }

    // Split each input at its NaN sentinel; keep non-empty runs only.
    let mut runs: Vec<&[f64]> = Vec::with_capacity(inputs.len() + 1);
    for input in inputs {
        match input.iter().position(|x| x.is_nan()) {
            Some(p) => {
                if p > 0 {
                    runs.push(&input[..p]);
                }
                if p + 1 < input.len() {
                    runs.push(&input[p + 1..]);
                }
            }
            None => {
                if !input.is_empty() {
                    runs.push(input);
                }
            }
        }
    }

    if policy == ResamplePolicy::Intersection {
        // Overlap of the full input ranges.
        let mut start = 0.0;
        let mut end = -1.0;
        for input in inputs {
            let (Some(&first), Some(&last)) = (input.first(), input.last()) else {
                continue;
            };
            if end < start {
                start = first;
                end = last;
            } else {
                if last < start || first > end {
                    return Vec::new();
                }
                start = start.max(first);
                end = end.min(last);
            }
        }

        let mut trimmed: Vec<&[f64]> = Vec::with_capacity(runs.len());
        for run in runs {
            let lo = run.partition_point(|&x| x < start);
            let mut hi = run.len();
            if run[run.len() - 1] > end {
                hi = run.partition_point(|&x| x <= end);
                // The boundary sample itself is excluded when the run
                // extends past the overlap.
                hi = hi.saturating_sub(1);
            }
            if lo < hi {
                trimmed.push(&run[lo..hi]);
            }
        }
        runs = trimmed;
    }

    // Merge: repeatedly take the minimum head and advance every run that
    // carries it.
    let mut heads = vec![0usize; runs.len()];
    let mut res = Vec::new();
    while !runs.is_empty() {
        let mut min_time = runs[0][heads[0]];
        for (run, &head) in runs.iter().zip(&heads).skip(1) {
            min_time = min_time.min(run[head]);
        }

        let mut i = 0;
        while i < runs.len() {
            if runs[i][heads[i]] == min_time {
                heads[i] += 1;
                if heads[i] == runs[i].len() {
                    runs.remove(i);
                    heads.remove(i);
                    continue;
                }
            }
            i += 1;
        }
        res.push(min_time);
    }
    res
}

/// Resample one vector onto an explicit time base.
fn resample_onto(sample: &[Sample], times: &[f64], opts: &ResampleOptions) -> SampleVector {
    let pad = match opts.padding {
        Padding::Hold => None,
        Padding::Constant(c) => Some(c),
    };
    if sample.is_empty() {
        return times.iter().map(|&t| [t, pad.unwrap_or(0.0)]).collect();
    }

    let last = sample[sample.len() - 1];
    let mut it = 0usize;
    let mut res = SampleVector::with_capacity(times.len());

    for &time in times {
        if it == sample.len() {
            res.push([time, pad.unwrap_or(last[1])]);
            continue;
        }

        let samp = sample[it];
        if time == samp[0] {
            res.push(samp);
            it += 1;
        } else if time < samp[0] {
            if it == 0 {
                res.push([time, pad.unwrap_or(samp[1])]);
            } else {
                let prev = sample[it - 1];
                if opts.interpolate {
                    let factor = (time - prev[0]) / (samp[0] - prev[0]);
                    res.push([time, samp[1] * factor + (1.0 - factor) * prev[1]]);
                } else if time - prev[0] < samp[0] - time {
                    res.push([time, prev[1]]);
                } else {
                    res.push([time, samp[1]]);
                }
            }
        } else {
            while it < sample.len() && sample[it][0] < time {
                it += 1;
            }
            if it < sample.len() {
                let samp = sample[it];
                if samp[0] == time {
                    res.push([time, samp[1]]);
                } else {
                    let prev = sample[it - 1];
                    if opts.interpolate {
                        let factor = (time - prev[0]) / (samp[0] - prev[0]);
                        res.push([time, samp[1] * factor + (1.0 - factor) * prev[1]]);
                    } else if time - prev[0] < samp[0] - time {
                        res.push([time, prev[1]]);
                    } else {
                        res.push([time, samp[1]]);
                    }
                }
            } else {
                res.push([time, pad.unwrap_or(last[1])]);
            }
        }
    }
    res
}

/// Align two vectors on a shared time base built from both of them.
///
/// Returns false (leaving the inputs untouched) when the merged base is
/// empty, e.g. a null intersection.
pub fn resample_pair(a: &mut SampleVector, b: &mut SampleVector, opts: ResampleOptions) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let xs_a: Vec<f64> = a.iter().map(|s| s[0]).collect();
    let xs_b: Vec<f64> = b.iter().map(|s| s[0]).collect();
    let times = extract_times(&[&xs_a, &xs_b], opts.policy);
    if times.is_empty() {
        return false;
    }
    *a = resample_onto(a, &times, &opts);
    *b = resample_onto(b, &times, &opts);
    true
}

/// Align every vector in the list on one shared time base.
pub fn resample_all(vectors: &mut [SampleVector], opts: ResampleOptions) -> bool {
    if vectors.is_empty() {
        return false;
    }
    if vectors.len() == 1 {
        return true;
    }
    let xs: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| v.iter().map(|s| s[0]).collect())
        .collect();
    let refs: Vec<&[f64]> = xs.iter().map(|v| v.as_slice()).collect();
    let times = extract_times(&refs, opts.policy);
    if times.is_empty() {
        return false;
    }
    for v in vectors.iter_mut() {
        *v = resample_onto(v, &times, &opts);
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear(start: f64, step: f64, n: usize) -> SampleVector {
        (0..n)
            .map(|i| [start + i as f64 * step, start + i as f64 * step])
            .collect()
    }

    #[test]
    fn boundaries_take_union_and_min_median_sampling() {
        let a = linear(0.0, 2.0, 5); // 0..8, delta 2
        let b = linear(3.0, 0.5, 9); // 3..7, delta 0.5
        let (range, sampling) = find_boundaries(&[a, b]);
        assert_eq!(range, TimeRange::new(0.0, 8.0));
        assert_eq!(sampling, Some(0.5));
    }

    #[test]
    fn boundaries_of_nothing_are_invalid() {
        let (range, sampling) = find_boundaries(&[]);
        assert!(!range.is_valid());
        assert!(sampling.is_none());

        let (range, sampling) = find_boundaries(&[vec![[1.0, 7.0]]]);
        assert!(range.is_valid());
        assert_eq!(range.width(), 0.0);
        assert!(sampling.is_none());
    }

    #[test]
    fn resample_output_length_is_exact() {
        let v = linear(0.0, 1.0, 11);
        for (width, sampling) in [(10.0, 2.0), (10.0, 3.0), (7.0, 0.5)] {
            let out = resample_vector(&v, TimeRange::new(0.0, width), sampling);
            assert_eq!(out.len(), (width / sampling + 1.0).floor() as usize);
        }
        assert!(resample_vector(&v, TimeRange::new(0.0, 10.0), 0.0).is_empty());
        assert!(resample_vector(&v, TimeRange::new(0.0, 10.0), -1.0).is_empty());
    }

    #[test]
    fn resample_interpolates_and_extrapolates_flat() {
        let v = vec![[2.0, 10.0], [4.0, 20.0], [8.0, 40.0]];
        let out = resample_vector(&v, TimeRange::new(0.0, 10.0), 1.0);
        assert_eq!(out.len(), 11);
        // Flat before the first sample.
        assert_eq!(out[0], [0.0, 10.0]);
        assert_eq!(out[1], [1.0, 10.0]);
        // Exact matches.
        assert_eq!(out[2], [2.0, 10.0]);
        assert_eq!(out[4], [4.0, 20.0]);
        // Linear in between.
        assert_eq!(out[3], [3.0, 15.0]);
        assert_eq!(out[6], [6.0, 30.0]);
        // Flat after the last sample.
        assert_eq!(out[9], [9.0, 40.0]);
        assert_eq!(out[10], [10.0, 40.0]);
    }

    #[test]
    fn resampling_is_idempotent() {
        let v = vec![[0.0, 1.0], [1.5, 3.0], [2.0, -1.0], [5.5, 0.5]];
        let range = TimeRange::new(0.0, 5.5);
        let once = resample_vector(&v, range, 0.5);
        let twice = resample_vector(&once, range, 0.5);
        assert_eq!(once, twice);
    }

    #[test]
    fn auto_variant_resamples_on_union() {
        let a = linear(0.0, 1.0, 5);
        let b = linear(2.0, 1.0, 5);
        let out = resample_vectors_auto(&[a, b]);
        assert_eq!(out.len(), 2);
        // Union range 0..6, sampling 1 -> 7 samples each.
        assert_eq!(out[0].len(), 7);
        assert_eq!(out[1].len(), 7);
        assert_eq!(out[0][0][0], 0.0);
        assert_eq!(out[0][6][0], 6.0);
    }

    #[test]
    fn extract_times_unions_distinct_values() {
        let a = [0.0, 1.0, 3.0];
        let b = [1.0, 2.0, 4.0];
        let t = extract_times(&[&a, &b], ResamplePolicy::Union);
        assert_eq!(t, vec![0.0, 1.0, 2.0, 3.0, 4.0]);
        // Sorted and strictly increasing.
        assert!(t.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn extract_times_splits_on_nan_sentinel() {
        let a = [0.0, 2.0, f64::NAN, 1.0, 3.0];
        let b = [2.5];
        let t = extract_times(&[&a, &b], ResamplePolicy::Union);
        assert_eq!(t, vec![0.0, 1.0, 2.0, 2.5, 3.0]);
    }

    #[test]
    fn extract_times_intersection_trims_to_overlap() {
        let a = [0.0, 1.0, 2.0, 3.0];
        let b = [2.0, 3.0, 4.0];
        let t = extract_times(&[&a, &b], ResamplePolicy::Intersection);
        assert!(!t.is_empty());
        assert!(t.iter().all(|&x| (2.0..=3.0).contains(&x)));

        let c = [10.0, 11.0];
        let t = extract_times(&[&a, &c], ResamplePolicy::Intersection);
        assert!(t.is_empty());
    }

    #[test]
    fn pair_union_pads_by_holding_boundaries() {
        let mut a = vec![[0.0, 1.0], [1.0, 2.0]];
        let mut b = vec![[1.0, 10.0], [2.0, 20.0]];
        assert!(resample_pair(
            &mut a,
            &mut b,
            ResampleOptions {
                policy: ResamplePolicy::Union,
                ..Default::default()
            }
        ));
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 3);
        // b holds its first value before its own range, a holds its last.
        assert_eq!(b[0], [0.0, 10.0]);
        assert_eq!(a[2], [2.0, 2.0]);
    }

    #[test]
    fn pair_union_constant_padding() {
        let mut a = vec![[0.0, 1.0], [1.0, 2.0]];
        let mut b = vec![[1.0, 10.0], [2.0, 20.0]];
        assert!(resample_pair(
            &mut a,
            &mut b,
            ResampleOptions {
                policy: ResamplePolicy::Union,
                interpolate: true,
                padding: Padding::Constant(0.0),
            }
        ));
        assert_eq!(b[0], [0.0, 0.0]);
        assert_eq!(a[2], [2.0, 0.0]);
    }

    #[test]
    fn pair_with_empty_vector_fails() {
        let mut a = vec![[0.0, 1.0]];
        let mut b = SampleVector::new();
        assert!(!resample_pair(&mut a, &mut b, ResampleOptions::default()));
        assert_eq!(a, vec![[0.0, 1.0]]);
    }

    #[test]
    fn all_aligns_three_vectors() {
        let mut vecs = vec![
            vec![[0.0, 0.0], [2.0, 2.0]],
            vec![[1.0, 1.0], [2.0, 0.0]],
            vec![[0.5, 5.0], [3.0, 5.0]],
        ];
        assert!(resample_all(
            &mut vecs,
            ResampleOptions {
                policy: ResamplePolicy::Union,
                ..Default::default()
            }
        ));
        let n = vecs[0].len();
        assert!(vecs.iter().all(|v| v.len() == n));
        let times: Vec<f64> = vecs[0].iter().map(|s| s[0]).collect();
        assert!(vecs
            .iter()
            .all(|v| v.iter().map(|s| s[0]).eq(times.iter().copied())));
    }
}
