//! Outlier-robust range estimation over gain map values.

use crate::types::{try_vec, Error, Result};

/// Size of one histogram bucket. Empirical value.
const BUCKET_SIZE: f32 = 0.01;
/// Fraction of samples that may be discarded as outliers (0.1%).
const MAX_OUTLIERS_RATIO: f32 = 0.001;
/// Upper bound on histogram size.
const MAX_NUM_BUCKETS: usize = 10_000;

/// Histogram bucket for a value, with out-of-range values landing in the
/// first/last buckets.
#[inline]
fn value_to_bucket_idx(v: f32, bucket_min: f32, bucket_max: f32, num_buckets: usize) -> usize {
    let v = v.clamp(bucket_min, bucket_max);
    let idx = ((v - bucket_min) / (bucket_max - bucket_min) * num_buckets as f32).round() as usize;
    idx.min(num_buckets - 1)
}

/// Lower end of the value range belonging to a histogram bucket.
#[inline]
fn bucket_idx_to_value(idx: usize, bucket_min: f32, bucket_max: f32, num_buckets: usize) -> f32 {
    idx as f32 * (bucket_max - bucket_min) / num_buckets as f32 + bucket_min
}

/// Approximate `[min, max]` of `values`, discarding up to 0.1% of samples on
/// each tail.
///
/// The trimmed bounds only ever snap to the edges of *empty* histogram
/// buckets: the range excludes whole empty buckets but never cuts through a
/// populated one, so boundary samples may remain just outside the nominal
/// outlier budget.
pub fn find_min_max_without_outliers(values: &[f32]) -> Result<(f32, f32)> {
    if values.is_empty() {
        return Err(Error::InvalidArgument(
            "cannot compute a range over zero samples".into(),
        ));
    }
    let max_outliers_on_each_side =
        (values.len() as f32 * MAX_OUTLIERS_RATIO / 2.0).round() as usize;

    let mut min = values[0];
    let mut max = values[0];
    for &v in &values[1..] {
        min = min.min(v);
        max = max.max(v);
    }

    let mut range_min = min;
    let mut range_max = max;
    if (max - min) <= BUCKET_SIZE * 2.0 || max_outliers_on_each_side == 0 {
        return Ok((range_min, range_max));
    }

    let num_buckets = (((max - min) / BUCKET_SIZE).ceil() as usize).min(MAX_NUM_BUCKETS);
    let mut histogram: Vec<u32> = try_vec(num_buckets)?;
    for &v in values {
        histogram[value_to_bucket_idx(v, min, max, num_buckets)] += 1;
    }

    let mut left_outliers = 0usize;
    for (i, &count) in histogram.iter().enumerate() {
        left_outliers += count as usize;
        if left_outliers > max_outliers_on_each_side {
            break;
        }
        if count == 0 {
            // +1 to snap to the higher end of the empty bucket.
            range_min = bucket_idx_to_value(i + 1, min, max, num_buckets);
        }
    }

    let mut right_outliers = 0usize;
    for (i, &count) in histogram.iter().enumerate().rev() {
        right_outliers += count as usize;
        if right_outliers > max_outliers_on_each_side {
            break;
        }
        if count == 0 {
            range_max = bucket_idx_to_value(i, min, max, num_buckets);
        }
    }

    Ok((range_min, range_max))
}
