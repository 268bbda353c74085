//! Per-day aggregation of a smoothed series.
//!
//! The series is cut into consecutive buckets of `samples_per_day` samples.
//! Each non-empty bucket contributes one point: its 95th percentile, placed
//! at the middle of the day (`day + 0.5`) so the downstream trend line is
//! fitted against bucket centres.
//!
//! # Examples
//!
//! ```
//! use u_nfit::daily::daily_percentiles;
//!
//! let smoothed = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
//! let points = daily_percentiles(&smoothed, 4, 2).unwrap();
//! assert_eq!(points.len(), 2);
//! assert_eq!(points[0].day_index, 0.5);
//! assert_eq!(points[1].day_index, 1.5);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::percentile::percentile;

/// Percentile taken within each day bucket.
pub const DAILY_PERCENTILE: f64 = 95.0;

/// One aggregated day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Bucket centre, `day + 0.5`.
    pub day_index: f64,
    /// P95 of the bucket's defined samples.
    pub value: f64,
}

/// Computes the daily P95 of `smoothed` over `num_days` buckets.
///
/// Buckets past the end of the data, and buckets holding only missing
/// (`NaN`) samples, produce no point.
///
/// # Errors
///
/// - [`FitError::InvalidParameter`] if `samples_per_day` is zero
/// - [`FitError::NonFiniteInput`] if a sample is infinite
pub fn daily_percentiles(
    smoothed: &[f64],
    samples_per_day: usize,
    num_days: usize,
) -> Result<Vec<DailyPoint>> {
    if samples_per_day == 0 {
        return Err(FitError::invalid("samples_per_day", "must be at least 1"));
    }

    let n = smoothed.len();
    let mut points = Vec::new();

    for day in 0..num_days {
        let start = day.saturating_mul(samples_per_day);
        if start >= n {
            break;
        }
        let end = start.saturating_add(samples_per_day).min(n);

        let mut bucket = Vec::with_capacity(end - start);
        for (offset, &v) in smoothed[start..end].iter().enumerate() {
            if v.is_infinite() {
                return Err(FitError::NonFiniteInput {
                    index: start + offset,
                });
            }
            if !v.is_nan() {
                bucket.push(v);
            }
        }

        match percentile(&bucket, DAILY_PERCENTILE) {
            Ok(value) => points.push(DailyPoint {
                day_index: day as f64 + 0.5,
                value,
            }),
            Err(FitError::EmptyInput) => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(points)
}

/// Number of day buckets needed to cover `len` samples.
pub fn days_covering(len: usize, samples_per_day: usize) -> usize {
    if samples_per_day == 0 {
        return 0;
    }
    len.div_ceil(samples_per_day)
}
