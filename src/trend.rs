//! Linear growth trend.
//!
//! Ordinary least squares line fit over day-indexed percentile values.
//!
//! # Examples
//!
//! ```
//! use u_nfit::trend::fit_trend;
//!
//! let t = [0.5, 1.5, 2.5, 3.5];
//! let v = [2.0, 2.5, 3.0, 3.5];
//! let m = fit_trend(&t, &v).unwrap();
//! assert!((m.slope - 0.5).abs() < 1e-10);
//! assert!((m.intercept - 1.75).abs() < 1e-10);
//! ```

use serde::{Deserialize, Serialize};
use u_numflow::stats;

use crate::daily::DailyPoint;
use crate::error::{FitError, Result};

/// Fitted line `v = intercept + slope · t`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendModel {
    /// Growth per unit of `t` (per day for daily aggregates).
    pub slope: f64,
    /// Value at `t = 0`.
    pub intercept: f64,
    /// Coefficient of determination (R²); 1 when the values have no spread.
    pub r_squared: f64,
    /// Number of points fitted.
    pub n: usize,
}

impl TrendModel {
    /// Evaluates the line at `t`.
    pub fn predict(&self, t: f64) -> f64 {
        self.intercept + self.slope * t
    }
}

/// Fits a least-squares line through `(t[i], v[i])`.
///
/// # Algorithm
///
/// β₁ = cov(t,v) / var(t)
/// β₀ = v̄ - β₁·t̄
///
/// # Errors
///
/// - [`FitError::LengthMismatch`] if the slices differ in length
/// - [`FitError::InsufficientTrendData`] if fewer than 2 points are given
/// - [`FitError::NonFiniteInput`] if any coordinate is NaN or infinite
/// - [`FitError::InvalidParameter`] if `t` has zero variance
///
/// # References
///
/// Draper & Smith (1998). "Applied Regression Analysis", 3rd edition.
pub fn fit_trend(t: &[f64], v: &[f64]) -> Result<TrendModel> {
    let n = t.len();
    if n != v.len() {
        return Err(FitError::LengthMismatch {
            left: n,
            right: v.len(),
        });
    }
    if n < 2 {
        return Err(FitError::InsufficientTrendData { points: n });
    }
    if let Some(index) = t
        .iter()
        .zip(v)
        .position(|(a, b)| !a.is_finite() || !b.is_finite())
    {
        return Err(FitError::NonFiniteInput { index });
    }

    let insufficient = || FitError::InsufficientTrendData { points: n };
    let t_mean = stats::mean(t).ok_or_else(insufficient)?;
    let v_mean = stats::mean(v).ok_or_else(insufficient)?;
    let t_var = stats::variance(t).ok_or_else(insufficient)?;
    let cov = stats::covariance(t, v).ok_or_else(insufficient)?;

    if t_var < 1e-300 {
        return Err(FitError::invalid("t", "abscissa has zero variance"));
    }

    let slope = cov / t_var;
    let intercept = v_mean - slope * t_mean;

    let ss_res: f64 = t
        .iter()
        .zip(v)
        .map(|(&ti, &vi)| (vi - (intercept + slope * ti)).powi(2))
        .sum();
    let ss_tot: f64 = v.iter().map(|&vi| (vi - v_mean).powi(2)).sum();
    let r_squared = if ss_tot > 1e-300 {
        1.0 - ss_res / ss_tot
    } else {
        1.0
    };

    Ok(TrendModel {
        slope,
        intercept,
        r_squared,
        n,
    })
}

/// Fits a trend over daily aggregate points.
///
/// # Errors
///
/// Same as [`fit_trend`].
pub fn fit_daily_trend(points: &[DailyPoint]) -> Result<TrendModel> {
    let (t, v): (Vec<f64>, Vec<f64>) = points.iter().map(|p| (p.day_index, p.value)).unzip();
    fit_trend(&t, &v)
}

/// Fits the trend over every growing prefix of `points` that has at least
/// two entries. Element `i` is the fit over `points[..i + 2]`.
///
/// # Errors
///
/// Propagates contract violations from [`fit_trend`]. Fewer than two points
/// yield an empty vector.
pub fn progressive_trend(points: &[DailyPoint]) -> Result<Vec<TrendModel>> {
    (2..=points.len())
        .map(|end| fit_daily_trend(&points[..end]))
        .collect()
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn residuals_sum_to_zero(
            v in proptest::collection::vec(-1e3_f64..1e3, 2..=40)
        ) {
            let t: Vec<f64> = (0..v.len()).map(|d| d as f64 + 0.5).collect();
            let m = fit_trend(&t, &v).unwrap();
            let sum: f64 = t.iter().zip(&v).map(|(&ti, &vi)| vi - m.predict(ti)).sum();
            prop_assert!(sum.abs() < 1e-6, "residual sum = {}", sum);
            prop_assert!(m.r_squared >= -0.01 && m.r_squared <= 1.01);
        }
    }
}
