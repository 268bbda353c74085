//! Percentile extraction.
//!
//! Linear interpolation between the two order statistics bracketing the
//! target rank (the "linear" method, type 7 in Hyndman & Fan):
//!
//! ```text
//! h = (p / 100) · (n - 1)
//! Q(p) = x₍⌊h⌋₎ + (h - ⌊h⌋) · (x₍⌊h⌋+1₎ - x₍⌊h⌋₎)
//! ```
//!
//! # References
//!
//! Hyndman, R.J. & Fan, Y. (1996). "Sample Quantiles in Statistical
//! Packages", *The American Statistician* 50(4), pp. 361-365.
//!
//! # Examples
//!
//! ```
//! use u_nfit::percentile::percentile;
//!
//! let data = [15.0, 20.0, 35.0, 40.0, 50.0];
//! assert_eq!(percentile(&data, 50.0).unwrap(), 35.0);
//! assert_eq!(percentile(&data, 75.0).unwrap(), 40.0);
//! assert!((percentile(&data, 40.0).unwrap() - 29.0).abs() < 1e-10);
//! ```

use u_numflow::stats;

use crate::error::{FitError, Result};

/// Computes the `p`-th percentile of `data`, `p ∈ [0, 100]`.
///
/// The input does not need to be sorted. Interpolation is delegated to
/// `u_numflow::stats::quantile` with `q = p / 100`.
///
/// # Errors
///
/// - [`FitError::EmptyInput`] if `data` is empty
/// - [`FitError::InvalidParameter`] if `p` is outside [0, 100] or not finite
/// - [`FitError::NonFiniteInput`] if any value is NaN or infinite
pub fn percentile(data: &[f64], p: f64) -> Result<f64> {
    if !p.is_finite() || !(0.0..=100.0).contains(&p) {
        return Err(FitError::invalid(
            "percentile",
            format!("must be in [0, 100], got {p}"),
        ));
    }
    if data.is_empty() {
        return Err(FitError::EmptyInput);
    }
    if let Some(index) = data.iter().position(|v| !v.is_finite()) {
        return Err(FitError::NonFiniteInput { index });
    }

    stats::quantile(data, p / 100.0).ok_or(FitError::EmptyInput)
}
