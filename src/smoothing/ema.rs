//! Exponential Moving Average (EMA) with ignore-missing semantics.
//!
//! # Algorithm
//!
//! ```text
//! S_f = x_f                          (f = first defined sample)
//! S_t = α x_t + (1 - α) S_{t-1}      (x_t defined)
//! S_t = S_{t-1}                      (x_t missing)
//! ```
//!
//! where α ∈ (0, 1] is the smoothing constant. A span `s ≥ 1` maps to
//! `α = 2 / (s + 1)`.
//!
//! Missing samples are encoded as `NaN`. Positions before the first defined
//! sample stay `NaN`; later missing samples carry the previous level forward
//! without perturbing the recurrence.

use crate::error::{FitError, Result};

/// Exponential moving average smoother.
///
/// # Examples
///
/// ```
/// use u_nfit::smoothing::Ema;
///
/// let ema = Ema::new(0.5).unwrap();
/// let y = ema.smooth(&[10.0, 20.0, f64::NAN, 30.0]).unwrap();
/// assert_eq!(y, vec![10.0, 15.0, 15.0, 22.5]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ema {
    alpha: f64,
}

impl Ema {
    /// Creates a smoother with smoothing constant `alpha`.
    ///
    /// # Errors
    ///
    /// [`FitError::InvalidParameter`] if alpha is non-finite or outside (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        if !alpha.is_finite() || alpha <= 0.0 || alpha > 1.0 {
            return Err(FitError::invalid(
                "alpha",
                format!("must be in (0, 1], got {alpha}"),
            ));
        }
        Ok(Self { alpha })
    }

    /// Creates a smoother from a span, `α = 2 / (span + 1)`.
    ///
    /// # Errors
    ///
    /// [`FitError::InvalidParameter`] if `span` is zero.
    pub fn from_span(span: u32) -> Result<Self> {
        if span == 0 {
            return Err(FitError::invalid("span", "must be at least 1"));
        }
        Self::new(span_to_alpha(span))
    }

    /// Returns the smoothing constant α.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Smooths `data` in a single forward pass.
    ///
    /// The output has the same length as `data`. An empty input yields an
    /// empty output.
    ///
    /// # Errors
    ///
    /// [`FitError::NonFiniteInput`] on an infinite sample.
    pub fn smooth(&self, data: &[f64]) -> Result<Vec<f64>> {
        let mut state = self.stream();
        let mut smoothed = Vec::with_capacity(data.len());
        for &x in data {
            smoothed.push(state.update(x)?.unwrap_or(f64::NAN));
        }
        Ok(smoothed)
    }

    /// Starts a streaming computation that yields the same values as
    /// [`smooth`](Self::smooth), one sample at a time.
    pub fn stream(&self) -> EmaStream {
        EmaStream {
            alpha: self.alpha,
            level: None,
            seen: 0,
        }
    }
}

/// Incremental EMA state.
#[derive(Debug, Clone)]
pub struct EmaStream {
    alpha: f64,
    level: Option<f64>,
    seen: usize,
}

impl EmaStream {
    /// Feeds one sample (`NaN` = missing) and returns the current level.
    ///
    /// Returns `Ok(None)` while no defined sample has been seen yet.
    ///
    /// # Errors
    ///
    /// [`FitError::NonFiniteInput`] on an infinite sample.
    pub fn update(&mut self, x: f64) -> Result<Option<f64>> {
        let index = self.seen;
        self.seen += 1;

        if x.is_infinite() {
            return Err(FitError::NonFiniteInput { index });
        }
        if x.is_nan() {
            return Ok(self.level);
        }

        let next = match self.level {
            None => x,
            Some(s) => self.alpha * x + (1.0 - self.alpha) * s,
        };
        self.level = Some(next);
        Ok(self.level)
    }

    /// Current level, if any defined sample has been seen.
    pub fn level(&self) -> Option<f64> {
        self.level
    }
}

/// Converts an EMA span to its smoothing constant.
pub fn span_to_alpha(span: u32) -> f64 {
    2.0 / (f64::from(span) + 1.0)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn output_within_input_range(
            data in proptest::collection::vec(-1e3_f64..1e3, 1..=60),
            alpha in 0.001_f64..=1.0,
        ) {
            let y = Ema::new(alpha).unwrap().smooth(&data).unwrap();
            let lo = data.iter().cloned().fold(f64::INFINITY, f64::min);
            let hi = data.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            prop_assert_eq!(y.len(), data.len());
            prop_assert_eq!(y[0], data[0]);
            for v in y {
                prop_assert!(v >= lo - 1e-9 && v <= hi + 1e-9, "v = {}", v);
            }
        }
    }
}
