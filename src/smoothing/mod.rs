//! Time series smoothing.
//!
//! Exponential smoothing of utilization samples. Each capacity profile runs
//! the raw series through an [`Ema`] once with its primary alpha, and once
//! more with the span decoded from its name before its sizing percentile is
//! taken.
//!
//! # References
//!
//! - Brown, R.G. (1956). *Exponential Smoothing for Predicting Demand*.
//! - Roberts, S.W. (1959). "Control Chart Tests Based on Geometric Moving
//!   Averages", *Technometrics* 1(3), pp. 239-250.

mod ema;

pub use ema::{span_to_alpha, Ema, EmaStream};
