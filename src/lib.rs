//! # u-nfit
//!
//! Capacity fit profiles for noisy utilization time series.
//!
//! A raw, periodically sampled series (for example CPU cores in use) is
//! smoothed once per capacity profile. Each profile yields a sizing
//! percentile (Pxx), and the smoothest profile's daily P95 values yield a
//! linear growth trend.
//!
//! ## Modules
//!
//! - [`profile`] — Profile configuration and name decoding (`O2-98W10` → P98, span 10)
//! - [`smoothing`] — Exponential moving average with ignore-missing semantics
//! - [`percentile`] — Linear-interpolation percentile
//! - [`daily`] — Per-day P95 aggregation
//! - [`trend`] — Least-squares trend over daily points
//! - [`engine`] — [`FitEngine`] orchestrating the pipeline
//!
//! ## Design Philosophy
//!
//! - **Pure**: every fit is a deterministic function of its inputs
//! - **Ordered**: profile order is preserved end-to-end; the last active
//!   profile is the smoothest by convention
//! - **Total decoding**: any profile name decodes to a percentile and span
//!
//! ## Features
//!
//! - `parallel` — compute per-profile EMAs on the `rayon` thread pool

pub mod daily;
pub mod engine;
pub mod error;
pub mod percentile;
pub mod profile;
pub mod smoothing;
pub mod trend;

pub use engine::{fit, FitConfig, FitEngine, FitResult, PxxEntry};
pub use error::{FitError, Result};
pub use profile::{ProfileConfig, ProfileDescriptor};
