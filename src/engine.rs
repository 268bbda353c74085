//! Fit orchestration.
//!
//! [`FitEngine`] runs the whole pipeline over one raw series:
//!
//! 1. Primary EMA per enabled profile (profile alpha).
//! 2. Pxx per active profile: the EMA is smoothed a second time with the span
//!    decoded from the profile name, leading missing values are dropped, and
//!    the decoded percentile is taken.
//! 3. Daily P95 of the last active profile's EMA.
//! 4. Least-squares trend over those daily points.
//!
//! A profile is active when it has an alpha and its EMA is non-empty.
//! Inactive profiles are skipped without shifting the others.
//!
//! # Examples
//!
//! ```
//! use u_nfit::engine::{FitConfig, FitEngine};
//! use u_nfit::profile::ProfileConfig;
//!
//! let raw: Vec<f64> = (0..48).map(|i| 2.0 + i as f64 * 0.1).collect();
//! let engine = FitEngine::new(FitConfig::default()).unwrap();
//! let result = engine.fit(&raw, &ProfileConfig::nfit_defaults()).unwrap();
//!
//! assert_eq!(result.pxx_by_profile.len(), 4);
//! assert_eq!(result.daily_aggregate.as_ref().map(Vec::len), Some(2));
//! assert!(result.trend.unwrap().slope > 0.0);
//! ```

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::daily::{daily_percentiles, days_covering, DailyPoint};
use crate::error::{FitError, Result};
use crate::percentile::percentile;
use crate::profile::{ProfileConfig, ProfileDescriptor};
use crate::smoothing::Ema;
use crate::trend::{fit_daily_trend, TrendModel};

/// Sampling layout of the raw series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitConfig {
    /// Samples per day bucket.
    pub samples_per_day: usize,
    /// Total days to aggregate. Derived from the series length when unset.
    #[serde(default)]
    pub num_days: Option<usize>,
}

impl Default for FitConfig {
    /// Hourly samples, day count derived from the data.
    fn default() -> Self {
        Self {
            samples_per_day: 24,
            num_days: None,
        }
    }
}

impl FitConfig {
    /// Creates a config with the day count derived from the data.
    pub fn new(samples_per_day: usize) -> Self {
        Self {
            samples_per_day,
            num_days: None,
        }
    }

    /// Sets an explicit day count.
    pub fn with_num_days(mut self, num_days: usize) -> Self {
        self.num_days = Some(num_days);
        self
    }

    /// # Errors
    ///
    /// [`FitError::InvalidParameter`] if `samples_per_day` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.samples_per_day == 0 {
            return Err(FitError::invalid("samples_per_day", "must be at least 1"));
        }
        Ok(())
    }
}

/// Primary EMA of one active profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileSeries {
    /// Profile name as configured.
    pub name: String,
    /// Primary EMA, aligned index-for-index with the raw series.
    pub values: Vec<f64>,
}

/// Sizing percentile of one active profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PxxEntry {
    /// Profile name as configured.
    pub name: String,
    /// Percentile decoded from the name.
    pub percentile: u8,
    /// Span of the secondary smoothing pass.
    pub span: u32,
    /// `None` when the twice-smoothed series holds no defined sample.
    pub value: Option<f64>,
}

/// Output of a fit run. Profile-keyed lists follow the configured order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    /// Primary EMA of each active profile.
    pub ema_by_profile: Vec<ProfileSeries>,
    /// Sizing percentile of each active profile.
    pub pxx_by_profile: Vec<PxxEntry>,
    /// `None` when no profile is active.
    pub daily_aggregate: Option<Vec<DailyPoint>>,
    /// `None` when fewer than two daily points exist.
    pub trend: Option<TrendModel>,
}

impl FitResult {
    /// Name of the profile the daily aggregate and trend were computed from.
    pub fn last_active_profile(&self) -> Option<&str> {
        self.ema_by_profile.last().map(|s| s.name.as_str())
    }

    /// Primary EMA of the named profile.
    pub fn ema(&self, name: &str) -> Option<&[f64]> {
        self.ema_by_profile
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.values.as_slice())
    }

    /// Pxx entry of the named profile.
    pub fn pxx(&self, name: &str) -> Option<&PxxEntry> {
        self.pxx_by_profile.iter().find(|p| p.name == name)
    }
}

/// Runs the fit pipeline for a fixed sampling layout.
#[derive(Debug, Clone)]
pub struct FitEngine {
    config: FitConfig,
}

impl FitEngine {
    /// # Errors
    ///
    /// [`FitError::InvalidParameter`] if the config is invalid.
    pub fn new(config: FitConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the sampling layout.
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fits every profile against `raw` (`NaN` marks a missing sample).
    ///
    /// # Errors
    ///
    /// - [`FitError::InvalidParameter`] if a profile alpha is outside (0, 1]
    /// - [`FitError::NonFiniteInput`] if `raw` holds an infinite value
    pub fn fit(&self, raw: &[f64], profiles: &[ProfileConfig]) -> Result<FitResult> {
        for profile in profiles {
            profile.validate()?;
        }
        if let Some(index) = raw.iter().position(|v| v.is_infinite()) {
            return Err(FitError::NonFiniteInput { index });
        }

        #[cfg(feature = "parallel")]
        let emas: Vec<Option<Vec<f64>>> = profiles
            .par_iter()
            .map(|p| primary_ema(p, raw))
            .collect::<Result<_>>()?;
        #[cfg(not(feature = "parallel"))]
        let emas: Vec<Option<Vec<f64>>> = profiles
            .iter()
            .map(|p| primary_ema(p, raw))
            .collect::<Result<_>>()?;

        let mut ema_by_profile = Vec::new();
        for (profile, ema) in profiles.iter().zip(emas) {
            match ema {
                Some(values) if !values.is_empty() => ema_by_profile.push(ProfileSeries {
                    name: profile.name.clone(),
                    values,
                }),
                Some(_) => debug!(profile = %profile.name, "empty EMA; profile inactive"),
                None => warn!(profile = %profile.name, "no alpha configured; profile skipped"),
            }
        }

        let pxx_by_profile = ema_by_profile
            .iter()
            .map(profile_pxx)
            .collect::<Result<Vec<_>>>()?;

        if ema_by_profile.is_empty() {
            debug!("no active profiles; daily aggregate and trend unavailable");
            return Ok(FitResult {
                ema_by_profile,
                pxx_by_profile,
                daily_aggregate: None,
                trend: None,
            });
        }
        let smoothest = &ema_by_profile[ema_by_profile.len() - 1];

        let k = self.config.samples_per_day;
        let num_days = self
            .config
            .num_days
            .unwrap_or_else(|| days_covering(smoothest.values.len(), k));
        let daily = daily_percentiles(&smoothest.values, k, num_days)?;
        debug!(
            profile = %smoothest.name,
            num_days,
            points = daily.len(),
            "aggregated daily P95"
        );

        let trend = match fit_daily_trend(&daily) {
            Ok(model) => {
                debug!(slope = model.slope, intercept = model.intercept, "fitted trend");
                Some(model)
            }
            Err(FitError::InsufficientTrendData { points }) => {
                debug!(points, "trend unavailable");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FitResult {
            ema_by_profile,
            pxx_by_profile,
            daily_aggregate: Some(daily),
            trend,
        })
    }
}

/// Fits `profiles` against `raw` with `samples_per_day` and a day count
/// derived from the series length.
///
/// # Errors
///
/// See [`FitEngine::new`] and [`FitEngine::fit`].
pub fn fit(raw: &[f64], profiles: &[ProfileConfig], samples_per_day: usize) -> Result<FitResult> {
    FitEngine::new(FitConfig::new(samples_per_day))?.fit(raw, profiles)
}

fn primary_ema(profile: &ProfileConfig, raw: &[f64]) -> Result<Option<Vec<f64>>> {
    let Some(alpha) = profile.alpha else {
        return Ok(None);
    };
    let values = Ema::new(alpha)?.smooth(raw)?;
    debug!(profile = %profile.name, alpha, len = values.len(), "computed primary EMA");
    Ok(Some(values))
}

fn profile_pxx(series: &ProfileSeries) -> Result<PxxEntry> {
    let descriptor = ProfileDescriptor::decode(&series.name);
    if descriptor.is_fallback() {
        debug!(profile = %series.name, "no percentile in name; using default");
    }

    let resmoothed = Ema::from_span(descriptor.span)?.smooth(&series.values)?;
    let defined: Vec<f64> = resmoothed.into_iter().skip_while(|v| v.is_nan()).collect();

    let value = match percentile(&defined, f64::from(descriptor.percentile)) {
        Ok(v) => Some(v),
        Err(FitError::EmptyInput) => {
            warn!(profile = %series.name, "no defined samples; Pxx unavailable");
            None
        }
        Err(e) => return Err(e),
    };
    debug!(profile = %series.name, %descriptor, ?value, "computed Pxx");

    Ok(PxxEntry {
        name: series.name.clone(),
        percentile: descriptor.percentile,
        span: descriptor.span,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(result: &FitResult) -> Vec<&str> {
        result.pxx_by_profile.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn end_to_end_identity_profile() {
        let raw = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0];
        let profiles = [ProfileConfig::new("X-95W1", 1.0)];
        let r = fit(&raw, &profiles, 4).expect("should fit");

        assert_eq!(r.ema("X-95W1").unwrap(), &raw[..]);
        let daily = r.daily_aggregate.as_ref().expect("daily aggregate");
        assert_eq!(
            daily,
            &vec![
                DailyPoint {
                    day_index: 0.5,
                    value: percentile(&[1.0, 2.0, 3.0, 4.0], 95.0).unwrap(),
                },
                DailyPoint {
                    day_index: 1.5,
                    value: percentile(&[5.0, 6.0, 7.0, 8.0], 95.0).unwrap(),
                },
            ]
        );
        let trend = r.trend.expect("trend");
        assert!(trend.slope > 0.0);
        assert!((trend.slope - 4.0).abs() < 1e-10);

        let pxx = r.pxx("X-95W1").unwrap();
        assert_eq!((pxx.percentile, pxx.span), (95, 1));
        assert_eq!(pxx.value, Some(percentile(&raw, 95.0).unwrap()));
    }

    #[test]
    fn pxx_uses_two_stage_smoothing() {
        // primary α = 0.5:   [0, 2, 5, 4.5]
        // secondary W3 → α = 0.5: [0, 1, 3, 3.75]
        let raw = [0.0, 4.0, 8.0, 4.0];
        let profiles = [
            ProfileConfig::new("R-100W3", 0.5),
            ProfileConfig::new("R-50W3", 0.5),
        ];
        let r = fit(&raw, &profiles, 4).expect("should fit");

        assert_eq!(r.ema("R-100W3").unwrap(), &[0.0, 2.0, 5.0, 4.5][..]);
        assert_eq!(r.pxx("R-100W3").unwrap().value, Some(3.75));
        assert_eq!(r.pxx("R-50W3").unwrap().value, Some(2.0));
    }

    #[test]
    fn inactive_profiles_do_not_shift_alignment() {
        let raw: Vec<f64> = (0..16).map(|i| i as f64).collect();
        let profiles = [
            ProfileConfig::disabled("O0-99W1"),
            ProfileConfig::new("O1-99W5", 0.3),
            ProfileConfig::new("O2-98W10", 1.0),
            ProfileConfig::disabled("O3-95W15"),
        ];
        let r = fit(&raw, &profiles, 4).expect("should fit");

        assert_eq!(names(&r), vec!["O1-99W5", "O2-98W10"]);
        assert_eq!(r.last_active_profile(), Some("O2-98W10"));
        assert!(r.pxx("O3-95W15").is_none());

        // alpha = 1 on the last active profile: daily P95 of the raw buckets
        let daily = r.daily_aggregate.unwrap();
        assert_eq!(daily.len(), 4);
        assert_eq!(daily[0].value, percentile(&raw[..4], 95.0).unwrap());
    }

    #[test]
    fn no_active_profiles() {
        let profiles = [ProfileConfig::disabled("A"), ProfileConfig::disabled("B")];
        let r = fit(&[1.0, 2.0, 3.0], &profiles, 2).expect("should fit");
        assert!(r.ema_by_profile.is_empty());
        assert!(r.pxx_by_profile.is_empty());
        assert!(r.daily_aggregate.is_none());
        assert!(r.trend.is_none());
        assert_eq!(r.last_active_profile(), None);
    }

    #[test]
    fn empty_series_has_no_active_profiles() {
        let r = fit(&[], &ProfileConfig::nfit_defaults(), 24).expect("should fit");
        assert!(r.pxx_by_profile.is_empty());
        assert!(r.daily_aggregate.is_none());
        assert!(r.trend.is_none());
    }

    #[test]
    fn single_day_has_no_trend() {
        let r = fit(&[1.0, 2.0, 3.0], &[ProfileConfig::new("A-90W2", 0.5)], 24)
            .expect("should fit");
        assert_eq!(r.daily_aggregate.as_ref().map(Vec::len), Some(1));
        assert!(r.trend.is_none());
    }

    #[test]
    fn all_missing_series() {
        let raw = [f64::NAN; 6];
        let r = fit(&raw, &[ProfileConfig::new("A-90W2", 0.5)], 3).expect("should fit");
        assert_eq!(r.pxx_by_profile.len(), 1);
        assert_eq!(r.pxx_by_profile[0].value, None);
        assert_eq!(r.daily_aggregate, Some(vec![]));
        assert!(r.trend.is_none());
    }

    #[test]
    fn leading_missing_dropped_before_pxx() {
        let raw = [f64::NAN, f64::NAN, 2.0, 4.0];
        let r = fit(&raw, &[ProfileConfig::new("A-0W1", 1.0)], 4).expect("should fit");
        assert_eq!(r.pxx("A-0W1").unwrap().value, Some(2.0));
    }

    #[test]
    fn explicit_day_count_limits_buckets() {
        let raw: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let engine = FitEngine::new(FitConfig::new(4).with_num_days(3)).unwrap();
        let r = engine
            .fit(&raw, &[ProfileConfig::new("A", 1.0)])
            .expect("should fit");
        let daily = r.daily_aggregate.unwrap();
        assert_eq!(daily.len(), 3);
        assert_eq!(daily[2].day_index, 2.5);
        assert_eq!(r.trend.unwrap().n, 3);
    }

    #[test]
    fn fallback_descriptor_reported() {
        let r = fit(&[1.0, 2.0], &[ProfileConfig::new("mystery", 0.5)], 2).unwrap();
        let pxx = r.pxx("mystery").unwrap();
        assert_eq!((pxx.percentile, pxx.span), (90, 1));
    }

    #[test]
    fn contract_violations_fail() {
        assert!(matches!(
            fit(&[1.0], &[ProfileConfig::new("A", 1.5)], 4),
            Err(FitError::InvalidParameter { .. })
        ));
        assert_eq!(
            fit(&[1.0, f64::NEG_INFINITY], &[ProfileConfig::new("A", 0.5)], 4),
            Err(FitError::NonFiniteInput { index: 1 })
        );
        assert!(FitEngine::new(FitConfig::new(0)).is_err());
    }

    #[test]
    fn synthetic_growth_is_deterministic() {
        let points_per_day = 24;
        let raw: Vec<f64> = (0..90 * points_per_day)
            .map(|i| {
                let day = i as f64 / points_per_day as f64;
                3.0 + (2.0 * std::f64::consts::PI * day / 7.0).sin() + 0.025 * day
            })
            .collect();
        let profiles = ProfileConfig::nfit_defaults();

        let a = fit(&raw, &profiles, points_per_day).expect("should fit");
        let b = fit(&raw, &profiles, points_per_day).expect("should fit");

        assert_eq!(a, b);
        assert_eq!(a.last_active_profile(), Some("O4-90W15 (Tier 4, normal)"));
        assert_eq!(a.daily_aggregate.as_ref().map(Vec::len), Some(90));
        assert!(a.trend.unwrap().slope > 0.0);
        for p in &a.pxx_by_profile {
            assert!(p.value.is_some());
        }
    }

    #[test]
    fn config_from_json() {
        let c: FitConfig = serde_json::from_str(r#"{"samples_per_day": 12}"#).unwrap();
        assert_eq!(c, FitConfig::new(12));
        let c: FitConfig =
            serde_json::from_str(r#"{"samples_per_day": 12, "num_days": 30}"#).unwrap();
        assert_eq!(c.num_days, Some(30));
        assert_eq!(FitConfig::default().samples_per_day, 24);
    }
}
