//! Capacity profiles and their naming convention.
//!
//! A profile name is a short human-readable code such as `O2-98W10` that
//! doubles as configuration: `98` is the sizing percentile and `W10` is the
//! span of the secondary smoothing pass applied before that percentile is
//! taken.
//!
//! # Decoding rules
//!
//! Percentile, first match wins:
//!
//! 1. `-<digits>W` (leftmost): the digits, clamped to 100.
//! 2. `P<digits>` (leftmost): the digits, if within [0, 100].
//! 3. The last digit run whose value lies in [70, 100].
//! 4. 90.
//!
//! Span: the digits of the leftmost `W<digits>`, floored at 1; otherwise 1.
//!
//! Only ASCII digits `0-9` form digit runs. Other Unicode decimal digits
//! (e.g. Arabic-Indic `٩٨`) are treated like any other non-digit character.
//!
//! # Examples
//!
//! ```
//! use u_nfit::profile::ProfileDescriptor;
//!
//! let d = ProfileDescriptor::decode("O2-98W10 (Tier 2, high)");
//! assert_eq!(d.percentile, 98);
//! assert_eq!(d.span, 10);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{FitError, Result};
use crate::smoothing::span_to_alpha;

const DEFAULT_PERCENTILE: u8 = 90;
const DEFAULT_SPAN: u32 = 1;

/// A named smoothing configuration.
///
/// A profile without an `alpha` is configured but disabled; it keeps its
/// place in the ordering but produces no output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    /// Profile code, e.g. `"O1-99W5"`. May carry a trailing description.
    pub name: String,
    /// Primary EMA smoothing constant in (0, 1].
    #[serde(default)]
    pub alpha: Option<f64>,
}

impl ProfileConfig {
    /// Creates an enabled profile.
    pub fn new(name: impl Into<String>, alpha: f64) -> Self {
        Self {
            name: name.into(),
            alpha: Some(alpha),
        }
    }

    /// Creates a profile that is listed but has no alpha configured.
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alpha: None,
        }
    }

    /// The standard nFit profile ladder, from most responsive (peak) to
    /// smoothest (normal).
    pub fn nfit_defaults() -> Vec<Self> {
        vec![
            Self::new("P-99W1 (Peak, extreme)", 0.50),
            Self::new("O1-99W5 (Tier 1, very-high)", 0.30),
            Self::new("O2-98W10 (Tier 2, high)", 0.15),
            Self::new("O4-90W15 (Tier 4, normal)", 0.01),
        ]
    }

    /// Decodes the percentile and span encoded in the name.
    pub fn descriptor(&self) -> ProfileDescriptor {
        ProfileDescriptor::decode(&self.name)
    }

    /// Checks that a configured alpha lies in (0, 1].
    ///
    /// # Errors
    ///
    /// [`FitError::InvalidParameter`] if the alpha is out of range.
    pub fn validate(&self) -> Result<()> {
        match self.alpha {
            Some(a) if !a.is_finite() || a <= 0.0 || a > 1.0 => Err(FitError::invalid(
                "alpha",
                format!("profile '{}': must be in (0, 1], got {a}", self.name),
            )),
            _ => Ok(()),
        }
    }
}

/// Which decoding rule produced a descriptor's percentile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DescriptorSource {
    /// `-<digits>W`
    HyphenW,
    /// `P<digits>`
    PPrefix,
    /// Last digit run in [70, 100].
    DigitScan,
    /// Nothing matched; percentile defaulted to 90.
    Default,
}

/// Percentile and secondary-smoothing span decoded from a profile name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileDescriptor {
    /// Target percentile in [0, 100].
    pub percentile: u8,
    /// Secondary EMA span, at least 1.
    pub span: u32,
    /// Rule that produced `percentile`.
    pub source: DescriptorSource,
}

impl ProfileDescriptor {
    /// Decodes a profile name. Never fails; unmatched names fall back to
    /// percentile 90 and span 1.
    pub fn decode(name: &str) -> Self {
        let runs = digit_runs(name);
        let (percentile, source) = decode_percentile(name.as_bytes(), &runs);
        let span = runs
            .iter()
            .find(|r| r.preceded_by(name.as_bytes(), b'W'))
            .map(|r| r.value.clamp(1, u64::from(u32::MAX)) as u32)
            .unwrap_or(DEFAULT_SPAN);

        Self {
            percentile,
            span,
            source,
        }
    }

    /// Whether the percentile came from the fallback default.
    pub fn is_fallback(&self) -> bool {
        self.source == DescriptorSource::Default
    }

    /// Smoothing constant of the secondary pass, `2 / (span + 1)`.
    pub fn secondary_alpha(&self) -> f64 {
        span_to_alpha(self.span)
    }
}

impl fmt::Display for ProfileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}W{}", self.percentile, self.span)
    }
}

/// A maximal run of ASCII digits, `name[start..end]`.
struct DigitRun {
    start: usize,
    end: usize,
    value: u64,
}

impl DigitRun {
    fn preceded_by(&self, bytes: &[u8], c: u8) -> bool {
        self.start > 0 && bytes[self.start - 1] == c
    }

    fn followed_by(&self, bytes: &[u8], c: u8) -> bool {
        bytes.get(self.end) == Some(&c)
    }
}

fn digit_runs(name: &str) -> Vec<DigitRun> {
    let bytes = name.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        let mut value: u64 = 0;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            value = value
                .saturating_mul(10)
                .saturating_add(u64::from(bytes[i] - b'0'));
            i += 1;
        }
        runs.push(DigitRun {
            start,
            end: i,
            value,
        });
    }
    runs
}

fn decode_percentile(bytes: &[u8], runs: &[DigitRun]) -> (u8, DescriptorSource) {
    if let Some(r) = runs
        .iter()
        .find(|r| r.preceded_by(bytes, b'-') && r.followed_by(bytes, b'W'))
    {
        return (r.value.min(100) as u8, DescriptorSource::HyphenW);
    }

    // Only the leftmost P<digits> is considered.
    if let Some(r) = runs.iter().find(|r| r.preceded_by(bytes, b'P')) {
        if r.value <= 100 {
            return (r.value as u8, DescriptorSource::PPrefix);
        }
    }

    if let Some(r) = runs.iter().rev().find(|r| (70..=100).contains(&r.value)) {
        return (r.value as u8, DescriptorSource::DigitScan);
    }

    (DEFAULT_PERCENTILE, DescriptorSource::Default)
}
