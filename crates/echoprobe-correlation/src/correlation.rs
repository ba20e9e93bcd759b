// SPDX-License-Identifier: GPL-3.0-or-later

//! Cross-correlation of two fingerprints over a window of offsets.
//!
//! The score at one offset is the fraction of equal bits between the aligned
//! codes. A curve holds one score per scanned offset, in scan order, with
//! `None` wherever the sequences overlap by fewer than `min_overlap` codes.

use std::cmp::Ordering;
use std::fmt;

use echoprobe_config::{CorrelationConfig, MAX_SCAN_OFFSETS};
use serde::Serialize;
use tracing::{debug, warn};

const BITS_PER_CODE: f64 = 32.0;

/// Absorbs floating point error when counting offsets for fractional steps.
const STEP_EPSILON: f64 = 1e-9;

/// Non-fatal condition noticed while building a curve.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrelationWarning {
    /// The scan span is not smaller than the shorter fingerprint, so many
    /// offsets cannot reach the minimum overlap.
    SpanExceedsSample { span: usize, sample_len: usize },
}

impl fmt::Display for CorrelationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorrelationWarning::SpanExceedsSample { span, sample_len } => write!(
                f,
                "span ({}) >= sample size ({}); reduce span or increase sample time",
                span, sample_len
            ),
        }
    }
}

/// Fraction of matching bits between `a` and `b` with `b` shifted by `offset`.
///
/// A positive offset drops the first `offset` codes of `a`, a negative one
/// drops `|offset|` codes of `b`. Both sides are then truncated to the shorter
/// length. Returns `None` if fewer than `min_overlap` codes remain aligned.
pub fn similarity_at(a: &[u32], b: &[u32], offset: i64, min_overlap: usize) -> Option<f64> {
    let shift = usize::try_from(offset.unsigned_abs()).unwrap_or(usize::MAX);

    let (a, b) = match offset.cmp(&0) {
        Ordering::Greater => {
            let a = a.get(shift..).unwrap_or_default();
            (a, &b[..b.len().min(a.len())])
        }
        Ordering::Less => {
            let b = b.get(shift..).unwrap_or_default();
            (&a[..a.len().min(b.len())], b)
        }
        Ordering::Equal => (a, b),
    };

    let overlap = a.len().min(b.len());
    if overlap == 0 || overlap < min_overlap {
        return None;
    }

    let matching_bits: u64 = a[..overlap]
        .iter()
        .zip(&b[..overlap])
        .map(|(x, y)| u64::from(32 - (x ^ y).count_ones()))
        .sum();

    Some(matching_bits as f64 / (overlap as f64 * BITS_PER_CODE))
}

/// Number of offsets enumerated from `-span` to `+span` at `step`, or `None`
/// when the step is unusable or the scan exceeds [`MAX_SCAN_OFFSETS`].
fn offset_count(config: &CorrelationConfig) -> Option<usize> {
    if !config.step.is_finite() || config.step <= 0.0 {
        return None;
    }
    let width = (config.scan_width() + STEP_EPSILON).floor();
    if width >= MAX_SCAN_OFFSETS as f64 {
        return None;
    }
    Some(width as usize + 1)
}

/// Offset scanned at position `index` of a curve.
fn offset_at(span: usize, step: f64, index: usize) -> i64 {
    (index as f64 * step - span as f64).round() as i64
}

/// Correlation scores for every scanned offset, in scan order.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationCurve {
    span: usize,
    step: f64,
    values: Vec<Option<f64>>,
    warnings: Vec<CorrelationWarning>,
}

impl CorrelationCurve {
    /// Wrap precomputed values scanned from `-span` at `step`.
    pub fn new(span: usize, step: f64, values: Vec<Option<f64>>) -> Self {
        Self {
            span,
            step,
            values,
            warnings: Vec::new(),
        }
    }

    pub fn span(&self) -> usize {
        self.span
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no offset was enumerated at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Offset that produced the value at `index`.
    pub fn offset_at(&self, index: usize) -> i64 {
        offset_at(self.span, self.step, index)
    }

    /// Scanned offsets paired with their values.
    pub fn points(&self) -> impl Iterator<Item = (i64, Option<f64>)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(index, value)| (self.offset_at(index), *value))
    }

    pub fn defined_count(&self) -> usize {
        self.values.iter().filter(|value| value.is_some()).count()
    }

    pub fn warnings(&self) -> &[CorrelationWarning] {
        &self.warnings
    }
}

/// Score every offset from `-span` to `+span` (inclusive) at the configured step.
///
/// Empty inputs, a non-positive step and a scan wider than
/// [`MAX_SCAN_OFFSETS`] yield an empty curve. A span that is
/// not smaller than the shorter input is reported as a warning on the curve
/// and the scan still runs.
pub fn build_correlation_curve(a: &[u32], b: &[u32], config: &CorrelationConfig) -> CorrelationCurve {
    let mut curve = CorrelationCurve::new(config.span, config.step, Vec::new());

    if a.is_empty() || b.is_empty() {
        warn!(target: "correlation", "cannot correlate empty fingerprints");
        return curve;
    }

    let sample_len = a.len().min(b.len());
    if config.span >= sample_len {
        let warning = CorrelationWarning::SpanExceedsSample {
            span: config.span,
            sample_len,
        };
        warn!(target: "correlation", "{}", warning);
        curve.warnings.push(warning);
    }

    let Some(count) = offset_count(config) else {
        warn!(
            target: "correlation",
            span = config.span,
            step = config.step,
            "offset scan is empty or exceeds {} offsets", MAX_SCAN_OFFSETS
        );
        return curve;
    };
    curve.values = (0..count)
        .map(|index| similarity_at(a, b, curve.offset_at(index), config.min_overlap))
        .collect();

    debug!(
        target: "correlation",
        offsets = curve.len(),
        defined = curve.defined_count(),
        "correlation curve built"
    );

    curve
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Deterministic pseudo-random codes (xorshift32).
    fn codes(len: usize, seed: u32) -> Vec<u32> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                state
            })
            .collect()
    }

    #[test]
    fn test_identical_sequences_score_one() {
        for len in [20, 57, 300] {
            let a = codes(len, len as u32);
            assert_eq!(similarity_at(&a, &a, 0, 20), Some(1.0));
        }
    }

    #[test]
    fn test_constant_xor_score_is_content_independent() {
        for constant in [1u32, 0x0F0F_0000, 0xFFFF_FFFF, 0x8000_0001] {
            let a = codes(64, constant);
            let b: Vec<u32> = a.iter().map(|x| x ^ constant).collect();
            let expected = 1.0 - f64::from(constant.count_ones()) / 32.0;
            let score = similarity_at(&a, &b, 0, 20).unwrap();
            assert!((score - expected).abs() < 1e-12, "constant {constant:#x}: {score}");
        }
    }

    #[test]
    fn test_overlap_boundary() {
        let a = codes(30, 7);
        let b = codes(30, 8);
        assert!(similarity_at(&a, &b, 10, 20).is_some());
        assert!(similarity_at(&a, &b, -10, 20).is_some());
        assert!(similarity_at(&a, &b, 11, 20).is_none());
        assert!(similarity_at(&a, &b, -11, 20).is_none());
    }

    #[test]
    fn test_truncation_happens_after_shift() {
        let a = codes(40, 3);
        let b = codes(25, 4);
        // a[10..] has 30 codes, b keeps all 25.
        assert!(similarity_at(&a, &b, 10, 25).is_some());
        assert!(similarity_at(&a, &b, 10, 26).is_none());
        // b[10..] has 15 codes, a is cut to 15.
        assert!(similarity_at(&a, &b, -10, 15).is_some());
        assert!(similarity_at(&a, &b, -10, 16).is_none());
    }

    #[test]
    fn test_shift_aligns_sequences() {
        let base = codes(60, 11);
        let a = &base[..50];
        let b = &base[5..55];
        assert_eq!(similarity_at(a, b, 5, 20), Some(1.0));
        assert_ne!(similarity_at(a, b, -5, 20), Some(1.0));
    }

    #[test]
    fn test_offset_beyond_length_is_undefined() {
        let a = codes(30, 1);
        assert!(similarity_at(&a, &a, 31, 1).is_none());
        assert!(similarity_at(&a, &a, -1000, 1).is_none());
        assert!(similarity_at(&a, &a, i64::MIN, 1).is_none());
    }

    #[test]
    fn test_zero_overlap_is_undefined_even_without_minimum() {
        assert!(similarity_at(&[], &[], 0, 0).is_none());
    }

    #[test]
    fn test_curve_enumerates_every_offset_in_order() {
        let a = codes(300, 21);
        let curve = build_correlation_curve(&a, &a, &CorrelationConfig::default());

        assert_eq!(curve.len(), 301);
        assert_eq!(curve.offset_at(0), -150);
        assert_eq!(curve.offset_at(150), 0);
        assert_eq!(curve.offset_at(300), 150);
        assert_eq!(curve.values()[150], Some(1.0));
        assert!(curve.warnings().is_empty());
        assert_eq!(curve.defined_count(), 301);
    }

    #[test]
    fn test_curve_with_fractional_step_rounds_offsets() {
        let a = codes(100, 5);
        let config = CorrelationConfig {
            span: 5,
            step: 2.5,
            ..Default::default()
        };
        let curve = build_correlation_curve(&a, &a, &config);
        let offsets: Vec<i64> = curve.points().map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![-5, -3, 0, 3, 5]);
    }

    #[test]
    fn test_curve_with_tiny_fractional_step_reaches_span() {
        let a = codes(100, 5);
        let config = CorrelationConfig {
            span: 30,
            step: 0.1,
            ..Default::default()
        };
        let curve = build_correlation_curve(&a, &a, &config);
        assert_eq!(curve.len(), 601);
        assert_eq!(curve.offset_at(curve.len() - 1), 30);
    }

    #[test]
    fn test_curve_with_non_unit_step() {
        let a = codes(100, 9);
        let config = CorrelationConfig {
            span: 10,
            step: 4.0,
            ..Default::default()
        };
        let curve = build_correlation_curve(&a, &a, &config);
        let offsets: Vec<i64> = curve.points().map(|(offset, _)| offset).collect();
        assert_eq!(offsets, vec![-10, -6, -2, 2, 6, 10]);
    }

    #[test]
    fn test_curve_warns_when_span_exceeds_sample() {
        let a = codes(15, 2);
        let curve = build_correlation_curve(&a, &a, &CorrelationConfig::default());

        assert_eq!(
            curve.warnings(),
            &[CorrelationWarning::SpanExceedsSample {
                span: 150,
                sample_len: 15
            }]
        );
        assert_eq!(curve.len(), 301);
        assert_eq!(curve.defined_count(), 0);
    }

    #[test]
    fn test_curve_warns_when_span_equals_sample() {
        let a = codes(150, 2);
        let b = codes(200, 3);
        let curve = build_correlation_curve(&a, &b, &CorrelationConfig::default());
        assert_eq!(curve.warnings().len(), 1);
        assert!(curve.defined_count() > 0);
    }

    #[test]
    fn test_curve_empty_for_empty_input() {
        let a = codes(100, 2);
        assert!(build_correlation_curve(&a, &[], &CorrelationConfig::default()).is_empty());
        assert!(build_correlation_curve(&[], &a, &CorrelationConfig::default()).is_empty());
    }

    #[test]
    fn test_curve_empty_for_invalid_step() {
        let a = codes(100, 2);
        for step in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = CorrelationConfig {
                step,
                ..Default::default()
            };
            assert!(build_correlation_curve(&a, &a, &config).is_empty());
        }
    }

    #[test]
    fn test_curve_empty_for_oversized_span() {
        let a: Vec<u32> = (0..300).collect();
        for span in [usize::MAX / 2 + 1, usize::MAX, 1_000_000_000] {
            let config = CorrelationConfig {
                span,
                ..Default::default()
            };
            let curve = build_correlation_curve(&a, &a, &config);
            assert!(curve.is_empty(), "span {span}");
            assert_eq!(curve.warnings().len(), 1);
        }
    }

    #[test]
    fn test_curve_empty_for_oversized_scan_at_tiny_step() {
        let a = codes(300, 4);
        let config = CorrelationConfig {
            step: 1e-9,
            ..Default::default()
        };
        assert!(build_correlation_curve(&a, &a, &config).is_empty());
    }

    #[test]
    fn test_curve_at_largest_scan() {
        let a = codes(50, 6);
        let config = CorrelationConfig {
            span: 1_000_000,
            ..Default::default()
        };
        let curve = build_correlation_curve(&a, &a, &config);
        assert_eq!(curve.len(), MAX_SCAN_OFFSETS);
        assert_eq!(curve.offset_at(curve.len() - 1), 1_000_000);
        assert_eq!(curve.values()[1_000_000], Some(1.0));
    }

    #[test]
    fn test_warning_message() {
        let warning = CorrelationWarning::SpanExceedsSample {
            span: 150,
            sample_len: 15,
        };
        assert_eq!(
            warning.to_string(),
            "span (150) >= sample size (15); reduce span or increase sample time"
        );
    }
}
