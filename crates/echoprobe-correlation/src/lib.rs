// SPDX-License-Identifier: GPL-3.0-or-later

//! Fingerprint cross-correlation and comparison workflow.
//!
//! - [`correlation`]: bit-agreement score of two fingerprints over a scan of offsets
//! - [`selector`]: reduction of a correlation curve to the best offset
//! - [`comparison`]: end-to-end comparison of a source and a target input
//! - [`status`]: monitoring status derived from a comparison

pub mod comparison;
pub mod correlation;
pub mod selector;
pub mod status;

pub use comparison::{Comparator, Comparison, ComparisonError, ComparisonRequest, ComparisonResult};
pub use correlation::{build_correlation_curve, similarity_at, CorrelationCurve, CorrelationWarning};
pub use selector::{select_best_match, MatchResult};
pub use status::{classify, classify_outcome, Status, Thresholds};
