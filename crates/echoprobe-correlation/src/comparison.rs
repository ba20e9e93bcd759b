// SPDX-License-Identifier: GPL-3.0-or-later

//! End-to-end comparison of a source and a target input.
//!
//! The comparator walks a fixed sequence of steps:
//! 1. Fingerprint the source
//! 2. For a live self-comparison, wait for the configured delay
//! 3. Fingerprint the target (always a fresh capture)
//! 4. Build the correlation curve
//! 5. Select the best offset
//!
//! Failures are never retried here and never turned into a similarity value.

use std::sync::Arc;
use std::time::Duration;

use echoprobe_config::CorrelationConfig;
use echoprobe_fingerprint::{Fingerprint, FingerprintError, FingerprintSource};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::correlation::{build_correlation_curve, CorrelationWarning};
use crate::selector::select_best_match;

/// Errors that end a comparison without a similarity value.
#[derive(Debug, Error)]
pub enum ComparisonError {
    #[error("Could not fingerprint {identifier}: {source}")]
    InputFailure {
        identifier: String,
        #[source]
        source: FingerprintError,
    },

    #[error("Fingerprint for {identifier} is empty")]
    EmptyFingerprint { identifier: String },

    #[error("Comparison failed: {0}")]
    ComparisonFailure(String),

    #[error("No offset reached the minimum overlap of {min_overlap} codes")]
    Indeterminate {
        min_overlap: usize,
        warnings: Vec<CorrelationWarning>,
    },
}

impl ComparisonError {
    /// Whether the failure happened while acquiring a fingerprint.
    pub fn is_input_failure(&self) -> bool {
        matches!(
            self,
            ComparisonError::InputFailure { .. } | ComparisonError::EmptyFingerprint { .. }
        )
    }
}

/// Result type for comparison operations
pub type ComparisonResult<T> = Result<T, ComparisonError>;

/// Inputs of one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub source: String,
    pub target: String,
    pub sample_seconds: u32,
    /// Pause before the second capture of a self-comparison.
    pub delay: Duration,
}

impl ComparisonRequest {
    pub fn new(source: impl Into<String>, target: impl Into<String>, sample_seconds: u32) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            sample_seconds,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Source and target name the same input, e.g. one live stream probed twice.
    pub fn is_self_comparison(&self) -> bool {
        self.source == self.target
    }
}

/// Successful comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub source: String,
    pub target: String,
    pub similarity_percent: f64,
    pub score: f64,
    pub offset: i64,
    /// Whether `score` reaches the advisory match threshold.
    pub is_match: bool,
    pub match_threshold: f64,
    pub source_len: usize,
    pub target_len: usize,
    pub warnings: Vec<CorrelationWarning>,
}

/// Drives comparisons with one fingerprint source and one set of scan parameters.
#[derive(Clone)]
pub struct Comparator {
    source: Arc<dyn FingerprintSource>,
    config: CorrelationConfig,
}

impl Comparator {
    /// Create a comparator.
    ///
    /// # Arguments
    ///
    /// * `source` - Fingerprint acquisition backend, shared between comparisons
    /// * `config` - Span, step, minimum overlap and match threshold of the scan
    pub fn new(source: Arc<dyn FingerprintSource>, config: CorrelationConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CorrelationConfig {
        &self.config
    }

    /// Run one comparison to completion.
    ///
    /// # Errors
    ///
    /// - `InputFailure` / `EmptyFingerprint` if either fingerprint cannot be acquired
    /// - `ComparisonFailure` if no offset could be scanned at all
    /// - `Indeterminate` if no scanned offset had enough overlap
    #[instrument(skip(self, request), fields(source = %request.source, target = %request.target))]
    pub async fn compare(&self, request: &ComparisonRequest) -> ComparisonResult<Comparison> {
        let source = self.acquire(&request.source, request.sample_seconds).await?;

        if request.is_self_comparison() && !request.delay.is_zero() {
            info!(
                target: "comparison",
                "Live stream mode: delaying for {}s before next fingerprint capture",
                request.delay.as_secs_f64()
            );
            tokio::time::sleep(request.delay).await;
        }

        let target = self.acquire(&request.target, request.sample_seconds).await?;

        let curve = build_correlation_curve(source.codes(), target.codes(), &self.config);
        if curve.is_empty() {
            return Err(ComparisonError::ComparisonFailure(format!(
                "no offsets scanned (span {}, step {}, fingerprint lengths {} and {})",
                self.config.span,
                self.config.step,
                source.len(),
                target.len()
            )));
        }

        let Some(best) = select_best_match(&curve) else {
            warn!(
                target: "comparison",
                "No valid correlation values found between {} and {}", request.source, request.target
            );
            return Err(ComparisonError::Indeterminate {
                min_overlap: self.config.min_overlap,
                warnings: curve.warnings().to_vec(),
            });
        };

        let comparison = Comparison {
            source: request.source.clone(),
            target: request.target.clone(),
            similarity_percent: best.similarity_percent,
            score: best.score,
            offset: best.offset,
            is_match: best.meets(self.config.match_threshold),
            match_threshold: self.config.match_threshold,
            source_len: source.len(),
            target_len: target.len(),
            warnings: curve.warnings().to_vec(),
        };

        info!(
            target: "comparison",
            similarity = comparison.similarity_percent,
            offset = comparison.offset,
            is_match = comparison.is_match,
            "comparison complete"
        );

        Ok(comparison)
    }

    async fn acquire(&self, identifier: &str, sample_seconds: u32) -> ComparisonResult<Fingerprint> {
        let fingerprint = self
            .source
            .fetch(identifier, sample_seconds)
            .await
            .map_err(|source| ComparisonError::InputFailure {
                identifier: identifier.to_string(),
                source,
            })?;

        if fingerprint.is_empty() {
            return Err(ComparisonError::EmptyFingerprint {
                identifier: identifier.to_string(),
            });
        }

        Ok(fingerprint)
    }
}
