// SPDX-License-Identifier: GPL-3.0-or-later

use serde::Serialize;

use crate::correlation::CorrelationCurve;

/// Best-scoring offset of a correlation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchResult {
    /// Fraction of matching bits (0.0-1.0).
    pub score: f64,
    /// `score` expressed as a percentage.
    pub similarity_percent: f64,
    /// Shift of the target relative to the source, in fingerprint positions.
    pub offset: i64,
}

impl MatchResult {
    /// Whether the score reaches `threshold` (0.0-1.0).
    pub fn meets(&self, threshold: f64) -> bool {
        self.score >= threshold
    }
}

/// Pick the highest defined value of `curve`.
///
/// Ties resolve to the first index, i.e. the lowest offset. Returns `None`
/// when no value in the curve is defined.
pub fn select_best_match(curve: &CorrelationCurve) -> Option<MatchResult> {
    let mut best: Option<(usize, f64)> = None;

    for (index, value) in curve.values().iter().enumerate() {
        let Some(value) = *value else { continue };
        match best {
            Some((_, best_value)) if value <= best_value => {}
            _ => best = Some((index, value)),
        }
    }

    best.map(|(index, score)| MatchResult {
        score,
        similarity_percent: score * 100.0,
        offset: curve.offset_at(index),
    })
}
