// SPDX-License-Identifier: GPL-3.0-or-later

//! Nagios-style classification of comparison outcomes.

use std::fmt;

use echoprobe_config::MonitorConfig;
use serde::Serialize;

use crate::comparison::{Comparison, ComparisonResult};

/// Monitoring plugin status, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl Status {
    /// Plugin exit code: 0 OK, 1 WARNING, 2 CRITICAL, 3 UNKNOWN.
    pub fn exit_code(self) -> i32 {
        match self {
            Status::Ok => 0,
            Status::Warning => 1,
            Status::Critical => 2,
            Status::Unknown => 3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Warning => "WARNING",
            Status::Critical => "CRITICAL",
            Status::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Warning and critical similarity percentages.
///
/// By default a similarity at or below a threshold alerts (the target should
/// sound like the source). With `alert_above`, a similarity at or above a
/// threshold alerts instead, which is what loop detection on a live stream
/// needs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Thresholds {
    pub warning: Option<f64>,
    pub critical: Option<f64>,
    pub alert_above: bool,
}

impl Thresholds {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            warning: config.warning,
            critical: config.critical,
            alert_above: config.alert_above,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.warning.is_none() && self.critical.is_none()
    }

    fn breached(&self, similarity_percent: f64, threshold: Option<f64>) -> bool {
        threshold.is_some_and(|threshold| {
            if self.alert_above {
                similarity_percent >= threshold
            } else {
                similarity_percent <= threshold
            }
        })
    }
}

/// Status of a similarity percentage against `thresholds`.
pub fn classify(similarity_percent: f64, thresholds: &Thresholds) -> Status {
    if thresholds.breached(similarity_percent, thresholds.critical) {
        Status::Critical
    } else if thresholds.breached(similarity_percent, thresholds.warning) {
        Status::Warning
    } else {
        Status::Ok
    }
}

/// Status of a whole comparison; any failure is `Unknown`.
pub fn classify_outcome(outcome: &ComparisonResult<Comparison>, thresholds: &Thresholds) -> Status {
    match outcome {
        Ok(comparison) => classify(comparison.similarity_percent, thresholds),
        Err(_) => Status::Unknown,
    }
}
