// SPDX-License-Identifier: GPL-3.0-or-later

//! Rendering of probe outcomes for monitoring systems.

use echoprobe_correlation::{classify_outcome, Comparison, ComparisonError, ComparisonResult, Status, Thresholds};
use serde_json::{json, Value};

use crate::cli::OutputFormat;

const SERVICE: &str = "SIMILARITY";

/// Human-readable verdict against the advisory match threshold.
pub fn describe(comparison: &Comparison) -> String {
    let verdict = if comparison.is_match {
        "Match: Similarity of"
    } else {
        "No strong match: Highest similarity is"
    };
    format!(
        "{} {:.2}% at offset {} (Internal Threshold: {:.2}%)",
        verdict,
        comparison.similarity_percent,
        comparison.offset,
        comparison.match_threshold * 100.0
    )
}

/// Nagios range for one threshold: `t:` alerts below `t`, a bare `t` alerts above it.
fn threshold_field(threshold: Option<f64>, alert_above: bool) -> String {
    match threshold {
        Some(t) if alert_above => format!("{}", t),
        Some(t) => format!("{}:", t),
        None => String::new(),
    }
}

/// Nagios plugin output: `SIMILARITY <STATUS> - <message> | <perfdata>`.
pub fn status_line(status: Status, outcome: &ComparisonResult<Comparison>, thresholds: &Thresholds) -> String {
    match outcome {
        Ok(comparison) => format!(
            "{} {} - {:.2}% similarity at offset {} between {} and {} | similarity={:.2}%;{};{};0;100",
            SERVICE,
            status,
            comparison.similarity_percent,
            comparison.offset,
            comparison.source,
            comparison.target,
            comparison.similarity_percent,
            threshold_field(thresholds.warning, thresholds.alert_above),
            threshold_field(thresholds.critical, thresholds.alert_above),
        ),
        Err(err) => format!("{} {} - {}", SERVICE, status, failure_message(err)),
    }
}

fn failure_message(err: &ComparisonError) -> String {
    match err {
        ComparisonError::Indeterminate { warnings, .. } if !warnings.is_empty() => {
            let details: Vec<String> = warnings.iter().map(ToString::to_string).collect();
            format!("{} ({})", err, details.join("; "))
        }
        _ => err.to_string(),
    }
}

fn failure_kind(err: &ComparisonError) -> &'static str {
    match err {
        ComparisonError::InputFailure { .. } | ComparisonError::EmptyFingerprint { .. } => "input_failure",
        ComparisonError::ComparisonFailure(_) => "comparison_failure",
        ComparisonError::Indeterminate { .. } => "indeterminate",
    }
}

/// JSON document for one probe.
pub fn json_report(status: Status, outcome: &ComparisonResult<Comparison>) -> Value {
    match outcome {
        Ok(comparison) => json!({
            "status": status,
            "exit_code": status.exit_code(),
            "comparison": comparison,
        }),
        Err(err) => {
            let mut report = json!({
                "status": status,
                "exit_code": status.exit_code(),
                "error": {
                    "kind": failure_kind(err),
                    "message": err.to_string(),
                },
            });
            if let ComparisonError::Indeterminate { warnings, .. } = err {
                report["error"]["warnings"] = json!(warnings);
            }
            report
        }
    }
}

/// Classify `outcome` and render it in `format`.
pub fn render(outcome: &ComparisonResult<Comparison>, thresholds: &Thresholds, format: OutputFormat) -> (Status, String) {
    let status = classify_outcome(outcome, thresholds);
    let rendered = match format {
        OutputFormat::Nagios => status_line(status, outcome, thresholds),
        OutputFormat::Json => json_report(status, outcome).to_string(),
    };
    (status, rendered)
}

/// Output for a probe cut short by a shutdown signal.
pub fn render_interrupted(format: OutputFormat) -> (Status, String) {
    let status = Status::Unknown;
    let message = "comparison interrupted before completion";
    let rendered = match format {
        OutputFormat::Nagios => format!("{} {} - {}", SERVICE, status, message),
        OutputFormat::Json => json!({
            "status": status,
            "exit_code": status.exit_code(),
            "error": { "kind": "input_failure", "message": message },
        })
        .to_string(),
    };
    (status, rendered)
}

#[cfg(test)]
mod tests {
    use echoprobe_correlation::CorrelationWarning;
    use echoprobe_fingerprint::FingerprintError;

    use super::*;

    fn comparison(similarity_percent: f64, is_match: bool) -> Comparison {
        Comparison {
            source: "a.flac".to_string(),
            target: "b.flac".to_string(),
            similarity_percent,
            score: similarity_percent / 100.0,
            offset: -3,
            is_match,
            match_threshold: 0.5,
            source_len: 300,
            target_len: 300,
            warnings: Vec::new(),
        }
    }

    fn thresholds() -> Thresholds {
        Thresholds {
            warning: Some(80.0),
            critical: Some(60.0),
            alert_above: false,
        }
    }

    #[test]
    fn test_status_line_with_perfdata() {
        let outcome = Ok(comparison(72.5, true));
        let (status, line) = render(&outcome, &thresholds(), OutputFormat::Nagios);
        assert_eq!(status, Status::Warning);
        assert_eq!(
            line,
            "SIMILARITY WARNING - 72.50% similarity at offset -3 between a.flac and b.flac \
             | similarity=72.50%;80:;60:;0;100"
        );
    }

    #[test]
    fn test_perfdata_ranges_follow_alert_direction() {
        let above = Thresholds {
            warning: Some(90.0),
            critical: Some(97.5),
            alert_above: true,
        };
        let (status, line) = render(&Ok(comparison(92.0, true)), &above, OutputFormat::Nagios);
        assert_eq!(status, Status::Warning);
        assert!(line.ends_with("| similarity=92.00%;90;97.5;0;100"), "{line}");

        let below = Thresholds {
            warning: Some(90.0),
            critical: None,
            alert_above: false,
        };
        let (_, line) = render(&Ok(comparison(92.0, true)), &below, OutputFormat::Nagios);
        assert!(line.ends_with("| similarity=92.00%;90:;;0;100"), "{line}");
    }

    #[test]
    fn test_status_line_without_thresholds() {
        let outcome = Ok(comparison(99.0, true));
        let (status, line) = render(&outcome, &Thresholds::default(), OutputFormat::Nagios);
        assert_eq!(status, Status::Ok);
        assert!(line.ends_with("| similarity=99.00%;;;0;100"), "{line}");
    }

    #[test]
    fn test_indeterminate_is_unknown_with_warning() {
        let outcome = Err(ComparisonError::Indeterminate {
            min_overlap: 20,
            warnings: vec![CorrelationWarning::SpanExceedsSample {
                span: 150,
                sample_len: 15,
            }],
        });
        let (status, line) = render(&outcome, &thresholds(), OutputFormat::Nagios);
        assert_eq!(status, Status::Unknown);
        assert!(line.starts_with("SIMILARITY UNKNOWN - No offset reached the minimum overlap"));
        assert!(line.contains("span (150) >= sample size (15)"));
        assert!(!line.contains('|'));
    }

    #[test]
    fn test_json_report_for_input_failure() {
        let outcome = Err(ComparisonError::InputFailure {
            identifier: "a.flac".to_string(),
            source: FingerprintError::ToolNotFound {
                tool: "fpcalc".to_string(),
            },
        });
        let (status, rendered) = render(&outcome, &thresholds(), OutputFormat::Json);
        let value: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(status, Status::Unknown);
        assert_eq!(value["status"], "UNKNOWN");
        assert_eq!(value["exit_code"], 3);
        assert_eq!(value["error"]["kind"], "input_failure");
        assert!(value["error"]["message"].as_str().unwrap().contains("fpcalc"));
    }

    #[test]
    fn test_json_report_for_success() {
        let (status, rendered) = render(&Ok(comparison(55.0, true)), &thresholds(), OutputFormat::Json);
        let value: Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(status, Status::Critical);
        assert_eq!(value["status"], "CRITICAL");
        assert_eq!(value["comparison"]["offset"], -3);
        assert_eq!(value["comparison"]["similarity_percent"], 55.0);
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&comparison(98.5, true)),
            "Match: Similarity of 98.50% at offset -3 (Internal Threshold: 50.00%)"
        );
        assert_eq!(
            describe(&comparison(42.0, false)),
            "No strong match: Highest similarity is 42.00% at offset -3 (Internal Threshold: 50.00%)"
        );
    }

    #[test]
    fn test_render_interrupted() {
        let (status, line) = render_interrupted(OutputFormat::Nagios);
        assert_eq!(status, Status::Unknown);
        assert_eq!(line, "SIMILARITY UNKNOWN - comparison interrupted before completion");
    }
}
