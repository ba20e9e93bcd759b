// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Largest number of offsets a single correlation scan may enumerate.
pub const MAX_SCAN_OFFSETS: usize = 2_000_001;

/// Parameters of the offset scan performed by the correlation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Maximum absolute offset (in fingerprint positions) scanned in each direction.
    pub span: usize,
    /// Distance between two scanned offsets. Non-integer steps are rounded per offset.
    pub step: f64,
    /// Minimum number of aligned positions for an offset to be evaluable.
    pub min_overlap: usize,
    /// Advisory "match" bar (0.0-1.0) for human-readable output only.
    pub match_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            span: 150,
            step: 1.0,
            min_overlap: 20,
            match_threshold: 0.5,
        }
    }
}

impl CorrelationConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.step.is_finite() && self.step > 0.0,
            "correlation.step must be a positive number, got {}",
            self.step
        );
        ensure!(self.min_overlap > 0, "correlation.min_overlap must be at least 1");
        ensure!(
            self.scan_width() < MAX_SCAN_OFFSETS as f64,
            "correlation.span {} at step {} scans more than {} offsets",
            self.span,
            self.step,
            MAX_SCAN_OFFSETS
        );
        ensure!(
            (0.0..=1.0).contains(&self.match_threshold),
            "correlation.match_threshold must be between 0.0 and 1.0, got {}",
            self.match_threshold
        );
        Ok(())
    }

    /// Distance from `-span` to `+span` measured in steps.
    pub fn scan_width(&self) -> f64 {
        2.0 * self.span as f64 / self.step
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionConfig {
    /// Seconds of audio fingerprinted per input.
    pub sample_seconds: u32,
    pub fpcalc_path: String,
    pub ffmpeg_path: String,
    /// Read `<input>.fpcalc` files instead of running fpcalc when present.
    pub use_cache: bool,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            sample_seconds: 60,
            fpcalc_path: "fpcalc".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            use_cache: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between the two captures when source and target are the same input.
    pub delay_seconds: u64,
    /// Warning threshold, in percent.
    pub warning: Option<f64>,
    /// Critical threshold, in percent.
    pub critical: Option<f64>,
    /// Alert when similarity rises to a threshold instead of falling to it.
    pub alert_above: bool,
    /// Repeat the probe on this interval until interrupted.
    pub interval_seconds: Option<u64>,
    /// Extra attempts after an input failure.
    pub retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            delay_seconds: 0,
            warning: None,
            critical: None,
            alert_above: false,
            interval_seconds: None,
            retries: 0,
            retry_delay_seconds: 5,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("warning", self.warning), ("critical", self.critical)] {
            if let Some(value) = value {
                ensure!(
                    (0.0..=100.0).contains(&value),
                    "monitor.{} must be a percentage between 0 and 100, got {}",
                    name,
                    value
                );
            }
        }
        if let Some(interval) = self.interval_seconds {
            ensure!(interval > 0, "monitor.interval_seconds must be greater than 0");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub correlation: CorrelationConfig,
    pub acquisition: AcquisitionConfig,
    pub monitor: MonitorConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        self.correlation.validate()?;
        self.monitor.validate()?;
        Ok(())
    }
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: ECHOPROBE_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("ECHOPROBE_").split("__"));

    let config: AppConfig = figment.extract()?;
    config.validate()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
