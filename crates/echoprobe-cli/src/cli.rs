// SPDX-License-Identifier: GPL-3.0-or-later

//! Command line interface of the `echoprobe` binary.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use echoprobe_config::AppConfig;

/// Compare the acoustic fingerprints of two audio inputs, or detect a looping
/// live stream by comparing it with itself after a delay.
#[derive(Parser, Debug)]
#[command(name = "echoprobe", author, version, about, long_about = None)]
pub struct Cli {
    /// Source file or stream URL
    #[arg(short = 'i', long = "source-file", value_name = "SOURCE")]
    pub source: String,

    /// Target file or stream URL (defaults to the source, for loop detection)
    #[arg(short = 'o', long = "target-file", value_name = "TARGET")]
    pub target: Option<String>,

    /// Seconds of audio to fingerprint
    #[arg(short = 's', long)]
    pub sample_time: Option<u32>,

    /// Seconds to wait before the second capture when source and target are the same
    #[arg(short = 'd', long)]
    pub delay: Option<u64>,

    /// Warning threshold (similarity percent)
    #[arg(short = 'w', long)]
    pub warning: Option<f64>,

    /// Critical threshold (similarity percent)
    #[arg(short = 'c', long)]
    pub critical: Option<f64>,

    /// Alert when similarity reaches a threshold from below (loop detection)
    #[arg(long)]
    pub alert_above: bool,

    /// Maximum offset scanned, in fingerprint positions
    #[arg(long)]
    pub span: Option<usize>,

    /// Step between scanned offsets
    #[arg(long)]
    pub step: Option<f64>,

    /// Minimum overlap required at an offset
    #[arg(long)]
    pub min_overlap: Option<usize>,

    /// Repeat the probe every N seconds until interrupted
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,

    /// Retries after a failure to fingerprint an input
    #[arg(long)]
    pub retries: Option<u32>,

    /// Ignore `.fpcalc` cache files
    #[arg(long)]
    pub no_cache: bool,

    /// Path to the fpcalc executable
    #[arg(long, value_name = "PATH")]
    pub fpcalc: Option<String>,

    /// Path to the ffmpeg executable
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Nagios)]
    pub format: OutputFormat,

    /// TOML configuration file
    #[arg(long, env = "ECHOPROBE_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Status line with performance data
    Nagios,
    /// One JSON object per probe
    Json,
}

impl Cli {
    pub fn target(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.source)
    }

    /// Override loaded configuration with the flags given on the command line.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(sample_time) = self.sample_time {
            config.acquisition.sample_seconds = sample_time;
        }
        if let Some(fpcalc) = &self.fpcalc {
            config.acquisition.fpcalc_path = fpcalc.clone();
        }
        if let Some(ffmpeg) = &self.ffmpeg {
            config.acquisition.ffmpeg_path = ffmpeg.clone();
        }
        if self.no_cache {
            config.acquisition.use_cache = false;
        }

        if let Some(span) = self.span {
            config.correlation.span = span;
        }
        if let Some(step) = self.step {
            config.correlation.step = step;
        }
        if let Some(min_overlap) = self.min_overlap {
            config.correlation.min_overlap = min_overlap;
        }

        if let Some(delay) = self.delay {
            config.monitor.delay_seconds = delay;
        }
        if self.warning.is_some() {
            config.monitor.warning = self.warning;
        }
        if self.critical.is_some() {
            config.monitor.critical = self.critical;
        }
        if self.alert_above {
            config.monitor.alert_above = true;
        }
        if self.interval.is_some() {
            config.monitor.interval_seconds = self.interval;
        }
        if let Some(retries) = self.retries {
            config.monitor.retries = retries;
        }
    }
}
