// SPDX-License-Identifier: GPL-3.0-or-later
use std::future::Future;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use echoprobe_config::{load as load_config, AppConfig, TelemetryConfig};
use echoprobe_correlation::{Comparator, Comparison, ComparisonRequest, ComparisonResult, Status, Thresholds};
use echoprobe_fingerprint::FpcalcSource;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

mod cli;
mod report;

use cli::{Cli, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(status) => ExitCode::from(status.exit_code() as u8),
        Err(err) => {
            println!("SIMILARITY {} - {:#}", Status::Unknown, err);
            ExitCode::from(Status::Unknown.exit_code() as u8)
        }
    }
}

async fn run(cli: Cli) -> Result<Status> {
    let mut config = load_config(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    init_tracing(&config.telemetry);

    let comparator = build_comparator(&config);
    let request = ComparisonRequest::new(cli.source.clone(), cli.target(), config.acquisition.sample_seconds)
        .with_delay(Duration::from_secs(config.monitor.delay_seconds));
    let thresholds = Thresholds::from_config(&config.monitor);

    let status = match config.monitor.interval_seconds {
        Some(interval) => {
            watch(&comparator, &request, &config, &thresholds, cli.format, interval, shutdown_signal()).await
        }
        None => {
            let (status, line) =
                probe_until_shutdown(&comparator, &request, &config, &thresholds, cli.format, shutdown_signal()).await;
            println!("{}", line);
            status
        }
    };
    Ok(status)
}

fn build_comparator(config: &AppConfig) -> Comparator {
    let source = FpcalcSource::builder()
        .fpcalc_path(config.acquisition.fpcalc_path.clone())
        .ffmpeg_path(config.acquisition.ffmpeg_path.clone())
        .use_cache(config.acquisition.use_cache)
        .build();
    Comparator::new(Arc::new(source), config.correlation.clone())
}

/// One comparison, retried after input failures as configured.
async fn probe(comparator: &Comparator, request: &ComparisonRequest, config: &AppConfig) -> ComparisonResult<Comparison> {
    let mut attempt = 0;
    loop {
        let outcome = comparator.compare(request).await;
        match &outcome {
            Err(err) if err.is_input_failure() && attempt < config.monitor.retries => {
                attempt += 1;
                warn!(
                    target: "cli",
                    "{}; retrying in {}s (attempt {}/{})",
                    err,
                    config.monitor.retry_delay_seconds,
                    attempt,
                    config.monitor.retries
                );
                tokio::time::sleep(Duration::from_secs(config.monitor.retry_delay_seconds)).await;
            }
            Ok(comparison) => {
                info!(target: "cli", "{}", report::describe(comparison));
                return outcome;
            }
            Err(_) => return outcome,
        }
    }
}

/// One rendered probe, or an interrupted report if `shutdown` completes first.
async fn probe_until_shutdown(
    comparator: &Comparator,
    request: &ComparisonRequest,
    config: &AppConfig,
    thresholds: &Thresholds,
    format: OutputFormat,
    shutdown: impl Future<Output = ()>,
) -> (Status, String) {
    tokio::select! {
        outcome = probe(comparator, request, config) => report::render(&outcome, thresholds, format),
        _ = shutdown => report::render_interrupted(format),
    }
}

/// Probe every `interval` seconds until `shutdown` completes; returns the last status.
async fn watch(
    comparator: &Comparator,
    request: &ComparisonRequest,
    config: &AppConfig,
    thresholds: &Thresholds,
    format: OutputFormat,
    interval: u64,
    shutdown: impl Future<Output = ()>,
) -> Status {
    let mut ticker = tokio::time::interval(Duration::from_secs(interval));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let mut last = Status::Unknown;

    tokio::pin!(shutdown);

    info!(target: "cli", "monitoring {} every {}s", request.source, interval);

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            _ = &mut shutdown => break,
            outcome = probe(comparator, request, config) => {
                let (status, line) = report::render(&outcome, thresholds, format);
                println!("{}", line);
                last = status;
            }
        }
    }

    last
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));

    // stdout carries the status line only.
    let fmt_layer = if telemetry.json {
        fmt::layer().json().with_writer(std::io::stderr).with_target(true).boxed()
    } else {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).init();
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::interrupt()), signal(SignalKind::terminate())) {
            (Ok(mut interrupt), Ok(mut terminate)) => {
                tokio::select! {
                    _ = interrupt.recv() => {},
                    _ = terminate.recv() => {},
                }
            }
            _ => {
                warn!(target: "cli", "could not install signal handlers");
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if tokio::signal::ctrl_c().await.is_err() {
            warn!(target: "cli", "could not install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    }

    info!(target: "cli", "shutdown signal received");
}
