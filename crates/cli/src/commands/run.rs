//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{SessionBlueprint, TelemetryConfig};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::commands::load_blueprint;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig, PlatformSource, StopReason};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref())?;
    apply_overrides(&mut blueprint, args).context("Invalid command line override")?;

    info!(
        output_dir = %blueprint.session.output_dir.display(),
        sensors = blueprint.sensors.len(),
        enabled = blueprint.enabled_sensors().count(),
        telemetry = blueprint.telemetry.is_some(),
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    let source = match &args.replay {
        Some(path) => PlatformSource::Replay {
            path: path.clone(),
            speed: args.replay_speed,
        },
        None => PlatformSource::Simulated,
    };

    let pipeline = Pipeline::new(PipelineConfig {
        blueprint,
        duration: (args.duration > 0).then(|| Duration::from_secs(args.duration)),
        source,
        status_interval: Duration::from_secs(args.status_interval.max(1)),
    });

    let stats = pipeline.run(shutdown_signal()).await?;
    stats.print_summary();

    if let StopReason::SinkFailed(message) = stats.stop_reason {
        return Err(CliError::sink_failed(message).into());
    }

    info!("Sensor Logger finished");
    Ok(())
}

/// Apply command line overrides, then re-validate
fn apply_overrides(blueprint: &mut SessionBlueprint, args: &RunArgs) -> Result<()> {
    if let Some(ref dir) = args.output_dir {
        info!(dir = %dir.display(), "Overriding output directory from CLI");
        blueprint.session.output_dir = dir.clone();
    }
    if let Some(ref addr) = args.telemetry {
        info!(addr = %addr, "Overriding telemetry address from CLI");
        match blueprint.telemetry.as_mut() {
            Some(telemetry) => telemetry.addr = addr.clone(),
            None => {
                blueprint.telemetry = Some(TelemetryConfig {
                    addr: addr.clone(),
                    queue_capacity: 32,
                    drop_policy: Default::default(),
                })
            }
        }
    }
    config_loader::ConfigLoader::validate(blueprint)?;
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping session...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &SessionBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!(
        "Output: {}/{}_*.csv",
        blueprint.session.output_dir.display(),
        blueprint.session.file_prefix
    );
    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        let state = if sensor.enabled { "" } else { " [disabled]" };
        println!(
            "  - {} ({}, {} us){}",
            sensor.effective_tag(),
            sensor.kind,
            sensor.effective_sampling_period_us(),
            state
        );
    }
    if let Some(ref telemetry) = blueprint.telemetry {
        println!("\nTelemetry: {} (queue {})", telemetry.addr, telemetry.queue_capacity);
    }
    println!();
}
