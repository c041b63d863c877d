//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::SessionBlueprint;
use records::{column_line, column_names};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::commands::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    output_dir: String,
    file_prefix: String,
    recent_capacity: usize,
    sensors: Vec<SensorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    telemetry: Option<TelemetryInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    tag: String,
    kind: String,
    enabled: bool,
    sampling_period_us: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider: Option<String>,
    column_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    columns: Option<String>,
}

#[derive(Serialize)]
struct TelemetryInfo {
    addr: String,
    queue_capacity: usize,
    drop_policy: String,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let blueprint = load_blueprint(args.config.as_deref())?;
    info!(sensors = blueprint.sensors.len(), "Loaded configuration info");

    let config_info = build_config_info(&blueprint, args.columns);
    if args.json {
        let json =
            serde_json::to_string_pretty(&config_info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&config_info);
    }

    Ok(())
}

fn build_config_info(blueprint: &SessionBlueprint, with_columns: bool) -> ConfigInfo {
    let sensors = blueprint
        .sensors
        .iter()
        .map(|s| {
            let tag = s.effective_tag();
            SensorInfo {
                tag: tag.to_string(),
                kind: s.kind.to_string(),
                enabled: s.enabled,
                sampling_period_us: s.effective_sampling_period_us(),
                provider: s.provider.clone(),
                column_count: column_names(&s.kind).count(),
                columns: with_columns.then(|| column_line(&tag, &s.kind)),
            }
        })
        .collect();

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        output_dir: blueprint.session.output_dir.display().to_string(),
        file_prefix: blueprint.session.file_prefix.clone(),
        recent_capacity: blueprint.session.recent_capacity,
        sensors,
        telemetry: blueprint.telemetry.as_ref().map(|t| TelemetryInfo {
            addr: t.addr.clone(),
            queue_capacity: t.queue_capacity,
            drop_policy: format!("{:?}", t.drop_policy),
        }),
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("Sensor Logger Configuration ({})\n", info.version);

    println!("Output");
    println!("   ├─ Directory: {}", info.output_dir);
    println!("   ├─ File prefix: {}", info.file_prefix);
    println!("   └─ Recent lines kept: {}", info.recent_capacity);

    println!("\nSensors ({})", info.sensors.len());
    for (i, sensor) in info.sensors.iter().enumerate() {
        let is_last = i == info.sensors.len() - 1;
        let prefix = if is_last { "└─" } else { "├─" };
        let child_prefix = if is_last { "   " } else { "│  " };

        let state = if sensor.enabled { "" } else { " [disabled]" };
        let provider = sensor
            .provider
            .as_ref()
            .map(|p| format!(", provider {p}"))
            .unwrap_or_default();
        println!(
            "   {} {} ({}, {} us{}, {} columns){}",
            prefix,
            sensor.tag,
            sensor.kind,
            sensor.sampling_period_us,
            provider,
            sensor.column_count,
            state
        );
        if let Some(ref columns) = sensor.columns {
            println!("   {}  {}", child_prefix, columns);
        }
    }

    if let Some(ref telemetry) = info.telemetry {
        println!("\nTelemetry");
        println!("   ├─ Address: {}", telemetry.addr);
        println!("   ├─ Queue: {}", telemetry.queue_capacity);
        println!("   └─ When full: {}", telemetry.drop_policy);
    }

    println!();
}
