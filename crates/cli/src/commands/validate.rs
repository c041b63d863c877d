//! `validate` - check a session config without touching any sensor

use std::path::Path;

use anyhow::{Context, Result};
use contracts::{SensorKind, SessionBlueprint};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

#[derive(Debug, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
enum Verdict {
    Valid {
        session: SessionOutline,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        warnings: Vec<String>,
    },
    Invalid {
        reason: String,
    },
}

#[derive(Debug, Serialize)]
struct ValidationReport {
    config: String,
    #[serde(flatten)]
    verdict: Verdict,
}

/// What the session would produce
#[derive(Debug, Serialize)]
struct SessionOutline {
    output_pattern: String,
    tags: Vec<String>,
    disabled_tags: Vec<String>,
    telemetry_target: Option<String>,
}

impl SessionOutline {
    fn of(blueprint: &SessionBlueprint) -> Self {
        let (enabled, disabled): (Vec<_>, Vec<_>) = blueprint.sensors.iter().partition(|s| s.enabled);
        Self {
            output_pattern: blueprint
                .session
                .output_dir
                .join(format!("{}_<yyyyMMdd_HHmmss>.csv", blueprint.session.file_prefix))
                .display()
                .to_string(),
            tags: enabled.iter().map(|s| s.effective_tag().to_string()).collect(),
            disabled_tags: disabled.iter().map(|s| s.effective_tag().to_string()).collect(),
            telemetry_target: blueprint.telemetry.as_ref().map(|t| t.addr.clone()),
        }
    }
}

pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "validating session config");

    let report = check(&args.config);
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("cannot encode validation report")?
        );
    } else {
        print_report(&report);
    }

    match report.verdict {
        Verdict::Valid { .. } => Ok(()),
        Verdict::Invalid { reason } => anyhow::bail!("{} is not a usable session config: {reason}", report.config),
    }
}

fn check(path: &Path) -> ValidationReport {
    let verdict = if !path.exists() {
        Verdict::Invalid {
            reason: "file not found".to_string(),
        }
    } else {
        match config_loader::ConfigLoader::load_from_path(path) {
            Ok(blueprint) => Verdict::Valid {
                warnings: collect_warnings(&blueprint),
                session: SessionOutline::of(&blueprint),
            },
            Err(e) => Verdict::Invalid { reason: e.to_string() },
        }
    };
    ValidationReport {
        config: path.display().to_string(),
        verdict,
    }
}

/// Things that load fine but probably are not what the user meant
fn collect_warnings(blueprint: &SessionBlueprint) -> Vec<String> {
    let mut warnings: Vec<String> = blueprint
        .sensors
        .iter()
        .filter(|s| !s.enabled)
        .map(|s| format!("{} is disabled, the log only gets its disabled header", s.effective_tag()))
        .collect();

    let logs_fixes = blueprint
        .enabled_sensors()
        .any(|s| s.kind == SensorKind::GnssLocation);
    if blueprint.telemetry.is_some() && !logs_fixes {
        warnings.push("telemetry is set but no location sensor is enabled, nothing will be sent".to_string());
    }
    if blueprint.enabled_sensors().next().is_none() {
        warnings.push("every sensor is disabled, the log will hold headers only".to_string());
    }
    warnings
}

fn print_report(report: &ValidationReport) {
    match &report.verdict {
        Verdict::Valid { session, warnings } => {
            println!("{}: ok", report.config);
            println!("  output:  {}", session.output_pattern);
            println!("  sensors: {}", session.tags.join(", "));
            if !session.disabled_tags.is_empty() {
                println!("  off:     {}", session.disabled_tags.join(", "));
            }
            if let Some(target) = &session.telemetry_target {
                println!("  fixes -> udp://{target}");
            }
            for warning in warnings {
                println!("  warning: {warning}");
            }
        }
        Verdict::Invalid { reason } => {
            println!("{}: invalid", report.config);
            println!("  {reason}");
        }
    }
}
