//! `inspect` command implementation.

use anyhow::{Context, Result};
use records::{summarize_log, LogSummary};
use serde::Serialize;
use tracing::info;

use crate::cli::InspectArgs;
use crate::error::CliError;

#[derive(Serialize)]
struct InspectReport {
    file: String,
    comment_lines: u64,
    records: u64,
    malformed: u64,
    tags: Vec<TagReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

#[derive(Serialize)]
struct TagReport {
    tag: String,
    kind: Option<String>,
    enabled: bool,
    records: u64,
    malformed: u64,
}

/// Execute the `inspect` command
pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.file)
        .map_err(|e| CliError::log_read(&args.file, e))?;
    let summary = summarize_log(text.lines());
    info!(
        file = %args.file.display(),
        records = summary.total_records(),
        malformed = summary.total_malformed(),
        "Log scanned"
    );

    let report = build_report(&args.file.display().to_string(), &summary);
    if args.json {
        let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;
        println!("{}", json);
    } else {
        print_report(&report);
    }

    if report.malformed > 0 {
        anyhow::bail!("{} malformed line(s) in {}", report.malformed, report.file);
    }
    Ok(())
}

fn build_report(file: &str, summary: &LogSummary) -> InspectReport {
    InspectReport {
        file: file.to_string(),
        comment_lines: summary.comment_lines,
        records: summary.total_records(),
        malformed: summary.total_malformed(),
        tags: summary
            .tags
            .iter()
            .map(|(tag, t)| TagReport {
                tag: tag.clone(),
                kind: t.kind.as_ref().map(ToString::to_string),
                enabled: t.enabled,
                records: t.records,
                malformed: t.malformed,
            })
            .collect(),
        errors: summary
            .errors
            .iter()
            .map(|(line, err)| format!("line {line}: {err}"))
            .collect(),
    }
}

fn print_report(report: &InspectReport) {
    println!("Log: {}", report.file);
    println!(
        "   ├─ Records: {} ({} malformed)",
        report.records, report.malformed
    );
    println!("   └─ Comment lines: {}", report.comment_lines);

    println!("\n{:<12} {:<28} {:>10} {:>10}", "TAG", "KIND", "RECORDS", "MALFORMED");
    for tag in &report.tags {
        let kind = match (&tag.kind, tag.enabled) {
            (_, false) => "disabled".to_string(),
            (Some(kind), true) => kind.clone(),
            (None, true) => "?".to_string(),
        };
        println!(
            "{:<12} {:<28} {:>10} {:>10}",
            tag.tag, kind, tag.records, tag.malformed
        );
    }

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for error in &report.errors {
            println!("  - {}", error);
        }
    }
    println!();
}
