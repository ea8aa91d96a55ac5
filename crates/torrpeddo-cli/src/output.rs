//! Output renderers and formatting helpers for CLI commands.

use anyhow::anyhow;
use serde::Serialize;
use torrpeddo_api::models::{ConfigResponse, HealthResponse};
use torrpeddo_core::StatusRecord;

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

pub(crate) fn render_status_list(records: &[StatusRecord], format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(records)?,
        OutputFormat::Table => {
            println!(
                "{:<40} {:<28} {:>7} {:>10} {:>10} {:>5} NAME",
                "ID", "STATE", "PROG", "DOWN", "UP", "PEERS"
            );
            for record in records {
                let progress = format!("{:.1}%", record.progress);
                println!(
                    "{:<40} {:<28} {:>7} {:>10} {:>10} {:>5} {}",
                    record.identifier,
                    record.state,
                    progress,
                    format_rate(record.download_rate),
                    format_rate(record.upload_rate),
                    record.num_peers,
                    record.name
                );
            }
        }
    }
    Ok(())
}

pub(crate) fn render_config(config: &ConfigResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Table => println!("download_dir: {}", config.download_dir),
    }
    Ok(())
}

pub(crate) fn render_health(health: &HealthResponse, format: OutputFormat) -> CliResult<()> {
    match format {
        OutputFormat::Json => print_json(health)?,
        OutputFormat::Table => {
            println!("status: {}", health.status);
            println!("build: {}", health.build);
            println!("tracked transfers: {}", health.tracked_transfers);
            println!(
                "registration failures: {}",
                health.registration_failures_total
            );
        }
    }
    Ok(())
}

/// Render a kB/s rate, switching to MB/s past 1000.
pub(crate) fn format_rate(kilobytes_per_sec: f64) -> String {
    if kilobytes_per_sec >= 1000.0 {
        format!("{:.1} MB/s", kilobytes_per_sec / 1000.0)
    } else {
        format!("{kilobytes_per_sec:.1} kB/s")
    }
}
