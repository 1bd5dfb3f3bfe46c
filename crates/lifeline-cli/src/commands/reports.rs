//! Reports command - Manage the local crash report cache
//!
//! Provides the `lifeline reports` CLI command with subcommands:
//! - `list`: Summarize cached reports without removing them
//! - `add <file|->`: Cache a serialized report
//! - `flush`: Print and remove every cached report
//! - `clear`: Remove every cached report
//! - `capacity <n>`: Set the capacity and trim the cache now

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Subcommand;
use lifeline_bridge::CacheOutcome;
use lifeline_telemetry::{CrashReportPayload, StoredReport};
use serde_json::{json, Value};

use super::CliContext;
use crate::output::{get_formatter, OutputFormat};

/// Report cache subcommands
#[derive(Debug, Subcommand)]
pub enum ReportsCommand {
    /// List cached reports, oldest first
    List,
    /// Cache a serialized crash report
    Add {
        /// Report file, or `-` for stdin
        source: PathBuf,
    },
    /// Print and remove every cached report
    Flush,
    /// Remove every cached report without printing it
    Clear,
    /// Set the cache capacity (clamped to 0..=64) and apply it now
    Capacity {
        #[arg(allow_hyphen_values = true)]
        capacity: i64,
    },
}

impl ReportsCommand {
    pub async fn execute(&self, ctx: &CliContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let bridge = &ctx.bridge;

        match self {
            ReportsCommand::List => {
                let store = bridge.report_store().clone();
                let reports = tokio::task::spawn_blocking(move || store.reports()).await??;

                if matches!(format, OutputFormat::Json) {
                    let rows: Vec<Value> = reports.iter().enumerate().map(summarize).collect();
                    formatter.print_json(&json!({
                        "dir": ctx.dir,
                        "capacity": bridge.cache_capacity(),
                        "reports": rows,
                    }));
                    return Ok(());
                }

                if reports.is_empty() {
                    formatter.info("No cached reports.");
                    return Ok(());
                }
                println!(
                    "{:<4} {:<28} {:<26} {}",
                    "#", "Class", "Occurred", "Message"
                );
                println!("{}", "-".repeat(80));
                for (index, report) in reports.iter().enumerate() {
                    let row = summarize((index, report));
                    println!(
                        "{:<4} {:<28} {:<26} {}",
                        index,
                        truncate(row["class"].as_str().unwrap_or("-"), 28),
                        row["occurred_on"].as_str().unwrap_or("-"),
                        truncate(row["message"].as_str().unwrap_or(""), 60),
                    );
                }
                println!();
                println!(
                    "Total: {} report(s), capacity {}",
                    reports.len(),
                    bridge.cache_capacity()
                );
            }

            ReportsCommand::Add { source } => {
                let payload = read_source(source)?;
                match bridge.cache_report(payload).await? {
                    CacheOutcome::Stored { evicted } => {
                        if matches!(format, OutputFormat::Json) {
                            formatter.print_json(&json!({"outcome": "stored", "evicted": evicted}));
                        } else {
                            formatter.success("Report cached");
                            if evicted > 0 {
                                formatter.info(&format!("{} older report(s) evicted", evicted));
                            }
                        }
                    }
                    CacheOutcome::Vetoed => {
                        if matches!(format, OutputFormat::Json) {
                            formatter.print_json(&json!({"outcome": "vetoed"}));
                        } else {
                            formatter.info("Report raised by the script runtime; not cached");
                        }
                    }
                }
            }

            ReportsCommand::Flush => {
                let reports = bridge.flush_report_cache().await?;
                let values: Vec<Value> = reports.into_iter().map(StoredReport::into_value).collect();
                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&Value::Array(values));
                } else if values.is_empty() {
                    formatter.info("No cached reports.");
                } else {
                    for value in &values {
                        println!("{}", serde_json::to_string_pretty(value)?);
                    }
                    formatter.success(&format!("Flushed {} report(s)", values.len()));
                }
            }

            ReportsCommand::Clear => {
                bridge.clear_report_cache().await?;
                formatter.success("Report cache cleared");
            }

            ReportsCommand::Capacity { capacity } => {
                let applied = bridge.set_cache_capacity(*capacity);
                let store = bridge.report_store().clone();
                let evicted = tokio::task::spawn_blocking(move || store.trim()).await??;

                if matches!(format, OutputFormat::Json) {
                    formatter.print_json(&json!({
                        "requested": capacity,
                        "applied": applied,
                        "evicted": evicted,
                    }));
                } else {
                    formatter.success(&format!("Capacity set to {}", applied));
                    if evicted > 0 {
                        formatter.info(&format!("{} oldest report(s) evicted", evicted));
                    }
                    if ctx.config.cache.capacity != applied as i64 {
                        formatter.info(
                            "The configured capacity applies again on the next run; update the config file to keep this value.",
                        );
                    }
                }
            }
        }

        Ok(())
    }
}

fn read_source(source: &Path) -> Result<String> {
    if source.as_os_str() == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("Failed to read report from stdin")?;
        Ok(payload)
    } else {
        std::fs::read_to_string(source)
            .with_context(|| format!("Failed to read {}", source.display()))
    }
}

/// One summary row; reports outside the typed schema still get a row.
fn summarize((index, report): (usize, &StoredReport)) -> Value {
    match CrashReportPayload::from_value(report.as_value()) {
        Ok(payload) => json!({
            "index": index,
            "class": payload.details.error.class_name,
            "message": payload.details.error.message,
            "occurred_on": payload.occurred_on.to_rfc3339(),
        }),
        Err(_) => json!({
            "index": index,
            "class": Value::Null,
            "message": report.to_json_string(),
            "occurred_on": Value::Null,
        }),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifeline_telemetry::{BoundedReportStore, MemoryKeyValueStore};
    use std::sync::Arc;

    #[test]
    fn test_summarize_typed_and_foreign_reports() {
        let store = BoundedReportStore::new(Arc::new(MemoryKeyValueStore::new()));
        let typed = CrashReportPayload::new("IOException", "disk full");
        store.cache(&typed.to_json().unwrap()).unwrap();
        store.cache(r#"{"anything": 1}"#).unwrap();

        let reports = store.reports().unwrap();
        let first = summarize((0, &reports[0]));
        assert_eq!(first["class"], "IOException");
        assert_eq!(first["message"], "disk full");

        let second = summarize((1, &reports[1]));
        assert!(second["class"].is_null());
        assert_eq!(second["message"], r#"{"anything":1}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghijkl", 8), "abcde...");
    }

    #[test]
    fn test_read_source_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        std::fs::write(&path, "{\"id\": 1}").unwrap();
        assert_eq!(read_source(&path).unwrap(), "{\"id\": 1}");
        assert!(read_source(&dir.path().join("missing.json")).is_err());
    }
}
