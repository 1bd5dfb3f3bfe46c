//! Env command - Show the environment snapshot attached to reports

use anyhow::Result;
use clap::Args;
use serde_json::{json, Value};

use super::CliContext;
use crate::output::{display_value, get_formatter, OutputFormat};

/// Print the device and runtime facts collected for crash reports
#[derive(Debug, Args)]
pub struct EnvCommand {}

impl EnvCommand {
    pub async fn execute(&self, ctx: &CliContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let snapshot = ctx.bridge.environment_snapshot();

        if matches!(format, OutputFormat::Json) {
            let map: serde_json::Map<String, Value> = snapshot.into_iter().collect();
            formatter.print_json(&json!({
                "environment": map,
                "cache_dir": ctx.dir,
            }));
            return Ok(());
        }

        println!("Environment");
        for (key, value) in &snapshot {
            formatter.field(key, &display_value(value));
        }
        println!();
        formatter.field("Cache dir", &ctx.dir.display().to_string());
        Ok(())
    }
}
