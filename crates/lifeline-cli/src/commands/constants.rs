//! Constants command - Print the constants table handed to event consumers

use anyhow::Result;
use clap::Args;
use serde_json::Value;

use super::CliContext;
use crate::output::{display_value, get_formatter, OutputFormat};

/// Print event names and device facts
#[derive(Debug, Args)]
pub struct ConstantsCommand {}

impl ConstantsCommand {
    pub async fn execute(&self, ctx: &CliContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let constants = ctx.bridge.constants();

        if matches!(format, OutputFormat::Json) {
            let map: serde_json::Map<String, Value> = constants.into_iter().collect();
            formatter.print_json(&Value::Object(map));
        } else {
            for (key, value) in &constants {
                formatter.field(key, &display_value(value));
            }
        }
        Ok(())
    }
}
