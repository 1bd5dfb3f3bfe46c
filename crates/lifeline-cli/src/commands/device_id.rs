//! Device-id command - Print the stable device identifier

use anyhow::Result;
use clap::Args;
use serde_json::json;

use super::CliContext;
use crate::output::{get_formatter, OutputFormat};

/// Print the identifier this device reports under
#[derive(Debug, Args)]
pub struct DeviceIdCommand {}

impl DeviceIdCommand {
    pub async fn execute(&self, ctx: &CliContext, format: OutputFormat) -> Result<()> {
        let device_id = ctx.bridge.unique_device_id();
        if matches!(format, OutputFormat::Json) {
            get_formatter(true).print_json(&json!({ "device_id": device_id }));
        } else {
            println!("{}", device_id);
        }
        Ok(())
    }
}
