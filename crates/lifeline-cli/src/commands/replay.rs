//! Replay command - Feed a lifecycle signal script through the observer
//!
//! Script format, one step per line (`#` starts a comment):
//!
//! ```text
//! wait 120            # advance the clock by 120 ms
//! created Main        # raise a lifecycle signal for unit "Main"
//! resumed Main
//! view-loaded Main 87 # push a caller-measured ViewLoaded event
//! drop Main           # release the host's handle without a destroyed signal
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use lifeline_bridge::{
    Bridge, BridgeContext, EmittedEvent, ManualClock, ManualLifecycleSource, NamedUnit,
    RecordingCrashClient, RecordingSink, SystemClock,
};
use lifeline_core::domain::UnitSignal;
use lifeline_core::ports::{IClock, UiUnit};
use lifeline_telemetry::{LocalEnvironment, MemoryKeyValueStore};
use serde_json::json;
use tracing::debug;

use super::CliContext;
use crate::output::{get_formatter, OutputFormat};

/// Replay a lifecycle signal script and print the derived events
#[derive(Debug, Args)]
pub struct ReplayCommand {
    /// Script file
    script: PathBuf,

    /// Wall-clock start in epoch milliseconds (defaults to now)
    #[arg(long)]
    start_ms: Option<u64>,
}

/// One parsed script line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Wait(u64),
    Signal(UnitSignal, String),
    ViewLoaded(String, u64),
    Drop(String),
}

impl ReplayCommand {
    /// Replays run against their own in-memory bridge, never the on-disk cache.
    pub async fn execute(&self, _ctx: &CliContext, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));
        let text = std::fs::read_to_string(&self.script)
            .with_context(|| format!("Failed to read {}", self.script.display()))?;
        let steps = parse_script(&text)?;
        let start_ms = self.start_ms.unwrap_or_else(|| SystemClock::new().now_ms());

        let replay = replay(&steps, start_ms)?;

        if matches!(format, OutputFormat::Json) {
            formatter.print_json(&json!({
                "events": replay.events,
                "final_state": replay.final_state,
                "foreground": replay.foreground,
            }));
            return Ok(());
        }

        if replay.events.is_empty() {
            formatter.info("No events emitted.");
        }
        for event in &replay.events {
            println!("{:<18} {}", event.name, event.payload);
        }
        println!();
        formatter.info(&format!("Final state: {}", replay.final_state));
        if !replay.foreground.is_empty() {
            formatter.info(&format!("Foreground:  {}", replay.foreground));
        }
        Ok(())
    }
}

/// Outcome of a replay
#[derive(Debug)]
pub struct Replay {
    pub events: Vec<EmittedEvent>,
    pub final_state: String,
    pub foreground: String,
}

/// Parses a signal script, reporting the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (number, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }
        let step = parse_line(line).with_context(|| format!("line {}: '{}'", number + 1, line))?;
        steps.push(step);
    }
    Ok(steps)
}

fn parse_line(line: &str) -> Result<Step> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    match parts.as_slice() {
        ["wait", ms] => Ok(Step::Wait(ms.parse()?)),
        ["drop", unit] => Ok(Step::Drop((*unit).to_string())),
        ["view-loaded", unit, ms] => Ok(Step::ViewLoaded((*unit).to_string(), ms.parse()?)),
        [signal, unit] => {
            let signal: UnitSignal = signal.parse()?;
            Ok(Step::Signal(signal, (*unit).to_string()))
        }
        _ => bail!("expected '<signal> <unit>', 'wait <ms>', 'view-loaded <unit> <ms>' or 'drop <unit>'"),
    }
}

/// Runs `steps` against a fresh in-memory bridge.
pub fn replay(steps: &[Step], start_ms: u64) -> Result<Replay> {
    let clock = Arc::new(ManualClock::starting_at(start_ms));
    let sink = Arc::new(RecordingSink::new());
    let source = Arc::new(ManualLifecycleSource::new());
    let context = BridgeContext::new(
        Arc::new(MemoryKeyValueStore::new()),
        Arc::new(RecordingCrashClient::new()),
        sink.clone(),
        source.clone(),
    )
    .with_clock(clock.clone())
    .with_environment(Arc::new(LocalEnvironment::with_device_id("replay")));
    let bridge = Bridge::new(context)?;
    bridge.init_lifecycle_tracking(None)?;

    let mut units: HashMap<String, Arc<dyn UiUnit>> = HashMap::new();
    for step in steps {
        match step {
            Step::Wait(ms) => clock.advance(*ms),
            Step::Signal(signal, name) => {
                let unit = units
                    .entry(name.clone())
                    .or_insert_with(|| NamedUnit::shared(name.as_str()))
                    .clone();
                source.dispatch(*signal, &unit);
                if *signal == UnitSignal::Destroyed {
                    units.remove(name);
                }
            }
            Step::ViewLoaded(name, ms) => bridge.report_view_loaded(name, *ms),
            Step::Drop(name) => {
                units
                    .remove(name)
                    .ok_or_else(|| anyhow!("unit '{}' is not alive", name))?;
            }
        }
    }

    let events: Vec<EmittedEvent> = sink.events().iter().map(EmittedEvent::from).collect();
    debug!(steps = steps.len(), events = events.len(), "Replay finished");

    Ok(Replay {
        events,
        final_state: bridge.session_state().to_string(),
        foreground: bridge.current_view_name(),
    })
}
