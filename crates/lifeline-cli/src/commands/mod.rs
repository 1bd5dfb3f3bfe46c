//! CLI subcommands

use std::path::PathBuf;

use lifeline_bridge::Bridge;
use lifeline_core::config::Config;

pub mod constants;
pub mod device_id;
pub mod env;
pub mod replay;
pub mod reports;

/// State shared by every subcommand
pub struct CliContext {
    pub config: Config,
    /// Directory holding the report cache
    pub dir: PathBuf,
    pub bridge: Bridge,
}
