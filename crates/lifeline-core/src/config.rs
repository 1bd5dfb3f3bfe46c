//! Configuration module for Lifeline.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Number of crash reports kept on device when nothing else is configured.
pub const DEFAULT_CACHE_CAPACITY: usize = 10;

/// Upper bound for the report cache capacity.
pub const MAX_CACHE_CAPACITY: usize = 64;

/// Clamps a requested capacity into `0..=MAX_CACHE_CAPACITY`.
pub fn clamp_capacity(requested: i64) -> usize {
    requested.clamp(0, MAX_CACHE_CAPACITY as i64) as usize
}

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for Lifeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crash_reporting: CrashReportingConfig,
    pub real_user_monitoring: RealUserMonitoringConfig,
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
}

/// Crash reporting SDK settings, applied once at `init`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashReportingConfig {
    /// Whether crash reporting is initialized at all.
    pub enabled: bool,
    /// Application API key issued by the collector.
    pub api_key: String,
    /// Application version attached to every report.
    pub version: String,
    /// Alternative collector endpoint. `None` uses the SDK default.
    pub custom_endpoint: Option<String>,
}

/// Lifecycle (real user monitoring) tracking settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealUserMonitoringConfig {
    /// Whether lifecycle tracking is started with the bridge.
    pub enabled: bool,
    /// Alternative collector endpoint for session events.
    pub custom_endpoint: Option<String>,
}

/// Local crash report cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of reports retained. Clamped into `0..=64` when applied.
    pub capacity: i64,
    /// Directory holding the persisted key-value files.
    pub dir: PathBuf,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/lifeline/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("lifeline")
            .join("config.yaml")
    }
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for CrashReportingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: String::new(),
            version: String::new(),
            custom_endpoint: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CACHE_CAPACITY as i64,
            dir: dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("~/.local/share"))
                .join("lifeline"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

impl CacheConfig {
    /// The configured capacity after clamping.
    pub fn effective_capacity(&self) -> usize {
        clamp_capacity(self.capacity)
    }
}

impl CrashReportingConfig {
    /// Checks the settings that `init` cannot proceed without.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.api_key.trim().is_empty() {
            return Err(DomainError::MissingField("crash_reporting.api_key".into()));
        }
        if let Some(endpoint) = &self.custom_endpoint {
            if !endpoint.is_empty()
                && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
            {
                return Err(DomainError::ValidationFailed(format!(
                    "crash_reporting.custom_endpoint must be an http(s) URL, got '{}'",
                    endpoint
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"cache.capacity"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- crash_reporting ---
        if self.crash_reporting.enabled {
            if let Err(e) = self.crash_reporting.check() {
                let field = match &e {
                    DomainError::MissingField(f) => f.clone(),
                    _ => "crash_reporting.custom_endpoint".to_string(),
                };
                errors.push(ValidationError {
                    field,
                    message: e.to_string(),
                });
            }
        }

        // --- cache ---
        if self.cache.capacity < 0 || self.cache.capacity > MAX_CACHE_CAPACITY as i64 {
            errors.push(ValidationError {
                field: "cache.capacity".into(),
                message: format!(
                    "must be in range 0..={} (got {}, will be clamped to {})",
                    MAX_CACHE_CAPACITY,
                    self.cache.capacity,
                    self.cache.effective_capacity()
                ),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use lifeline_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .api_key("my-api-key")
///     .version("1.4.2")
///     .cache_capacity(20)
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    // --- crash_reporting ---

    pub fn crash_reporting_enabled(mut self, enabled: bool) -> Self {
        self.config.crash_reporting.enabled = enabled;
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.config.crash_reporting.api_key = api_key.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.config.crash_reporting.version = version.into();
        self
    }

    pub fn custom_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.crash_reporting.custom_endpoint = Some(endpoint.into());
        self
    }

    // --- real_user_monitoring ---

    pub fn real_user_monitoring(mut self, enabled: bool) -> Self {
        self.config.real_user_monitoring.enabled = enabled;
        self
    }

    // --- cache ---

    pub fn cache_capacity(mut self, capacity: i64) -> Self {
        self.config.cache.capacity = capacity;
        self
    }

    pub fn cache_dir(mut self, dir: PathBuf) -> Self {
        self.config.cache.dir = dir;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
