//! Breadcrumbs: leveled diagnostic annotations attached to later reports

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Severity of a breadcrumb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BreadcrumbLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl BreadcrumbLevel {
    /// Parses a level case-insensitively. Anything unrecognized is `Info`.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => BreadcrumbLevel::Debug,
            "warning" => BreadcrumbLevel::Warning,
            "error" => BreadcrumbLevel::Error,
            _ => BreadcrumbLevel::Info,
        }
    }
}

impl From<&str> for BreadcrumbLevel {
    fn from(s: &str) -> Self {
        Self::parse_lenient(s)
    }
}

impl std::fmt::Display for BreadcrumbLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BreadcrumbLevel::Debug => "debug",
            BreadcrumbLevel::Info => "info",
            BreadcrumbLevel::Warning => "warning",
            BreadcrumbLevel::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// A timestamped diagnostic annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Breadcrumb {
    pub message: String,
    pub category: String,
    pub level: BreadcrumbLevel,
    pub custom_data: Map<String, Value>,
    /// Epoch milliseconds
    pub timestamp: u64,
}

impl Breadcrumb {
    /// Creates an `Info` breadcrumb with an empty category and no custom data
    pub fn new(message: impl Into<String>, timestamp: u64) -> Self {
        Self {
            message: message.into(),
            category: String::new(),
            level: BreadcrumbLevel::Info,
            custom_data: Map::new(),
            timestamp,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_level(mut self, level: BreadcrumbLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_custom_data(mut self, custom_data: Map<String, Value>) -> Self {
        self.custom_data = custom_data;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_parsing_is_case_insensitive() {
        assert_eq!(BreadcrumbLevel::parse_lenient("DEBUG"), BreadcrumbLevel::Debug);
        assert_eq!(BreadcrumbLevel::parse_lenient("Warning"), BreadcrumbLevel::Warning);
        assert_eq!(BreadcrumbLevel::parse_lenient("error"), BreadcrumbLevel::Error);
        assert_eq!(BreadcrumbLevel::parse_lenient("iNfO"), BreadcrumbLevel::Info);
    }

    #[test]
    fn test_unknown_level_defaults_to_info() {
        assert_eq!(BreadcrumbLevel::parse_lenient("fatal"), BreadcrumbLevel::Info);
        assert_eq!(BreadcrumbLevel::parse_lenient(""), BreadcrumbLevel::Info);
        assert_eq!(BreadcrumbLevel::from("warn"), BreadcrumbLevel::Info);
    }

    #[test]
    fn test_builder() {
        let mut data = Map::new();
        data.insert("screen".into(), Value::String("Home".into()));

        let crumb = Breadcrumb::new("tapped login", 42)
            .with_category("ui")
            .with_level(BreadcrumbLevel::Debug)
            .with_custom_data(data);

        assert_eq!(crumb.message, "tapped login");
        assert_eq!(crumb.category, "ui");
        assert_eq!(crumb.level, BreadcrumbLevel::Debug);
        assert_eq!(crumb.custom_data["screen"], "Home");
        assert_eq!(crumb.timestamp, 42);
    }
}
