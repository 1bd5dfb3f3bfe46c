//! Crash report payload model and panic capture
//!
//! [`CrashReportPayload`] mirrors the crash SDK's report schema (PascalCase
//! keys). The report store keeps payloads as opaque JSON; this model is used
//! where a report needs to be inspected or produced natively.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use lifeline_core::domain::{Breadcrumb, User};
use lifeline_core::ports::IEnvironmentProvider;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::BoundedReportStore;

/// Client name reported alongside every natively produced report.
pub const CLIENT_NAME: &str = "lifeline";

/// A crash report as accepted by the collector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CrashReportPayload {
    pub occurred_on: DateTime<Utc>,
    #[serde(default)]
    pub details: ReportDetails,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ReportDetails {
    pub error: ErrorDetails,
    pub environment: BTreeMap<String, Value>,
    pub client: ClientInfo,
    pub user_custom_data: Map<String, Value>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub breadcrumbs: Vec<Breadcrumb>,
    pub version: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ErrorDetails {
    pub class_name: String,
    pub message: String,
    pub stack_trace: Vec<StackFrame>,
    pub stack_string: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct StackFrame {
    pub file_name: String,
    pub line_number: u32,
    pub column_number: Option<u32>,
    pub method_name: String,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self {
            name: CLIENT_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl CrashReportPayload {
    /// Creates a report for an error that occurred now.
    pub fn new(class_name: &str, message: &str) -> Self {
        Self {
            occurred_on: Utc::now(),
            details: ReportDetails {
                error: ErrorDetails {
                    class_name: class_name.to_string(),
                    message: message.to_string(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    pub fn with_stack(mut self, frames: Vec<StackFrame>, stack_string: impl Into<String>) -> Self {
        self.details.error.stack_trace = frames;
        self.details.error.stack_string = stack_string.into();
        self
    }

    pub fn with_environment(mut self, environment: BTreeMap<String, Value>) -> Self {
        self.details.environment = environment;
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.details.version = version.into();
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.details.tags = tags;
        self
    }

    pub fn with_custom_data(mut self, data: Map<String, Value>) -> Self {
        self.details.user_custom_data = data;
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.details.user = Some(user);
        self
    }

    pub fn error_message(&self) -> &str {
        &self.details.error.message
    }

    /// Parses a serialized report. Unknown fields are ignored.
    pub fn from_value(value: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Panic capture
// ============================================================================

/// Builds a report from a panic message and location.
pub fn panic_report(
    message: &str,
    location: Option<(&str, u32, u32)>,
    backtrace: &str,
    version: &str,
    environment: BTreeMap<String, Value>,
) -> CrashReportPayload {
    let frames = location
        .map(|(file, line, column)| {
            vec![StackFrame {
                file_name: file.to_string(),
                line_number: line,
                column_number: Some(column),
                method_name: String::new(),
                class_name: String::new(),
            }]
        })
        .unwrap_or_default();

    CrashReportPayload::new("panic", message)
        .with_stack(frames, backtrace)
        .with_version(version)
        .with_environment(environment)
}

/// Installs a panic hook that caches a crash report into `store`.
///
/// Chains with the existing panic hook so default behavior (stderr output)
/// is preserved. Reports vetoed by the crash filter are not cached.
pub fn install_panic_reporter(
    store: Arc<BoundedReportStore>,
    version: String,
    environment: Arc<dyn IEnvironmentProvider>,
) {
    let previous_hook = std::panic::take_hook();

    std::panic::set_hook(Box::new(move |panic_info| {
        let message = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };

        let location = panic_info
            .location()
            .map(|l| (l.file(), l.line(), l.column()));

        let backtrace = std::backtrace::Backtrace::force_capture().to_string();

        let report = panic_report(
            &message,
            location,
            &backtrace,
            &version,
            environment.snapshot(),
        );

        if let Some(report) = crate::CrashFilter::filter(report) {
            match report.to_json() {
                Ok(json) => {
                    if let Err(e) = store.cache(&json) {
                        eprintln!("Failed to cache crash report: {e}");
                    }
                }
                Err(e) => eprintln!("Failed to serialize crash report: {e}"),
            }
        }

        previous_hook(panic_info);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_pascal_case_keys() {
        let report = CrashReportPayload::new("IOException", "disk full").with_version("1.2.3");
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["Details"]["Error"]["ClassName"], "IOException");
        assert_eq!(value["Details"]["Error"]["Message"], "disk full");
        assert_eq!(value["Details"]["Version"], "1.2.3");
        assert_eq!(value["Details"]["Client"]["Name"], CLIENT_NAME);
        assert!(value["OccurredOn"].is_string());
        assert!(value["Details"].get("User").is_none());
    }

    #[test]
    fn test_parses_foreign_report_and_ignores_unknown_fields() {
        let value = json!({
            "OccurredOn": "2024-03-01T10:00:00Z",
            "Details": {
                "Error": {
                    "ClassName": "TypeError",
                    "Message": "JavascriptException: x is undefined",
                    "StackTrace": [{"FileName": "index.bundle", "LineNumber": 12, "ColumnNumber": null, "MethodName": "render", "ClassName": ""}],
                    "StackString": "at render"
                },
                "Environment": {"UtcOffset": 2.0},
                "Tags": ["beta"],
                "MachineName": "ignored"
            }
        });

        let report = CrashReportPayload::from_value(&value).unwrap();
        assert_eq!(report.details.error.class_name, "TypeError");
        assert_eq!(report.details.error.stack_trace.len(), 1);
        assert_eq!(report.details.error.stack_trace[0].column_number, None);
        assert_eq!(report.details.tags, vec!["beta".to_string()]);
        assert_eq!(report.details.environment["UtcOffset"], json!(2.0));
    }

    #[test]
    fn test_panic_report_carries_location_frame() {
        let report = panic_report(
            "index out of bounds",
            Some(("src/main.rs", 10, 5)),
            "bt",
            "0.3.0",
            BTreeMap::new(),
        );
        assert_eq!(report.details.error.class_name, "panic");
        assert_eq!(report.details.error.stack_trace[0].file_name, "src/main.rs");
        assert_eq!(report.details.error.stack_trace[0].line_number, 10);
        assert_eq!(report.details.error.stack_string, "bt");
        assert_eq!(report.details.version, "0.3.0");
    }
}
