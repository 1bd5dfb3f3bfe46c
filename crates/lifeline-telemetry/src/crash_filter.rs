//! Crash filter
//!
//! Reports whose error originated in the embedded script runtime are already
//! delivered by the script-side reporter. Sending them again from the native
//! layer would double-count the crash, so they are vetoed here.

use std::sync::Arc;

use lifeline_core::ports::BeforeSendHook;
use serde_json::Value;
use tracing::debug;

use crate::crash_report::CrashReportPayload;

/// Substring the script runtime's exception wrapper puts in the error message.
pub const SCRIPT_RUNTIME_MARKER: &str = "JavascriptException";

/// JSON pointer to the error message inside a serialized report.
const MESSAGE_POINTER: &str = "/Details/Error/Message";

/// Decides whether a report may leave the device.
pub struct CrashFilter;

impl CrashFilter {
    /// True when a report with this error message should be sent.
    pub fn should_send(error_message: &str) -> bool {
        !error_message.contains(SCRIPT_RUNTIME_MARKER)
    }

    /// Passes the report through unchanged, or vetoes it.
    pub fn filter(report: CrashReportPayload) -> Option<CrashReportPayload> {
        if Self::should_send(report.error_message()) {
            Some(report)
        } else {
            debug!(
                class_name = %report.details.error.class_name,
                "Vetoed report raised by the script runtime"
            );
            None
        }
    }

    /// Same decision on an opaque serialized report.
    ///
    /// A report without an error message is always sent.
    pub fn filter_value(report: &Value) -> bool {
        let message = report
            .pointer(MESSAGE_POINTER)
            .and_then(Value::as_str)
            .unwrap_or_default();
        let send = Self::should_send(message);
        if !send {
            debug!("Vetoed serialized report raised by the script runtime");
        }
        send
    }

    /// The filter as a before-send hook for the crash SDK.
    pub fn hook() -> BeforeSendHook {
        Arc::new(Self::filter_value)
    }
}
