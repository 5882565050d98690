//! Log entry structure

use super::error_info::ErrorInfo;
use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// One log event as handed to sinks.
///
/// Entries are built per call and live only for the duration of dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub service: String,
    #[serde(default)]
    pub context: LogContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl LogEntry {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(level: LogLevel, message: &str, service: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: Self::sanitize_message(message),
            service: service.into(),
            context: LogContext::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: LogContext) -> Self {
        self.context = context;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    /// Service name as it appears in the record.
    ///
    /// A `service` context field is more specific than the configured name
    /// and takes precedence over it.
    pub fn effective_service(&self) -> Cow<'_, str> {
        match self.context.get("service") {
            Some(FieldValue::String(s)) => Cow::Borrowed(s.as_str()),
            Some(other) => Cow::Owned(other.to_string()),
            None => Cow::Borrowed(self.service.as_str()),
        }
    }

    /// Flat JSON record: context fields at the top level.
    ///
    /// A context `service` field overrides the configured service. The
    /// entry's other keys (`timestamp`, `level`, `message`, `error`) take
    /// precedence over context keys of the same name.
    pub fn to_json_value(&self) -> serde_json::Value {
        let mut obj = serde_json::Map::new();
        obj.insert(
            "service".to_string(),
            serde_json::Value::String(self.service.clone()),
        );
        obj.extend(self.context.to_json_map());

        obj.insert(
            "timestamp".to_string(),
            serde_json::Value::String(self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        obj.insert(
            "level".to_string(),
            serde_json::Value::String(self.level.to_str().to_string()),
        );
        obj.insert(
            "message".to_string(),
            serde_json::Value::String(self.message.clone()),
        );
        match &self.error {
            Some(error) => {
                obj.insert("error".to_string(), serde_json::to_value(error).unwrap_or_default());
            }
            None => {
                // a context key named "error" must not masquerade as an error descriptor
                obj.remove("error");
            }
        }

        serde_json::Value::Object(obj)
    }

    /// Single-line JSON rendering of [`LogEntry::to_json_value`]
    pub fn to_json(&self) -> String {
        self.to_json_value().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_sanitized() {
        let entry = LogEntry::new(LogLevel::Info, "line1\nline2\tx", "svc");
        assert_eq!(entry.message, "line1\\nline2\\tx");
    }

    #[test]
    fn test_json_omits_missing_error() {
        let entry = LogEntry::new(LogLevel::Error, "boom", "svc");
        let json = entry.to_json_value();

        assert!(json.get("error").is_none());
        assert_eq!(json["level"], "error");
        assert_eq!(json["service"], "svc");

        let serialized = serde_json::to_value(&entry).unwrap();
        assert!(serialized.get("error").is_none());
    }

    #[test]
    fn test_json_flattens_context() {
        let entry = LogEntry::new(LogLevel::Info, "hello", "svc")
            .with_context(LogContext::new().with_field("request_id", "r-1").with_field("level", "spoofed"));
        let json = entry.to_json_value();

        assert_eq!(json["request_id"], "r-1");
        assert_eq!(json["level"], "info");
        assert_eq!(json["message"], "hello");
    }

    #[test]
    fn test_context_service_overrides_configured() {
        let entry = LogEntry::new(LogLevel::Info, "hi", "custom-api")
            .with_context(LogContext::new().with_field("service", "api"));

        assert_eq!(entry.effective_service(), "api");
        assert_eq!(entry.to_json_value()["service"], "api");

        let plain = LogEntry::new(LogLevel::Info, "hi", "custom-api");
        assert_eq!(plain.effective_service(), "custom-api");
        assert_eq!(plain.to_json_value()["service"], "custom-api");
    }

    #[test]
    fn test_json_includes_error() {
        let entry = LogEntry::new(LogLevel::Error, "failed", "svc")
            .with_error(ErrorInfo::new("IoError", "disk full"));
        let json = entry.to_json_value();

        assert_eq!(json["error"]["name"], "IoError");
        assert_eq!(json["error"]["message"], "disk full");
        assert!(json["error"].get("stack").is_none());
    }
}
