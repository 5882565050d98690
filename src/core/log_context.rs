//! Structured logging context for key-value fields
//!
//! This module provides:
//! - `FieldValue`: a JSON-like value stored under a context key
//! - `LogContext`: an immutable-by-convention bag of fields with explicit
//!   merge precedence (the later context wins on key collision)

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Value type for structured logging fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Vec<FieldValue>),
    Object(BTreeMap<String, FieldValue>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Null => write!(f, "null"),
            FieldValue::Array(_) | FieldValue::Object(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl FieldValue {
    /// Convert to serde_json::Value for JSON serialization
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            FieldValue::String(s) => serde_json::Value::String(s.clone()),
            FieldValue::Int(i) => serde_json::Value::Number((*i).into()),
            FieldValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            FieldValue::Null => serde_json::Value::Null,
            FieldValue::Array(items) => {
                serde_json::Value::Array(items.iter().map(FieldValue::to_json_value).collect())
            }
            FieldValue::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect(),
            ),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i64::from(i))
    }
}

impl From<u64> for FieldValue {
    fn from(i: u64) -> Self {
        i64::try_from(i)
            .map(FieldValue::Int)
            .unwrap_or(FieldValue::Float(i as f64))
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::from(i as u64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(FieldValue::Null)
    }
}

impl From<BTreeMap<String, FieldValue>> for FieldValue {
    fn from(map: BTreeMap<String, FieldValue>) -> Self {
        FieldValue::Object(map)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Int(i),
                None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => FieldValue::String(s),
            serde_json::Value::Array(items) => {
                FieldValue::Array(items.into_iter().map(FieldValue::from).collect())
            }
            serde_json::Value::Object(map) => FieldValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Context for structured logging with key-value fields
///
/// A logger holds one of these as its ambient context and merges each call's
/// context over it. Merging never mutates either side; see [`LogContext::merged`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogContext {
    fields: HashMap<String, FieldValue>,
}

impl LogContext {
    /// Create a new empty log context
    pub fn new() -> Self {
        Self {
            fields: HashMap::new(),
        }
    }

    /// Add a field to the context
    #[must_use]
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field to the context (mutable version)
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Get all fields
    pub fn fields(&self) -> &HashMap<String, FieldValue> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if context has any fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merge `overlay` over this context into a new context.
    ///
    /// Keys present in both take the value from `overlay`. Values are
    /// replaced whole; nested objects are not merged recursively.
    #[must_use]
    pub fn merged(&self, overlay: &LogContext) -> LogContext {
        if overlay.is_empty() {
            return self.clone();
        }
        let mut fields = self.fields.clone();
        fields.extend(
            overlay
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        LogContext { fields }
    }

    /// Fields as a JSON object map
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        self.fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json_value()))
            .collect()
    }

    /// Format fields as key=value pairs, sorted by key
    pub fn format_fields(&self) -> String {
        let mut pairs: Vec<_> = self.fields.iter().collect();
        pairs.sort_by(|a, b| a.0.cmp(b.0));
        pairs
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl<K, V> FromIterator<(K, V)> for LogContext
where
    K: Into<String>,
    V: Into<FieldValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<String, FieldValue>> for LogContext {
    fn from(fields: HashMap<String, FieldValue>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_creation() {
        let ctx = LogContext::new();
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_log_context_with_fields() {
        let ctx = LogContext::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("active", true);

        assert_eq!(ctx.len(), 3);
        assert_eq!(ctx.get("user_id"), Some(&FieldValue::Int(123)));
    }

    #[test]
    fn test_log_context_format() {
        let ctx = LogContext::new()
            .with_field("key2", 42)
            .with_field("key1", "value1");

        assert_eq!(ctx.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_merged_overlay_wins() {
        let base = LogContext::new()
            .with_field("service", "api")
            .with_field("request_id", "r-1");
        let overlay = LogContext::new()
            .with_field("request_id", "r-2")
            .with_field("user", "alice");

        let merged = base.merged(&overlay);

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("service"), Some(&FieldValue::from("api")));
        assert_eq!(merged.get("request_id"), Some(&FieldValue::from("r-2")));
        assert_eq!(merged.get("user"), Some(&FieldValue::from("alice")));
    }

    #[test]
    fn test_merged_leaves_inputs_untouched() {
        let base = LogContext::new().with_field("a", 1);
        let overlay = LogContext::new().with_field("a", 2).with_field("b", 3);

        let _ = base.merged(&overlay);

        assert_eq!(base, LogContext::new().with_field("a", 1));
        assert_eq!(overlay.len(), 2);
    }

    #[test]
    fn test_merge_replaces_nested_objects_whole() {
        let mut inner = BTreeMap::new();
        inner.insert("x".to_string(), FieldValue::Int(1));
        inner.insert("y".to_string(), FieldValue::Int(2));
        let base = LogContext::new().with_field("obj", inner);

        let mut replacement = BTreeMap::new();
        replacement.insert("x".to_string(), FieldValue::Int(9));
        let overlay = LogContext::new().with_field("obj", replacement.clone());

        let merged = base.merged(&overlay);
        assert_eq!(merged.get("obj"), Some(&FieldValue::Object(replacement)));
    }

    #[test]
    fn test_field_value_from_json() {
        let value = serde_json::json!({
            "list": [1, 2.5, "three", null],
            "flag": true
        });

        let field = FieldValue::from(value.clone());
        assert_eq!(field.to_json_value(), value);
    }

    #[test]
    fn test_field_value_from_option_and_vec() {
        assert_eq!(FieldValue::from(None::<i32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some("x")), FieldValue::from("x"));
        assert_eq!(
            FieldValue::from(vec![1, 2]),
            FieldValue::Array(vec![FieldValue::Int(1), FieldValue::Int(2)])
        );
        assert_eq!(FieldValue::from(u64::MAX), FieldValue::Float(u64::MAX as f64));
    }

    #[test]
    fn test_context_serializes_as_plain_map() {
        let ctx = LogContext::new().with_field("attempt", 3);
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json, serde_json::json!({ "attempt": 3 }));

        let back: LogContext = serde_json::from_value(json).unwrap();
        assert_eq!(back, ctx);
    }

    #[test]
    fn test_from_iterator() {
        let ctx: LogContext = vec![("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(ctx.len(), 2);
    }
}
