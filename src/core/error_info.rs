//! Normalized error descriptor attached to error-level entries

use serde::{Deserialize, Serialize};
use std::error::Error;

/// Error details carried by an error-level log entry.
///
/// `stack` is omitted from serialized output when absent, so a consumer can
/// tell "no trace available" apart from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorInfo {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: None,
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    /// Describe any error value.
    ///
    /// The name is the error's type name without its module path. The
    /// `source()` chain, if any, becomes the stack text with one
    /// `caused by:` line per link.
    pub fn from_error<E: Error>(err: &E) -> Self {
        Self {
            name: short_type_name::<E>().to_string(),
            message: err.to_string(),
            stack: source_chain(err),
        }
    }
}

impl<E: Error> From<&E> for ErrorInfo {
    fn from(err: &E) -> Self {
        ErrorInfo::from_error(err)
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

fn source_chain(err: &dyn Error) -> Option<String> {
    let mut lines = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        lines.push(format!("caused by: {}", cause));
        current = cause.source();
    }
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
