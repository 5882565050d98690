//! Console sink implementation

use crate::core::{LogEntry, LogLevel, Result, Sink};
use chrono::SecondsFormat;
use colored::Colorize;
use std::io::{IsTerminal, Write};

pub struct ConsoleSink {
    use_colors: bool,
}

impl ConsoleSink {
    /// Colors are enabled when stdout is a terminal
    pub fn new() -> Self {
        Self {
            use_colors: std::io::stdout().is_terminal(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Render one entry as a single line (plus indented stack lines, if any)
    pub fn format_entry(&self, entry: &LogEntry) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", entry.level.to_str().to_uppercase())
                .color(entry.level.color_code())
                .to_string()
        } else {
            format!("{:5}", entry.level.to_str().to_uppercase())
        };

        let mut line = format!(
            "{} {} [{}] {}",
            entry.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            level_str,
            entry.effective_service(),
            entry.message
        );

        if !entry.context.is_empty() {
            line.push(' ');
            line.push_str(&entry.context.format_fields());
        }

        if let Some(ref error) = entry.error {
            line.push_str(&format!(" error=\"{}: {}\"", error.name, error.message));
            if let Some(ref stack) = error.stack {
                for frame in stack.lines() {
                    line.push_str("\n    ");
                    line.push_str(frame);
                }
            }
        }

        line
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, entry: &LogEntry) -> Result<()> {
        let output = self.format_entry(entry);

        // Route errors to stderr, others to stdout
        match entry.level {
            LogLevel::Error => eprintln!("{}", output),
            _ => println!("{}", output),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ErrorInfo, LogContext};

    #[test]
    fn test_plain_format() {
        let sink = ConsoleSink::with_colors(false);
        let entry = LogEntry::new(LogLevel::Warn, "Rate limit approaching", "api")
            .with_context(LogContext::new().with_field("limit", 100).with_field("current", 95));

        let line = sink.format_entry(&entry);

        assert!(line.contains("WARN  [api] Rate limit approaching"));
        assert!(line.ends_with("current=95 limit=100"));
    }

    #[test]
    fn test_context_service_shown() {
        let sink = ConsoleSink::with_colors(false);
        let entry = LogEntry::new(LogLevel::Info, "hi", "custom-api")
            .with_context(LogContext::new().with_field("service", "api"));

        assert!(sink.format_entry(&entry).contains("[api] hi"));
    }

    #[test]
    fn test_format_with_error_and_stack() {
        let sink = ConsoleSink::with_colors(false);
        let entry = LogEntry::new(LogLevel::Error, "Database connection failed", "api")
            .with_error(ErrorInfo::new("DbError", "refused").with_stack("caused by: timeout"));

        let line = sink.format_entry(&entry);

        assert!(line.contains("error=\"DbError: refused\""));
        assert!(line.contains("\n    caused by: timeout"));
    }

    #[test]
    fn test_write_and_flush() {
        let mut sink = ConsoleSink::with_colors(false);
        let entry = LogEntry::new(LogLevel::Info, "console test", "api");
        assert!(sink.write(&entry).is_ok());
        assert!(sink.flush().is_ok());
        assert_eq!(sink.name(), "console");
    }
}
