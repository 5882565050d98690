//! Logger configuration and its resolution from partial input
//!
//! Resolution order for every field: explicit value, then environment
//! default (only the level has one), then the hardcoded fallback.

use super::error::{LoggerError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SERVICE: &str = "ctxlog";
pub const DEFAULT_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";
/// 10 MiB
pub const DEFAULT_MAX_SIZE: u64 = 10 * 1024 * 1024;
pub const DEFAULT_RETENTION: Retention = Retention::Days(14);
/// Environment variable supplying the default minimum level
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// How many rotated log files to keep
///
/// Parsed from a bare count (`"5"`) or an age in days (`"14d"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "String")]
pub enum Retention {
    /// Keep the newest N rotated files
    Count(usize),
    /// Delete rotated files last modified more than N days ago
    Days(u64),
}

impl fmt::Display for Retention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Retention::Count(n) => write!(f, "{}", n),
            Retention::Days(d) => write!(f, "{}d", d),
        }
    }
}

impl From<Retention> for String {
    fn from(retention: Retention) -> Self {
        retention.to_string()
    }
}

impl FromStr for Retention {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || LoggerError::config("max_files", format!("expected '<n>' or '<n>d', got '{}'", s));

        if let Some(days) = s.strip_suffix('d').or_else(|| s.strip_suffix('D')) {
            days.trim().parse().map(Retention::Days).map_err(|_| invalid())
        } else {
            s.parse().map(Retention::Count).map_err(|_| invalid())
        }
    }
}

impl<'de> Deserialize<'de> for Retention {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match NumOrString::deserialize(deserializer)? {
            NumOrString::Num(n) => Ok(Retention::Count(n as usize)),
            NumOrString::Str(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrString {
    Num(u64),
    Str(String),
}

/// Parse a human size such as `"10m"`, `"512k"`, `"1g"` or `"2048"` (bytes)
pub fn parse_size(input: &str) -> Result<u64> {
    let s = input.trim().to_lowercase();
    let invalid = || LoggerError::config("max_size", format!("invalid size '{}'", input));

    let (digits, multiplier) = match s.chars().last() {
        Some('k') => (&s[..s.len() - 1], 1024),
        Some('m') => (&s[..s.len() - 1], 1024 * 1024),
        Some('g') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
        Some(_) => (s.as_str(), 1),
        None => return Err(invalid()),
    };

    let value: u64 = digits.trim().parse().map_err(|_| invalid())?;
    value.checked_mul(multiplier).ok_or_else(invalid)
}

fn deserialize_size<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<NumOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(NumOrString::Num(n)) => Ok(Some(n)),
        Some(NumOrString::Str(s)) => parse_size(&s).map(Some).map_err(serde::de::Error::custom),
    }
}

/// Ambient defaults captured from the process environment.
///
/// Capture this once at startup and pass it down; nothing in the crate
/// reads the environment while logging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvDefaults {
    pub level: Option<String>,
}

impl EnvDefaults {
    /// Read `LOG_LEVEL`. An empty value counts as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            level: lookup(LOG_LEVEL_ENV).filter(|v| !v.trim().is_empty()),
        }
    }

    #[must_use]
    pub fn with_level(level: impl Into<String>) -> Self {
        Self {
            level: Some(level.into()),
        }
    }
}

/// Caller-supplied configuration; every field optional.
///
/// # Example
///
/// ```
/// use ctxlog::PartialLoggerConfig;
///
/// let partial: PartialLoggerConfig = serde_json::from_str(
///     r#"{ "level": "debug", "max_size": "20m", "max_files": "7d" }"#,
/// ).unwrap();
/// assert_eq!(partial.max_size, Some(20 * 1024 * 1024));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PartialLoggerConfig {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
    #[serde(default, deserialize_with = "deserialize_size")]
    pub max_size: Option<u64>,
    #[serde(default)]
    pub max_files: Option<Retention>,
    #[serde(default)]
    pub compress: Option<bool>,
    #[serde(default)]
    pub test: Option<bool>,
}

impl PartialLoggerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value"]
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_size(mut self, bytes: u64) -> Self {
        self.max_size = Some(bytes);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_files(mut self, retention: Retention) -> Self {
        self.max_files = Some(retention);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compress(mut self, enabled: bool) -> Self {
        self.compress = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn test(mut self, enabled: bool) -> Self {
        self.test = Some(enabled);
        self
    }
}

/// Fully resolved configuration; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggerConfig {
    pub service: String,
    /// Kept verbatim; see [`crate::LevelFilter::parse`] for how it is applied
    pub level: String,
    pub log_dir: PathBuf,
    pub max_size: u64,
    pub max_files: Retention,
    pub compress: bool,
    /// When set, no durable sink is ever constructed
    pub test: bool,
}

impl LoggerConfig {
    pub fn resolve(partial: PartialLoggerConfig, env: &EnvDefaults) -> Self {
        Self {
            service: partial.service.unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            level: partial
                .level
                .or_else(|| env.level.clone())
                .unwrap_or_else(|| DEFAULT_LEVEL.to_string()),
            log_dir: partial.log_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
            max_size: partial.max_size.unwrap_or(DEFAULT_MAX_SIZE),
            max_files: partial.max_files.unwrap_or(DEFAULT_RETENTION),
            compress: partial.compress.unwrap_or(false),
            test: partial.test.unwrap_or(false),
        }
    }

    /// Service name made safe for use in a file name
    pub fn file_stem(&self) -> String {
        let stem: String = self
            .service
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        if stem.trim_matches('.').is_empty() {
            DEFAULT_SERVICE.to_string()
        } else {
            stem
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self::resolve(PartialLoggerConfig::default(), &EnvDefaults::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LoggerConfig::default();

        assert_eq!(config.service, "ctxlog");
        assert_eq!(config.level, "info");
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert_eq!(config.max_size, 10 * 1024 * 1024);
        assert_eq!(config.max_files, Retention::Days(14));
        assert!(!config.compress);
        assert!(!config.test);
    }

    #[test]
    fn test_env_level_used_when_not_explicit() {
        let env = EnvDefaults::with_level("error");
        let config = LoggerConfig::resolve(PartialLoggerConfig::new(), &env);
        assert_eq!(config.level, "error");
    }

    #[test]
    fn test_explicit_level_beats_env() {
        let env = EnvDefaults::with_level("error");
        let config = LoggerConfig::resolve(PartialLoggerConfig::new().level("debug"), &env);
        assert_eq!(config.level, "debug");
    }

    #[test]
    fn test_invalid_level_kept_verbatim() {
        let config = LoggerConfig::resolve(
            PartialLoggerConfig::new().level("LOUD"),
            &EnvDefaults::default(),
        );
        assert_eq!(config.level, "LOUD");
    }

    #[test]
    fn test_env_from_lookup_ignores_empty() {
        let env = EnvDefaults::from_lookup(|_| Some(String::new()));
        assert_eq!(env.level, None);

        let env = EnvDefaults::from_lookup(|key| {
            assert_eq!(key, LOG_LEVEL_ENV);
            Some("warn".to_string())
        });
        assert_eq!(env.level.as_deref(), Some("warn"));
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("10m").unwrap(), 10 * 1024 * 1024);
        assert_eq!(parse_size("512K").unwrap(), 512 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("2048").unwrap(), 2048);
        assert!(parse_size("").is_err());
        assert!(parse_size("ten").is_err());
        assert!(parse_size("m").is_err());
    }

    #[test]
    fn test_parse_retention() {
        assert_eq!("14d".parse::<Retention>().unwrap(), Retention::Days(14));
        assert_eq!("5".parse::<Retention>().unwrap(), Retention::Count(5));
        assert!("two weeks".parse::<Retention>().is_err());
        assert_eq!(Retention::Days(30).to_string(), "30d");
    }

    #[test]
    fn test_partial_from_json() {
        let partial: PartialLoggerConfig = serde_json::from_str(
            r#"{ "service": "api", "max_size": 4096, "max_files": 3, "test": true }"#,
        )
        .unwrap();

        assert_eq!(partial.service.as_deref(), Some("api"));
        assert_eq!(partial.max_size, Some(4096));
        assert_eq!(partial.max_files, Some(Retention::Count(3)));
        assert_eq!(partial.test, Some(true));
        assert_eq!(partial.level, None);
    }

    #[test]
    fn test_partial_rejects_bad_size() {
        let result: std::result::Result<PartialLoggerConfig, _> =
            serde_json::from_str(r#"{ "max_size": "lots" }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_file_stem_sanitized() {
        let mut config = LoggerConfig::default();
        config.service = "billing/api v2".to_string();
        assert_eq!(config.file_stem(), "billing_api_v2");

        config.service = "..".to_string();
        assert_eq!(config.file_stem(), "ctxlog");
    }
}
