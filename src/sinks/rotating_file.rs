//! Rotating file sink
//!
//! Writes one JSON record per line to `<dir>/<stem>-<YYYY-MM-DD>.log`.
//! A new file is started when the local date changes, and the active file
//! is rolled to `<file>.<n>` once it reaches the configured size. After
//! every rotation, old files of the same stem are pruned according to the
//! retention policy.

use crate::core::{LogEntry, LoggerConfig, LoggerError, Result, Retention, Sink};
use chrono::{Local, NaiveDate};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Size and retention limits for a [`RotatingFileSink`]
///
/// # Examples
///
/// ```
/// use ctxlog::sinks::RotationPolicy;
/// use ctxlog::Retention;
///
/// let policy = RotationPolicy::new()
///     .with_max_size(50 * 1024 * 1024)
///     .with_retention(Retention::Count(7))
///     .with_compression(true);
/// assert_eq!(policy.max_bytes, 50 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RotationPolicy {
    /// Roll the active file once it reaches this many bytes (0 disables)
    pub max_bytes: u64,
    pub retention: Retention,
    /// Gzip files once they are rotated out
    pub compress: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: crate::core::config::DEFAULT_MAX_SIZE,
            retention: crate::core::config::DEFAULT_RETENTION,
            compress: false,
        }
    }
}

impl RotationPolicy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_max_size(mut self, size: u64) -> Self {
        self.max_bytes = size;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_retention(mut self, retention: Retention) -> Self {
        self.retention = retention;
        self
    }

    #[must_use = "builder methods return a new value and do not modify the original"]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }
}

impl From<&LoggerConfig> for RotationPolicy {
    fn from(config: &LoggerConfig) -> Self {
        Self {
            max_bytes: config.max_size,
            retention: config.max_files,
            compress: config.compress,
        }
    }
}

/// Date- and size-rotating JSON-lines file sink
///
/// # Examples
///
/// ```no_run
/// use ctxlog::sinks::{RotatingFileSink, RotationPolicy};
///
/// let sink = RotatingFileSink::new("/var/log/myapp", "api", RotationPolicy::default()).unwrap();
/// ```
pub struct RotatingFileSink {
    dir: PathBuf,
    stem: String,
    policy: RotationPolicy,
    writer: Option<BufWriter<File>>,
    current_path: PathBuf,
    current_date: NaiveDate,
    current_size: u64,
}

impl RotatingFileSink {
    /// Create the directory if needed and open today's file
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be created
    pub fn new<P: AsRef<Path>>(dir: P, stem: impl Into<String>, policy: RotationPolicy) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let stem = stem.into();

        fs::create_dir_all(&dir).map_err(|e| {
            LoggerError::io_operation(
                "create log directory",
                format!("Failed to create directory '{}'", dir.display()),
                e,
            )
        })?;

        let today = Local::now().date_naive();
        let current_path = Self::dated_path(&dir, &stem, today);
        let (writer, current_size) = Self::open(&current_path)?;

        Ok(Self {
            dir,
            stem,
            policy,
            writer: Some(writer),
            current_path,
            current_date: today,
            current_size,
        })
    }

    /// Build from a resolved config: `<log_dir>/<service>-<date>.log`
    pub fn from_config(config: &LoggerConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.file_stem(), RotationPolicy::from(config))
    }

    #[must_use]
    pub fn current_path(&self) -> &Path {
        &self.current_path
    }

    #[must_use]
    pub fn current_size(&self) -> u64 {
        self.current_size
    }

    #[must_use]
    pub fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    fn dated_path(dir: &Path, stem: &str, date: NaiveDate) -> PathBuf {
        dir.join(format!("{}-{}.log", stem, date.format(DATE_FORMAT)))
    }

    fn open(path: &Path) -> Result<(BufWriter<File>, u64)> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                LoggerError::file_sink(path.display().to_string(), format!("Failed to open: {}", e))
            })?;

        let size = file
            .metadata()
            .map_err(|e| {
                LoggerError::file_sink(
                    path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?
            .len();

        Ok((BufWriter::new(file), size))
    }

    /// `<path>` with `suffix` appended to its file name
    fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
        let mut name: OsString = path.as_os_str().to_owned();
        name.push(suffix);
        PathBuf::from(name)
    }

    fn close_writer(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.current_path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Start the file for a new date
    fn roll_to_date(&mut self, date: NaiveDate) -> Result<()> {
        self.close_writer()?;

        let finished = self.current_path.clone();
        if self.policy.compress && finished.exists() {
            self.compress_file(&finished)?;
        }

        self.current_path = Self::dated_path(&self.dir, &self.stem, date);
        self.current_date = date;
        let (writer, size) = Self::open(&self.current_path)?;
        self.writer = Some(writer);
        self.current_size = size;

        self.prune();
        Ok(())
    }

    /// Move the full active file aside and reopen a fresh one
    fn roll_by_size(&mut self) -> Result<()> {
        self.close_writer()?;

        let backup = self.next_backup_path();
        if self.current_path.exists() {
            fs::rename(&self.current_path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.current_path.display().to_string(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;

            if self.policy.compress {
                self.compress_file(&backup)?;
            }
        }

        let (writer, size) = Self::open(&self.current_path)?;
        self.writer = Some(writer);
        self.current_size = size;

        self.prune();
        Ok(())
    }

    fn next_backup_path(&self) -> PathBuf {
        (1..)
            .map(|n| Self::with_suffix(&self.current_path, &format!(".{}", n)))
            .find(|p| !p.exists() && !Self::with_suffix(p, ".gz").exists())
            .unwrap_or_else(|| Self::with_suffix(&self.current_path, ".overflow"))
    }

    /// Gzip `path` to `<path>.gz`, removing the original only on success
    fn compress_file(&self, path: &Path) -> Result<()> {
        let gz_path = Self::with_suffix(path, ".gz");
        let temp_gz_path = Self::with_suffix(path, ".gz.tmp");

        let result = (|| -> std::io::Result<()> {
            let mut reader = BufReader::with_capacity(64 * 1024, File::open(path)?);
            let output = BufWriter::with_capacity(64 * 1024, File::create(&temp_gz_path)?);
            let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
            std::io::copy(&mut reader, &mut encoder)?;
            encoder.finish()?.flush()?;
            fs::rename(&temp_gz_path, &gz_path)
        })();

        if let Err(e) = result {
            let _ = fs::remove_file(&temp_gz_path);
            return Err(LoggerError::io_operation(
                "compress log file",
                format!("Failed to compress '{}'", path.display()),
                e,
            ));
        }

        if let Err(e) = fs::remove_file(path) {
            eprintln!(
                "[ctxlog WARN] Compression succeeded but failed to remove original file {}: {}",
                path.display(),
                e
            );
        }

        Ok(())
    }

    /// Whether `name` is a file this sink produced: `<stem>-<date>.log[...]`
    fn is_own_file(&self, name: &str) -> bool {
        let Some(rest) = name.strip_prefix(&self.stem).and_then(|r| r.strip_prefix('-')) else {
            return false;
        };
        if rest.len() < 10 || !rest.is_char_boundary(10) {
            return false;
        }
        let (date, tail) = rest.split_at(10);
        NaiveDate::parse_from_str(date, DATE_FORMAT).is_ok() && tail.starts_with(".log")
    }

    /// Delete rotated files beyond the retention policy.
    ///
    /// The active file is never touched. Failures are warnings only.
    fn prune(&self) {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                eprintln!("[ctxlog WARN] Cannot list {} for pruning: {}", self.dir.display(), e);
                return;
            }
        };

        let mut rotated: Vec<(PathBuf, SystemTime)> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().is_some_and(|n| self.is_own_file(n)))
            .map(|e| e.path())
            .filter(|p| *p != self.current_path)
            .filter_map(|p| {
                let modified = fs::metadata(&p).and_then(|m| m.modified()).ok()?;
                Some((p, modified))
            })
            .collect();

        let doomed: Vec<PathBuf> = match self.policy.retention {
            Retention::Count(keep) => {
                rotated.sort_by(|a, b| b.1.cmp(&a.1));
                rotated.into_iter().skip(keep).map(|(p, _)| p).collect()
            }
            Retention::Days(days) => {
                let max_age = Duration::from_secs(days.saturating_mul(24 * 60 * 60));
                let now = SystemTime::now();
                rotated
                    .into_iter()
                    .filter(|(_, modified)| {
                        now.duration_since(*modified).unwrap_or(Duration::ZERO) > max_age
                    })
                    .map(|(p, _)| p)
                    .collect()
            }
        };

        for path in doomed {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("[ctxlog WARN] Failed to remove old log {}: {}", path.display(), e);
            }
        }
    }

    fn write_on(&mut self, entry: &LogEntry, today: NaiveDate) -> Result<()> {
        let rotation = if today != self.current_date {
            Some(self.roll_to_date(today))
        } else if self.policy.max_bytes > 0 && self.current_size >= self.policy.max_bytes {
            Some(self.roll_by_size())
        } else {
            None
        };

        if let Some(Err(e)) = rotation {
            eprintln!("[ctxlog WARN] Log rotation failed: {}. Continuing with current file.", e);

            if self.writer.is_none() {
                let (writer, size) = Self::open(&self.current_path).map_err(|_| e)?;
                self.writer = Some(writer);
                self.current_size = size;
            }
            // allow the file to overrun rather than retrying on every write
            self.current_size = 0;
        }

        let mut line = entry.to_json();
        line.push('\n');

        match self.writer {
            Some(ref mut writer) => {
                writer.write_all(line.as_bytes()).map_err(|e| {
                    LoggerError::file_sink(
                        self.current_path.display().to_string(),
                        format!("Failed to write log entry: {}", e),
                    )
                })?;
                self.current_size += line.len() as u64;
                Ok(())
            }
            None => Err(LoggerError::file_sink(
                self.current_path.display().to_string(),
                "Writer not initialized",
            )),
        }
    }
}

impl Sink for RotatingFileSink {
    fn write(&mut self, entry: &LogEntry) -> Result<()> {
        self.write_on(entry, Local::now().date_naive())
    }

    fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_sink(
                    self.current_path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "rotating_file"
    }
}

impl Drop for RotatingFileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, LogLevel};
    use std::io::Read;
    use tempfile::tempdir;

    fn entry(i: usize) -> LogEntry {
        LogEntry::new(LogLevel::Info, &format!("Test message number {}", i), "svc")
            .with_context(LogContext::new().with_field("i", i))
    }

    fn files_in(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_creates_directory_and_dated_file() {
        let dir = tempdir().unwrap();
        let log_dir = dir.path().join("nested").join("logs");

        let sink = RotatingFileSink::new(&log_dir, "api", RotationPolicy::default()).unwrap();

        let expected = format!("api-{}.log", Local::now().date_naive().format(DATE_FORMAT));
        assert!(log_dir.is_dir());
        assert_eq!(sink.current_path(), log_dir.join(expected));
        assert_eq!(sink.current_size(), 0);
    }

    #[test]
    fn test_writes_json_lines() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(dir.path(), "svc", RotationPolicy::default()).unwrap();

        for i in 0..3 {
            sink.write(&entry(i)).unwrap();
        }
        sink.flush().unwrap();

        let content = fs::read_to_string(sink.current_path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for (i, line) in lines.iter().enumerate() {
            let parsed: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(parsed["i"], i);
            assert_eq!(parsed["level"], "info");
            assert_eq!(parsed["service"], "svc");
        }
    }

    #[test]
    fn test_size_rotation_creates_backups() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(100)
            .with_retention(Retention::Count(100));
        let mut sink = RotatingFileSink::new(dir.path(), "svc", policy).unwrap();

        for i in 0..20 {
            sink.write(&entry(i)).unwrap();
        }
        sink.flush().unwrap();

        let backup = RotatingFileSink::with_suffix(sink.current_path(), ".1");
        assert!(backup.exists());
        assert!(sink.current_size() < 400);
    }

    #[test]
    fn test_count_retention_prunes_rotated_files() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(50)
            .with_retention(Retention::Count(2));
        let mut sink = RotatingFileSink::new(dir.path(), "multi", policy).unwrap();

        for i in 0..100 {
            sink.write(&entry(i)).unwrap();
        }
        sink.flush().unwrap();

        // active file + 2 rotated
        assert_eq!(files_in(dir.path()).len(), 3);
    }

    #[test]
    fn test_day_retention_removes_old_files() {
        let dir = tempdir().unwrap();
        let stale = dir.path().join("svc-2020-01-01.log");
        let fresh = dir.path().join("svc-2020-01-02.log");
        let foreign = dir.path().join("svc-gateway-2020-01-01.log");
        for path in [&stale, &fresh, &foreign] {
            fs::write(path, "{}\n").unwrap();
        }
        let month_ago = SystemTime::now() - Duration::from_secs(30 * 24 * 60 * 60);
        for path in [&stale, &foreign] {
            File::options().write(true).open(path).unwrap().set_modified(month_ago).unwrap();
        }

        let policy = RotationPolicy::new()
            .with_max_size(1)
            .with_retention(Retention::Days(14));
        let mut sink = RotatingFileSink::new(dir.path(), "svc", policy).unwrap();
        sink.write(&entry(0)).unwrap();
        sink.write(&entry(1)).unwrap();

        assert!(!stale.exists());
        assert!(fresh.exists());
        assert!(foreign.exists(), "files of another stem are left alone");
    }

    #[test]
    fn test_date_change_starts_new_file() {
        let dir = tempdir().unwrap();
        let mut sink = RotatingFileSink::new(dir.path(), "svc", RotationPolicy::default()).unwrap();
        let first = sink.current_path().to_path_buf();

        sink.write(&entry(0)).unwrap();
        let tomorrow = sink.current_date.succ_opt().unwrap();
        sink.write_on(&entry(1), tomorrow).unwrap();
        sink.flush().unwrap();

        assert_ne!(sink.current_path(), first);
        assert!(first.exists());
        assert_eq!(fs::read_to_string(sink.current_path()).unwrap().lines().count(), 1);
    }

    #[test]
    fn test_compression_on_rotation() {
        let dir = tempdir().unwrap();
        let policy = RotationPolicy::new()
            .with_max_size(10)
            .with_retention(Retention::Count(10))
            .with_compression(true);
        let mut sink = RotatingFileSink::new(dir.path(), "gz", policy).unwrap();

        sink.write(&entry(0)).unwrap();
        sink.write(&entry(1)).unwrap();
        sink.flush().unwrap();

        let backup = RotatingFileSink::with_suffix(sink.current_path(), ".1");
        let gz = RotatingFileSink::with_suffix(&backup, ".gz");
        assert!(!backup.exists());
        assert!(gz.exists());

        let mut decoded = String::new();
        flate2::read::GzDecoder::new(File::open(gz).unwrap())
            .read_to_string(&mut decoded)
            .unwrap();
        assert!(decoded.contains("Test message number 0"));
    }

    #[test]
    fn test_is_own_file() {
        let dir = tempdir().unwrap();
        let sink = RotatingFileSink::new(dir.path(), "api", RotationPolicy::default()).unwrap();

        assert!(sink.is_own_file("api-2024-01-31.log"));
        assert!(sink.is_own_file("api-2024-01-31.log.3"));
        assert!(sink.is_own_file("api-2024-01-31.log.3.gz"));
        assert!(!sink.is_own_file("api-gateway-2024-01-31.log"));
        assert!(!sink.is_own_file("api-2024-01-31.txt"));
        assert!(!sink.is_own_file("other-2024-01-31.log"));
    }

    #[test]
    fn test_from_config() {
        let dir = tempdir().unwrap();
        let mut config = LoggerConfig::default();
        config.service = "orders".to_string();
        config.log_dir = dir.path().join("logs");
        config.max_size = 4096;

        let sink = RotatingFileSink::from_config(&config).unwrap();

        assert_eq!(sink.policy().max_bytes, 4096);
        assert!(sink
            .current_path()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("orders-"));
    }
}
