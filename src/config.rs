use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::format::HeaderFlags;
use crate::level::Level;
use crate::queue::OverflowPolicy;
use crate::rotation::RotationBoundary;

/// Configuration for a leveled logging facility
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    /// Directory holding the level files; must already exist
    pub directory: PathBuf,
    /// File name prefix, e.g. `meta` for `meta_info.log`
    pub module: String,
    /// Minimum severity that is enqueued
    #[serde(default = "default_threshold")]
    pub threshold: Level,
    /// File name suffix per level
    #[serde(default)]
    pub suffixes: LevelSuffixes,
    /// Capacity of the message queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Behavior when the queue is full
    #[serde(default)]
    pub overflow: OverflowPolicy,
    /// Seconds between rotation checks
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// How a new day is detected
    #[serde(default)]
    pub boundary: RotationBoundary,
    /// Header written in front of every line
    #[serde(default)]
    pub header: HeaderFlags,
}

impl FacilityConfig {
    /// Create a new FacilityConfig with defaults
    pub fn new<P: Into<PathBuf>>(directory: P, module: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            module: module.into(),
            threshold: default_threshold(),
            suffixes: LevelSuffixes::default(),
            queue_capacity: default_queue_capacity(),
            overflow: OverflowPolicy::default(),
            poll_interval_secs: default_poll_interval_secs(),
            boundary: RotationBoundary::default(),
            header: HeaderFlags::default(),
        }
    }

    /// Set the severity threshold
    pub fn with_threshold(mut self, threshold: Level) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the file suffixes
    pub fn with_suffixes(mut self, suffixes: LevelSuffixes) -> Self {
        self.suffixes = suffixes;
        self
    }

    /// Set the queue capacity
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the overflow policy
    pub fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }

    /// Set the rotation poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_secs = interval.as_secs().max(1);
        self
    }

    /// Set the rotation boundary test
    pub fn with_boundary(mut self, boundary: RotationBoundary) -> Self {
        self.boundary = boundary;
        self
    }

    /// Set the header flags
    pub fn with_header(mut self, header: HeaderFlags) -> Self {
        self.header = header;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Path of the file that receives `level`'s records.
    pub fn path_for(&self, level: Level) -> PathBuf {
        let name = format!("{}{}", self.module, self.suffixes.get(level));
        self.directory.join(name)
    }

    /// Check everything that can be checked without opening files.
    pub fn validate(&self) -> crate::Result<()> {
        check_directory(&self.directory)?;
        if self.threshold.severity().is_none() {
            return Err(crate::Error::Config(format!(
                "threshold must be a severity level, got {}",
                self.threshold
            )));
        }
        if self.queue_capacity == 0 {
            return Err(crate::Error::Config(
                "queue_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn check_directory(dir: &Path) -> crate::Result<()> {
    let metadata = std::fs::metadata(dir).map_err(|e| {
        crate::Error::Config(format!("log directory {}: {}", dir.display(), e))
    })?;
    if !metadata.is_dir() {
        return Err(crate::Error::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    Ok(())
}

fn default_threshold() -> Level {
    Level::Info
}

fn default_queue_capacity() -> usize {
    102_400
}

fn default_poll_interval_secs() -> u64 {
    600
}

/// File name suffix appended to the module name, per level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelSuffixes {
    pub debug: String,
    pub info: String,
    pub warn: String,
    pub error: String,
    pub read: String,
    pub update: String,
}

impl LevelSuffixes {
    /// Suffix for `level`; Fatal shares the error file.
    pub fn get(&self, level: Level) -> &str {
        match level.file_level() {
            Level::Debug => &self.debug,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Read => &self.read,
            Level::Update => &self.update,
            Level::Error | Level::Fatal => &self.error,
        }
    }
}

impl Default for LevelSuffixes {
    fn default() -> Self {
        Self {
            debug: "_debug.log".to_string(),
            info: "_info.log".to_string(),
            warn: "_warn.log".to_string(),
            error: "_err.log".to_string(),
            read: "_read.log".to_string(),
            update: "_write.log".to_string(),
        }
    }
}

/// Configuration for the crate's own diagnostics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsConfig {
    /// Print diagnostics to stderr
    #[serde(default)]
    pub console: bool,
    /// Diagnostics level (e.g., "info", "debug")
    #[serde(default = "default_diagnostics_level")]
    pub level: String,
    /// Output format ("text" or "json")
    #[serde(default = "default_format")]
    pub format: String,
}

impl DiagnosticsConfig {
    /// Create a new DiagnosticsConfig with defaults
    pub fn new() -> Self {
        Self {
            console: false,
            level: default_diagnostics_level(),
            format: default_format(),
        }
    }

    /// Enable console output
    pub fn with_console(mut self, console: bool) -> Self {
        self.console = console;
        self
    }

    /// Set diagnostics level
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set output format
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_diagnostics_level() -> String {
    "warn".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Precision;

    #[test]
    fn test_facility_config_new() {
        let config = FacilityConfig::new("/var/log/app", "meta");
        assert_eq!(config.threshold, Level::Info);
        assert_eq!(config.queue_capacity, 102_400);
        assert_eq!(config.overflow, OverflowPolicy::Block);
        assert_eq!(config.poll_interval(), Duration::from_secs(600));
        assert_eq!(config.boundary, RotationBoundary::CalendarDay);
        assert_eq!(config.header, HeaderFlags::LEVELED);
    }

    #[test]
    fn test_path_for_levels() {
        let config = FacilityConfig::new("/var/log/app", "meta");
        assert_eq!(
            config.path_for(Level::Info),
            PathBuf::from("/var/log/app/meta_info.log")
        );
        assert_eq!(
            config.path_for(Level::Update),
            PathBuf::from("/var/log/app/meta_write.log")
        );
        assert_eq!(config.path_for(Level::Fatal), config.path_for(Level::Error));
    }

    #[test]
    fn test_builder_methods() {
        let config = FacilityConfig::new("logs", "svc")
            .with_threshold(Level::Warn)
            .with_queue_capacity(16)
            .with_overflow(OverflowPolicy::DropOldest)
            .with_poll_interval(Duration::from_millis(10))
            .with_boundary(RotationBoundary::DayOfMonth);
        assert_eq!(config.threshold, Level::Warn);
        assert_eq!(config.queue_capacity, 16);
        assert_eq!(config.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.poll_interval_secs, 1);
        assert_eq!(config.boundary, RotationBoundary::DayOfMonth);
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = FacilityConfig::new(dir.path().join("absent"), "svc");
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_file_as_directory() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = FacilityConfig::new(file.path(), "svc");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_validate_rejects_side_channel_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let config = FacilityConfig::new(dir.path(), "svc").with_threshold(Level::Read);
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let dir = tempfile::tempdir().unwrap();
        let config = FacilityConfig::new(dir.path(), "svc").with_queue_capacity(0);
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn test_yaml_config() {
        let yaml = r#"
directory: /var/log/meta
module: meta
threshold: warn
overflow: drop_oldest
suffixes:
  error: _error.log
header:
  precision: micros
"#;
        let config: FacilityConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.module, "meta");
        assert_eq!(config.threshold, Level::Warn);
        assert_eq!(config.overflow, OverflowPolicy::DropOldest);
        assert_eq!(config.suffixes.error, "_error.log");
        assert_eq!(config.suffixes.info, "_info.log");
        assert_eq!(config.header.precision, Precision::Micros);
        assert!(config.header.date);
        assert_eq!(config.queue_capacity, 102_400);
    }

    #[test]
    fn test_toml_config() {
        let toml_str = r#"
directory = "logs"
module = "data"
threshold = "debug"
queue_capacity = 512
poll_interval_secs = 60
boundary = "day_of_month"
"#;
        let config: FacilityConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.threshold, Level::Debug);
        assert_eq!(config.queue_capacity, 512);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.boundary, RotationBoundary::DayOfMonth);
    }

    #[test]
    fn test_unknown_threshold_is_rejected() {
        let yaml = "directory: logs\nmodule: m\nthreshold: chatty\n";
        let err = serde_yaml::from_str::<FacilityConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("chatty"));
    }

    #[test]
    fn test_diagnostics_config_defaults() {
        let config = DiagnosticsConfig::default();
        assert!(!config.console);
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, "text");

        let config = DiagnosticsConfig::new()
            .with_console(true)
            .with_level("debug")
            .with_format("json");
        assert!(config.console);
        assert_eq!(config.level, "debug");
        assert_eq!(config.format, "json");
    }
}
