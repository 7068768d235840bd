use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::Error;

/// Severity or category of a log record.
///
/// `Debug` through `Fatal` are ordered by severity. `Read` and `Update` are
/// side channels for access auditing: they carry no severity and are never
/// filtered by the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    Read,
    Update,
}

impl Level {
    /// Levels that own a file and go through the queue, in file-opening order.
    pub const QUEUED: [Level; 6] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Read,
        Level::Update,
    ];

    /// Position in the severity order, `None` for side-channel categories.
    pub fn severity(self) -> Option<u8> {
        match self {
            Level::Debug => Some(0),
            Level::Info => Some(1),
            Level::Warn => Some(2),
            Level::Error => Some(3),
            Level::Fatal => Some(4),
            Level::Read | Level::Update => None,
        }
    }

    /// Whether a record at this level is admitted under `threshold`.
    pub fn passes(self, threshold: Level) -> bool {
        match (self.severity(), threshold.severity()) {
            (Some(level), Some(min)) => level >= min,
            _ => true,
        }
    }

    /// Fixed-width tag written in front of every message.
    pub fn tag(self) -> &'static str {
        match self {
            Level::Debug => "[DEBUG]",
            Level::Info => "[INFO.]",
            Level::Warn => "[WARN.]",
            Level::Error => "[ERROR]",
            Level::Fatal => "[FATAL]",
            Level::Read => "[READ.]",
            Level::Update => "[UPDAT]",
        }
    }

    /// Level that owns the file this level's records land in.
    ///
    /// Fatal records are written synchronously to the error file.
    pub fn file_level(self) -> Level {
        match self {
            Level::Fatal => Level::Error,
            other => other,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
            Level::Read => "read",
            Level::Update => "update",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" | "err" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            "read" => Ok(Level::Read),
            "update" | "write" => Ok(Level::Update),
            other => Err(Error::UnrecognizedCategory(other.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Level::Warn.passes(Level::Info));
        assert!(Level::Info.passes(Level::Info));
        assert!(!Level::Debug.passes(Level::Info));
        assert!(Level::Fatal.passes(Level::Error));
        assert!(!Level::Error.passes(Level::Fatal));
    }

    #[test]
    fn test_side_channels_always_pass() {
        for threshold in [Level::Debug, Level::Error, Level::Fatal] {
            assert!(Level::Read.passes(threshold));
            assert!(Level::Update.passes(threshold));
        }
    }

    #[test]
    fn test_tags_are_fixed_width() {
        for level in Level::QUEUED.iter().chain([Level::Fatal].iter()) {
            let tag = level.tag();
            assert_eq!(tag.len(), 7, "{tag}");
            assert!(tag.starts_with('[') && tag.ends_with(']'));
        }
    }

    #[test]
    fn test_fatal_shares_error_file() {
        assert_eq!(Level::Fatal.file_level(), Level::Error);
        assert_eq!(Level::Read.file_level(), Level::Read);
    }

    #[test]
    fn test_parse_levels() {
        assert_eq!("INFO".parse::<Level>().unwrap(), Level::Info);
        assert_eq!("warning".parse::<Level>().unwrap(), Level::Warn);
        assert_eq!(" err ".parse::<Level>().unwrap(), Level::Error);
        assert_eq!("write".parse::<Level>().unwrap(), Level::Update);

        let err = "verbose".parse::<Level>().unwrap_err();
        assert!(matches!(err, Error::UnrecognizedCategory(ref name) if name == "verbose"));
    }

    #[test]
    fn test_deserialize_level() {
        let level: Level = serde_yaml::from_str("warn").unwrap();
        assert_eq!(level, Level::Warn);
        assert!(serde_yaml::from_str::<Level>("loud").is_err());
    }
}
