//! Line formatting.
//!
//! A formatted line is `prefix`, then the header segments enabled by
//! [`HeaderFlags`] in fixed order (date, time with optional fraction,
//! caller location), then the text and a single trailing newline:
//!
//! ```text
//! 2026-01-09 14:03:07.042 main.rs:12: connection accepted
//! ```

use std::fmt::Write as _;
use std::panic::Location;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Sub-second digits appended to the time segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Precision {
    #[default]
    Seconds,
    Millis,
    Micros,
}

/// How the caller location is rendered, if at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileInfo {
    #[default]
    None,
    /// Final path segment only, e.g. `main.rs:12`.
    Short,
    /// Path as recorded by the compiler, e.g. `src/bin/main.rs:12`.
    Long,
}

/// Header segments written in front of each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderFlags {
    /// `YYYY-MM-DD`
    pub date: bool,
    /// `HH:MM:SS`
    pub time: bool,
    /// Fraction appended to the time segment.
    pub precision: Precision,
    /// Caller location segment.
    pub file: FileInfo,
}

impl HeaderFlags {
    /// No header at all.
    pub const NONE: HeaderFlags = HeaderFlags {
        date: false,
        time: false,
        precision: Precision::Seconds,
        file: FileInfo::None,
    };

    /// Date and time, the default for the standalone writer.
    pub const STD: HeaderFlags = HeaderFlags {
        date: true,
        time: true,
        precision: Precision::Seconds,
        file: FileInfo::None,
    };

    /// Date, time and milliseconds, used by the per-level files.
    pub const LEVELED: HeaderFlags = HeaderFlags {
        date: true,
        time: true,
        precision: Precision::Millis,
        file: FileInfo::None,
    };

    pub fn with_file(mut self, file: FileInfo) -> Self {
        self.file = file;
        self
    }

    pub fn with_precision(mut self, precision: Precision) -> Self {
        self.precision = precision;
        self
    }
}

impl Default for HeaderFlags {
    fn default() -> Self {
        Self::LEVELED
    }
}

/// Source location of a logging call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    /// Location of the nearest caller not marked `#[track_caller]`.
    #[track_caller]
    pub fn here() -> Self {
        Self::from(Location::caller())
    }

    pub fn short_file(&self) -> &'static str {
        short_file(self.file)
    }
}

impl From<&'static Location<'static>> for Caller {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }
}

/// Final path segment of `path`, or the whole string when it has no `/`.
pub fn short_file(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Append one formatted line to `buf`.
pub fn format_line(
    buf: &mut String,
    prefix: &str,
    flags: HeaderFlags,
    now: OffsetDateTime,
    caller: Option<Caller>,
    text: &str,
) {
    buf.push_str(prefix);

    // Writing into a String cannot fail.
    if flags.date {
        let _ = write!(
            buf,
            "{:04}-{:02}-{:02} ",
            now.year(),
            u8::from(now.month()),
            now.day()
        );
    }
    if flags.time {
        let _ = write!(
            buf,
            "{:02}:{:02}:{:02}",
            now.hour(),
            now.minute(),
            now.second()
        );
        match flags.precision {
            Precision::Seconds => {}
            Precision::Millis => {
                let _ = write!(buf, ".{:03}", now.millisecond());
            }
            Precision::Micros => {
                let _ = write!(buf, ".{:06}", now.microsecond());
            }
        }
        buf.push(' ');
    }

    if flags.file != FileInfo::None {
        let (file, line) = match caller {
            Some(caller) if flags.file == FileInfo::Short => (caller.short_file(), caller.line),
            Some(caller) => (caller.file, caller.line),
            None => ("???", 0),
        };
        let _ = write!(buf, "{}:{}: ", file, line);
    }

    buf.push_str(text);
    if !text.ends_with('\n') {
        buf.push('\n');
    }
}
