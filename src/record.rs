use std::fmt;

use time::OffsetDateTime;

use crate::format::Caller;
use crate::level::Level;

/// One log message on its way from a caller to a level file.
///
/// The level travels as a field; routing never looks inside `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: OffsetDateTime,
    pub level: Level,
    pub caller: Caller,
    /// Rendered body: `<TAG> <file>:<line>: <message>`.
    pub text: String,
}

impl LogRecord {
    pub fn new(
        timestamp: OffsetDateTime,
        level: Level,
        caller: Caller,
        args: fmt::Arguments<'_>,
    ) -> Self {
        let text = format!(
            "{} {}:{}: {}",
            level.tag(),
            caller.short_file(),
            caller.line,
            args
        );
        Self {
            timestamp,
            level,
            caller,
            text,
        }
    }
}
