use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::level::Level;
use crate::router::{LevelRouter, LevelWriter};
use crate::writer::open_append;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;

    fn today(&self) -> Date {
        self.now().date()
    }
}

/// Wall clock in the local offset, captured once at construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    offset: UtcOffset,
}

impl SystemClock {
    /// Use the local offset, falling back to UTC when it cannot be determined.
    pub fn new() -> Self {
        Self {
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn with_offset(offset: UtcOffset) -> Self {
        Self { offset }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }
}

/// How the monitor decides a new day has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationBoundary {
    /// Rotate once the date is later than the last rotation (or start) date.
    #[default]
    CalendarDay,
    /// Rotate unless the day of month equals the start day of month.
    ///
    /// Misses the rotation when the facility is still running on the same
    /// day of a later month.
    DayOfMonth,
}

/// Result of one rotation check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    /// Nothing to do in this period.
    Waiting,
    /// Level files were rotated.
    Rotated { rotated: usize, failed: usize },
}

/// Renames every level file to a dated name once per day.
pub struct RotationMonitor {
    router: Arc<LevelRouter>,
    clock: Arc<dyn Clock>,
    boundary: RotationBoundary,
    poll_interval: Duration,
    start: Date,
    last_rotation: Date,
}

impl RotationMonitor {
    /// Create a monitor whose current period starts today.
    pub fn new(
        router: Arc<LevelRouter>,
        clock: Arc<dyn Clock>,
        boundary: RotationBoundary,
        poll_interval: Duration,
    ) -> Self {
        let start = clock.today();
        Self::starting_on(router, clock, boundary, poll_interval, start)
    }

    /// Create a monitor as if the facility had started on `start`.
    pub fn starting_on(
        router: Arc<LevelRouter>,
        clock: Arc<dyn Clock>,
        boundary: RotationBoundary,
        poll_interval: Duration,
        start: Date,
    ) -> Self {
        Self {
            router,
            clock,
            boundary,
            poll_interval,
            start,
            last_rotation: start,
        }
    }

    /// Run on a dedicated thread until `shutdown` fires or disconnects.
    pub fn spawn(self, shutdown: Receiver<()>) -> std::io::Result<JoinHandle<()>> {
        std::thread::Builder::new()
            .name("levelsplit-rotate".to_string())
            .spawn(move || self.run(shutdown))
    }

    pub fn run(mut self, shutdown: Receiver<()>) {
        loop {
            if let RotationOutcome::Rotated { rotated, failed } = self.run_cycle() {
                tracing::info!(rotated, failed, "rotated level files");
            }
            match shutdown.recv_timeout(self.poll_interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                _ => break,
            }
        }
        tracing::debug!("rotation monitor stopped");
    }

    /// Check the day boundary once and rotate if it was crossed.
    pub fn run_cycle(&mut self) -> RotationOutcome {
        let today = self.clock.today();
        let Some(yesterday) = today.previous_day() else {
            return RotationOutcome::Waiting;
        };
        let suffix = date_suffix(yesterday);

        let error_path = self.router.writer(Level::Error).path();
        if archive_path(error_path, &suffix).exists() {
            self.last_rotation = self.last_rotation.max(today);
            return RotationOutcome::Waiting;
        }
        if self.same_period(today) {
            return RotationOutcome::Waiting;
        }

        let mut rotated = 0;
        let mut failed = 0;
        for writer in self.router.iter() {
            match rotate(writer, &suffix) {
                Ok(()) => rotated += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!(
                        level = %writer.level(),
                        path = %writer.path().display(),
                        error = %e,
                        "failed to rotate log file"
                    );
                }
            }
        }
        self.last_rotation = today;
        RotationOutcome::Rotated { rotated, failed }
    }

    fn same_period(&self, today: Date) -> bool {
        match self.boundary {
            RotationBoundary::CalendarDay => today <= self.last_rotation,
            RotationBoundary::DayOfMonth => today.day() == self.start.day(),
        }
    }
}

/// Move the active file aside and point the writer at a fresh one.
fn rotate(writer: &LevelWriter, suffix: &str) -> std::io::Result<()> {
    let path = writer.path();
    std::fs::rename(path, archive_path(path, suffix))?;
    let file = open_append(path)?;
    writer.writer().replace_sink(Box::new(file));
    Ok(())
}

/// `YYYY-MM-DD`, the suffix of archived files.
pub fn date_suffix(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// `<path>.<suffix>`
pub fn archive_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
