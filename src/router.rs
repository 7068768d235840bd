use std::io;
use std::path::{Path, PathBuf};

use crate::config::FacilityConfig;
use crate::level::Level;
use crate::record::LogRecord;
use crate::writer::{SerialWriter, open_append};
use crate::{Error, Result};

/// The writer for one level's file.
#[derive(Debug)]
pub struct LevelWriter {
    level: Level,
    path: PathBuf,
    writer: SerialWriter,
}

impl LevelWriter {
    pub fn level(&self) -> Level {
        self.level
    }

    /// Canonical (unrotated) file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn writer(&self) -> &SerialWriter {
        &self.writer
    }

    /// Write `record` with this writer's header.
    pub fn write_record(&self, record: &LogRecord) -> io::Result<()> {
        self.writer.output(record.timestamp, Some(record.caller), &record.text)
    }
}

/// One [`LevelWriter`] per queued level.
#[derive(Debug)]
pub struct LevelRouter {
    debug: LevelWriter,
    info: LevelWriter,
    warn: LevelWriter,
    error: LevelWriter,
    read: LevelWriter,
    update: LevelWriter,
}

impl LevelRouter {
    /// Open every level file named by `config`.
    ///
    /// Fails without keeping any file if a single one cannot be opened.
    pub fn open(config: &FacilityConfig) -> Result<Self> {
        Ok(Self {
            debug: open_level(config, Level::Debug)?,
            info: open_level(config, Level::Info)?,
            warn: open_level(config, Level::Warn)?,
            error: open_level(config, Level::Error)?,
            read: open_level(config, Level::Read)?,
            update: open_level(config, Level::Update)?,
        })
    }

    /// Writer owning `level`'s file. Fatal resolves to the error writer.
    pub fn writer(&self, level: Level) -> &LevelWriter {
        match level {
            Level::Debug => &self.debug,
            Level::Info => &self.info,
            Level::Warn => &self.warn,
            Level::Error | Level::Fatal => &self.error,
            Level::Read => &self.read,
            Level::Update => &self.update,
        }
    }

    /// Hand `record` to the writer for its level.
    ///
    /// Returns `Ok(false)` for Fatal records, which are written
    /// synchronously and never travel through the queue.
    pub fn route(&self, record: &LogRecord) -> io::Result<bool> {
        if record.level == Level::Fatal {
            return Ok(false);
        }
        self.writer(record.level).write_record(record)?;
        Ok(true)
    }

    /// Writers in [`Level::QUEUED`] order.
    pub fn iter(&self) -> impl Iterator<Item = &LevelWriter> {
        [
            &self.debug,
            &self.info,
            &self.warn,
            &self.error,
            &self.read,
            &self.update,
        ]
        .into_iter()
    }

    /// Flush every level file, reporting the first failure.
    pub fn flush_all(&self) -> io::Result<()> {
        let mut first_err = None;
        for writer in self.iter() {
            if let Err(e) = writer.writer.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

fn open_level(config: &FacilityConfig, level: Level) -> Result<LevelWriter> {
    let path = config.path_for(level);
    let file = open_append(&path).map_err(|source| Error::OpenLog {
        path: path.clone(),
        source,
    })?;
    tracing::debug!(%level, path = %path.display(), "opened level file");
    Ok(LevelWriter {
        level,
        path,
        writer: SerialWriter::new(Box::new(file), "", config.header),
    })
}
