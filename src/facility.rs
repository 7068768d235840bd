//! The leveled logging facility.
//!
//! A [`Facility`] owns six level files in one directory, a bounded queue, a
//! dispatcher thread draining that queue, and a rotation thread that moves
//! the files aside once a day.
//!
//! ```rust,no_run
//! use levelsplit::{Facility, FacilityConfig, Level};
//!
//! let facility = Facility::initialize(
//!     FacilityConfig::new("/var/log/meta", "meta").with_threshold(Level::Info),
//! )?;
//! levelsplit::log_info!(facility, "volume {} mounted", 7);
//! levelsplit::log_read!(facility, "inode {} read", 42);
//! facility.shutdown();
//! # Ok::<(), levelsplit::Error>(())
//! ```

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use crossbeam_channel::Sender;

use crate::Result;
use crate::config::FacilityConfig;
use crate::dispatch::Dispatcher;
use crate::format::Caller;
use crate::level::Level;
use crate::queue::{self, Admission, QueueProducer};
use crate::record::LogRecord;
use crate::rotation::{Clock, RotationMonitor, SystemClock};
use crate::router::{LevelRouter, LevelWriter};

/// Per-directory, multi-level asynchronous logger.
pub struct Facility {
    config: FacilityConfig,
    router: Arc<LevelRouter>,
    producer: QueueProducer,
    clock: Arc<dyn Clock>,
    closed: AtomicBool,
    // Dropping the sender wakes both background threads.
    shutdown: Mutex<Option<Sender<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Facility {
    /// Open `<directory>/<module><suffix>` for every level and start the
    /// background threads.
    pub fn new(
        directory: impl Into<PathBuf>,
        module: impl Into<String>,
        threshold: Level,
    ) -> Result<Self> {
        Self::initialize(FacilityConfig::new(directory, module).with_threshold(threshold))
    }

    /// Start a facility from a full configuration.
    pub fn initialize(config: FacilityConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    /// Start a facility that reads time from `clock`.
    pub fn with_clock(config: FacilityConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let router = Arc::new(LevelRouter::open(&config)?);

        let (producer, queue) = queue::bounded(config.queue_capacity, config.overflow);
        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(0);

        // If a spawn fails, dropping shutdown_tx on return stops the other thread.
        let dispatcher =
            Dispatcher::new(queue, shutdown_rx.clone(), Arc::clone(&router)).spawn()?;
        let monitor = RotationMonitor::new(
            Arc::clone(&router),
            Arc::clone(&clock),
            config.boundary,
            config.poll_interval(),
        )
        .spawn(shutdown_rx)?;

        tracing::info!(
            directory = %config.directory.display(),
            module = %config.module,
            threshold = %config.threshold,
            "logging facility started"
        );

        Ok(Self {
            config,
            router,
            producer,
            clock,
            closed: AtomicBool::new(false),
            shutdown: Mutex::new(Some(shutdown_tx)),
            workers: Mutex::new(vec![dispatcher, monitor]),
        })
    }

    pub fn config(&self) -> &FacilityConfig {
        &self.config
    }

    /// Whether a record at `level` would be written.
    pub fn enabled(&self, level: Level) -> bool {
        level.passes(self.config.threshold)
    }

    /// Writer for `level`'s file, for adjusting its output, prefix or flags.
    pub fn writer(&self, level: Level) -> &LevelWriter {
        self.router.writer(level)
    }

    /// Records evicted by [`OverflowPolicy::DropOldest`](crate::OverflowPolicy::DropOldest).
    pub fn dropped(&self) -> u64 {
        self.producer.dropped()
    }

    /// Records waiting for the dispatcher.
    pub fn pending(&self) -> usize {
        self.producer.len()
    }

    #[track_caller]
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, Caller::here(), args);
    }

    #[track_caller]
    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, Caller::here(), args);
    }

    #[track_caller]
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, Caller::here(), args);
    }

    #[track_caller]
    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, Caller::here(), args);
    }

    /// Record a read access. Never filtered by the threshold.
    #[track_caller]
    pub fn read(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Read, Caller::here(), args);
    }

    /// Record a write access. Never filtered by the threshold.
    #[track_caller]
    pub fn update(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Update, Caller::here(), args);
    }

    /// Write to the error file synchronously, then exit the process with
    /// status 1.
    #[track_caller]
    pub fn fatal(&self, args: fmt::Arguments<'_>) -> ! {
        let record = LogRecord::new(self.clock.now(), Level::Fatal, Caller::here(), args);
        // Exiting regardless; there is nobody left to report to.
        let _ = self.write_now(&record);
        std::process::exit(1)
    }

    /// Log at `level` on behalf of `caller`.
    ///
    /// Fatal records are written synchronously and do not exit; use
    /// [`fatal`](Self::fatal) for that.
    pub fn log(&self, level: Level, caller: Caller, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let record = LogRecord::new(self.clock.now(), level, caller, args);
        if level == Level::Fatal {
            if let Err(e) = self.write_now(&record) {
                tracing::warn!(error = %e, "failed to write fatal record");
            }
            return;
        }
        self.enqueue(record);
    }

    /// Write `record` to its file now, bypassing the queue, and flush.
    pub fn write_now(&self, record: &LogRecord) -> io::Result<()> {
        let writer = self.router.writer(record.level);
        writer.write_record(record)?;
        writer.writer().flush()
    }

    fn enqueue(&self, record: LogRecord) {
        if self.closed.load(Ordering::Acquire) {
            tracing::debug!(level = %record.level, "dropping record after shutdown");
            return;
        }
        match self.producer.push(record) {
            Ok(Admission::Queued) => {}
            Ok(Admission::DisplacedOldest) => {
                tracing::debug!(
                    dropped = self.producer.dropped(),
                    "queue full, dropped oldest record"
                );
            }
            Err(e) => tracing::warn!(error = %e, "failed to enqueue log record"),
        }
    }

    /// Stop accepting records, write what is queued and join the background
    /// threads. Later calls do nothing.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        self.producer.close();
        let sender = self
            .shutdown
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if sender.is_none() {
            return;
        }
        drop(sender);

        let workers = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        for handle in workers {
            if handle.join().is_err() {
                tracing::warn!("logging worker thread panicked");
            }
        }
        tracing::info!(module = %self.config.module, "logging facility stopped");
    }
}

impl Drop for Facility {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Facility")
            .field("config", &self.config)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
