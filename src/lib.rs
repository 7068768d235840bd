//! # Levelsplit
//!
//! Asynchronous leveled logging to one file per level, with daily rotation.
//!
//! ## Features
//!
//! - Six files per facility: debug, info, warn, error, read and update
//! - Bounded queue drained by a single dispatcher thread, FIFO per level
//! - Daily rotation to `<file>.<YYYY-MM-DD>` by a background monitor
//! - Configurable line headers (date, time, sub-second fraction, caller)
//! - Blocking or drop-oldest behavior when the queue is full
//! - Diagnostics through the `tracing` ecosystem
//!
//! ## Example
//!
//! ```rust
//! use levelsplit::{Facility, Level, log_info, log_update};
//!
//! let dir = std::env::temp_dir().join("levelsplit-doc");
//! std::fs::create_dir_all(&dir)?;
//!
//! let facility = Facility::new(&dir, "app", Level::Info)?;
//! log_info!(facility, "listening on {}", 8080);
//! log_update!(facility, "key {} set", "alpha");
//! facility.shutdown();
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod facility;
pub mod format;
pub mod global;
pub mod level;
mod macros;
pub mod queue;
pub mod record;
pub mod rotation;
pub mod router;
pub mod writer;

pub use config::{DiagnosticsConfig, FacilityConfig, LevelSuffixes};
pub use diagnostics::init_diagnostics;
pub use error::{Error, Result};
pub use facility::Facility;
pub use format::{Caller, FileInfo, HeaderFlags, Precision};
pub use level::Level;
pub use queue::{Admission, OverflowPolicy};
pub use record::LogRecord;
pub use rotation::{Clock, RotationBoundary, RotationMonitor, RotationOutcome, SystemClock};
pub use router::{LevelRouter, LevelWriter};
pub use writer::{SerialWriter, Sink};
