//! Process-wide handles.
//!
//! Two unrelated conveniences live here: a registry for one [`Facility`]
//! that code without access to a handle can reach, and a default
//! [`SerialWriter`] on stderr that needs no initialization at all.

use std::fmt;
use std::io;

use once_cell::sync::{Lazy, OnceCell};

use crate::format::{Caller, HeaderFlags};
use crate::rotation::{Clock, SystemClock};
use crate::writer::SerialWriter;
use crate::{Error, Facility, Result};

static FACILITY: OnceCell<Facility> = OnceCell::new();

static STD_WRITER: Lazy<SerialWriter> =
    Lazy::new(|| SerialWriter::new(Box::new(io::stderr()), "", HeaderFlags::STD));

static STD_CLOCK: Lazy<SystemClock> = Lazy::new(SystemClock::new);

/// Register `facility` as the process-wide facility.
///
/// Only the first registration succeeds; the facility then lives until the
/// process exits.
pub fn install(facility: Facility) -> Result<&'static Facility> {
    match FACILITY.try_insert(facility) {
        Ok(installed) => Ok(installed),
        Err((_, rejected)) => {
            rejected.shutdown();
            Err(Error::Init(
                "a global logging facility is already installed".to_string(),
            ))
        }
    }
}

/// The registered facility, if any.
pub fn facility() -> Option<&'static Facility> {
    FACILITY.get()
}

/// Default writer on stderr with date and time headers.
pub fn std_writer() -> &'static SerialWriter {
    &STD_WRITER
}

/// Write one line through the default writer.
#[track_caller]
pub fn print(args: fmt::Arguments<'_>) {
    let caller = Caller::here();
    let text = args.to_string();
    // Nothing sensible to do if stderr is gone.
    let _ = STD_WRITER.output(STD_CLOCK.now(), Some(caller), &text);
}
