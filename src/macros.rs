//! `format!`-style logging macros.
//!
//! Each macro takes the facility (anything that derefs to [`Facility`]) as
//! its first argument and records the macro call site as the caller.
//!
//! [`Facility`]: crate::Facility

#[macro_export]
macro_rules! log_debug {
    ($facility:expr, $($arg:tt)+) => {
        $facility.debug(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_info {
    ($facility:expr, $($arg:tt)+) => {
        $facility.info(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($facility:expr, $($arg:tt)+) => {
        $facility.warn(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_error {
    ($facility:expr, $($arg:tt)+) => {
        $facility.error(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_read {
    ($facility:expr, $($arg:tt)+) => {
        $facility.read(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! log_update {
    ($facility:expr, $($arg:tt)+) => {
        $facility.update(::std::format_args!($($arg)+))
    };
}

/// Logs to the error file and exits the process with status 1.
#[macro_export]
macro_rules! log_fatal {
    ($facility:expr, $($arg:tt)+) => {
        $facility.fatal(::std::format_args!($($arg)+))
    };
}
