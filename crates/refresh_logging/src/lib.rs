#![deny(missing_docs)]
//! Shared logging utilities for the refresh client workspace.
//!
//! This crate provides the `refresh_*` logging macros used across the codebase
//! and a minimal test initializer for the global logger. All records are emitted
//! under the [`TARGET`] log target so a host application can filter them as a group.

use log::LevelFilter;

/// Log target used by every `refresh_*` macro.
pub const TARGET: &str = "refresh";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! refresh_trace {
    ($($arg:tt)*) => {{
        log::trace!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! refresh_info {
    ($($arg:tt)*) => {{
        log::info!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! refresh_debug {
    ($($arg:tt)*) => {{
        log::debug!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! refresh_warn {
    ($($arg:tt)*) => {{
        log::warn!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! refresh_error {
    ($($arg:tt)*) => {{
        log::error!(target: $crate::TARGET, $($arg)*);
    }};
}

/// Level used when nothing more specific is configured.
///
/// Debug builds log at debug level, release builds at info.
pub fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Parses a level name such as `"warn"` or `"TRACE"`, falling back to [`default_level`].
pub fn level_from_name(name: Option<&str>) -> LevelFilter {
    name.and_then(|raw| raw.trim().parse::<LevelFilter>().ok())
        .unwrap_or_else(default_level)
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        default_level(),
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
