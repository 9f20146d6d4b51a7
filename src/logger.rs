//! Structured logging with box-drawing output.
//!
//! Every line lightly prints goes through this module so that output keeps a
//! single visual style and can be silenced as a whole (tests, `status --json`).
//!
//! ## Conventions
//!
//! - **`log_block_start!`**: opens a new conceptual block (a state change, a
//!   command header). Prints an empty pipe for spacing, then `┣ message`.
//! - **`log_decorated!`**: a line that belongs to the current block, `┣ message`.
//! - **`log_indented!`**: nested detail under the previous line, `┃   message`.
//! - **`log_pipe!`**: a bare `┃` used to separate a level-prefixed message
//!   (`log_warning!`, `log_error!`, ...) from the block above it.
//! - **`log_version!`** / **`log_end!`**: the header printed once at startup and
//!   the terminator printed once at exit.
//! - **`log_info!`, `log_warning!`, `log_error!`, `log_debug!`**:
//!   `[LEVEL]` prefixed lines for messages that carry a severity.
//!
//! When the clock is simulated each line is prefixed with the simulated
//! `[HH:MM:SS]` so that simulation output reads as a timeline.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);

/// Line shapes produced by the logging macros.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Block,
    Decorated,
    Indented,
    Pipe,
    Version,
    End,
    Info,
    Debug,
    Warning,
    WarningStandalone,
    Error,
    ErrorExit,
}

/// Main logging interface.
pub struct Log;

impl Log {
    /// Enable or disable all output.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Timestamp prefix for simulation mode, empty when running on the real clock.
    pub fn get_timestamp_prefix() -> String {
        if crate::time_source::is_initialized() && crate::time_source::is_simulated() {
            format!("[{}] ", crate::time_source::now().format("%H:%M:%S"))
        } else {
            String::new()
        }
    }
}

/// Render one logical line in the given style, including the trailing newline.
pub fn render(style: Style, prefix: &str, message: &str) -> String {
    const RED: &str = "\x1b[31m";
    const GREEN: &str = "\x1b[32m";
    const YELLOW: &str = "\x1b[33m";
    const RESET: &str = "\x1b[0m";

    match style {
        Style::Block => format!("{prefix}┃\n{prefix}┣ {message}\n"),
        Style::Decorated => format!("{prefix}┣ {message}\n"),
        Style::Indented => format!("{prefix}┃   {message}\n"),
        Style::Pipe => format!("{prefix}┃\n"),
        Style::Version => format!("{prefix}┏ lightly v{message} ━━╸\n"),
        Style::End => format!("{prefix}╹\n"),
        Style::Info => format!("{prefix}┣[{GREEN}INFO{RESET}] {message}\n"),
        Style::Debug => format!("{prefix}┣[{GREEN}DEBUG{RESET}] {message}\n"),
        Style::Warning => format!("{prefix}┣[{YELLOW}WARNING{RESET}] {message}\n"),
        Style::WarningStandalone => format!("{prefix}[{YELLOW}WARNING{RESET}] {message}\n"),
        Style::Error => format!("{prefix}┣[{RED}ERROR{RESET}] {message}\n"),
        Style::ErrorExit => format!("{prefix}┃\n{prefix}┗[{RED}ERROR{RESET}] {message}\n"),
    }
}

/// Entry point used by the macros.
pub fn emit(style: Style, message: &str) {
    if !Log::is_enabled() {
        return;
    }
    let prefix = Log::get_timestamp_prefix();
    write_output(&render(style, &prefix, message));
}

/// Write already formatted text to stdout.
pub fn write_output(text: &str) {
    let mut stdout = std::io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.flush();
}

// # Logging Macros

#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Block, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Decorated, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Indented, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_pipe {
    () => {
        $crate::logger::emit($crate::logger::Style::Pipe, "")
    };
}

#[macro_export]
macro_rules! log_version {
    () => {
        $crate::logger::emit($crate::logger::Style::Version, env!("CARGO_PKG_VERSION"))
    };
}

#[macro_export]
macro_rules! log_end {
    () => {
        $crate::logger::emit($crate::logger::Style::End, "")
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Debug, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Warning, &format!($($arg)*))
    };
}

/// Warning without the pipe prefix, for output outside of a block.
#[macro_export]
macro_rules! log_warning_standalone {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::WarningStandalone, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::Error, &format!($($arg)*))
    };
}

/// Error that terminates the current flow, drawn with a closing corner.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)*) => {
        $crate::logger::emit($crate::logger::Style::ErrorExit, &format!($($arg)*))
    };
}
