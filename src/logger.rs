//! Decision logger with verbosity levels and in-memory capture
//!
//! The engine never panics on a bad decision; it logs and moves on. Tests
//! assert on the captured entries, so the logger can mirror everything it
//! prints into an in-memory buffer.

use serde::{Deserialize, Serialize};
use std::cell::{Ref, RefCell};
use std::ops::Deref;

/// Verbosity level for decision output
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum VerbosityLevel {
    /// Silent - no output
    Silent = 0,
    /// Minimal - only warnings and turn summaries
    Minimal = 1,
    /// Normal - plays, attacks, and strategy changes (default)
    #[default]
    Normal = 2,
    /// Verbose - every evaluation and wait
    Verbose = 3,
}

/// Output destination for log messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputMode {
    /// Output only to stdout (default)
    #[default]
    Stdout,
    /// Capture only to in-memory buffer (no stdout)
    Memory,
    /// Both stdout and in-memory buffer
    Both,
}

/// A captured log entry with owned strings
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: VerbosityLevel,
    /// Category of the entry (e.g. "card_play", "attack", "strategy")
    pub category: Option<String>,
    pub message: String,
}

/// Guard type providing read-only slice access to captured entries
pub struct LogGuard<'a> {
    guard: Ref<'a, Vec<LogEntry>>,
}

impl<'a> Deref for LogGuard<'a> {
    type Target = [LogEntry];

    fn deref(&self) -> &Self::Target {
        &self.guard
    }
}

/// Centralized logger for the AI engine
pub struct AiLogger {
    verbosity: VerbosityLevel,
    output_mode: OutputMode,
    buffer: RefCell<Vec<LogEntry>>,
}

impl AiLogger {
    /// Create a logger with default verbosity (Normal), stdout only
    pub fn new() -> Self {
        Self::with_verbosity(VerbosityLevel::default())
    }

    pub fn with_verbosity(verbosity: VerbosityLevel) -> Self {
        AiLogger {
            verbosity,
            output_mode: OutputMode::default(),
            buffer: RefCell::new(Vec::new()),
        }
    }

    /// Capture entries in memory instead of (or in addition to) stdout
    pub fn set_output_mode(&mut self, mode: OutputMode) {
        self.output_mode = mode;
    }

    pub fn set_verbosity(&mut self, verbosity: VerbosityLevel) {
        self.verbosity = verbosity;
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        self.verbosity
    }

    /// Read-only access to the captured entries
    pub fn entries(&self) -> LogGuard<'_> {
        LogGuard {
            guard: self.buffer.borrow(),
        }
    }

    /// Discard captured entries (start of a new turn/session)
    pub fn clear(&self) {
        self.buffer.borrow_mut().clear();
    }

    fn emit(&self, level: VerbosityLevel, category: Option<&str>, message: &str) {
        if level > self.verbosity {
            return;
        }
        if matches!(self.output_mode, OutputMode::Stdout | OutputMode::Both) {
            match category {
                Some(cat) => println!("[{}] {}", cat, message),
                None => println!("{}", message),
            }
        }
        if matches!(self.output_mode, OutputMode::Memory | OutputMode::Both) {
            self.buffer.borrow_mut().push(LogEntry {
                level,
                category: category.map(str::to_string),
                message: message.to_string(),
            });
        }
    }

    /// Warnings are always shown at Minimal and above
    pub fn warn(&self, category: &str, message: &str) {
        self.emit(VerbosityLevel::Minimal, Some(category), message);
    }

    pub fn normal(&self, category: &str, message: &str) {
        self.emit(VerbosityLevel::Normal, Some(category), message);
    }

    pub fn verbose(&self, category: &str, message: &str) {
        self.emit(VerbosityLevel::Verbose, Some(category), message);
    }

    /// Count captured entries for a category (test helper, cheap enough to keep)
    pub fn count_category(&self, category: &str) -> usize {
        self.buffer
            .borrow()
            .iter()
            .filter(|e| e.category.as_deref() == Some(category))
            .count()
    }
}

impl Default for AiLogger {
    fn default() -> Self {
        Self::new()
    }
}

/// Conditional verbose logging that avoids allocation when the
/// `verbose-logging` feature is disabled.
#[macro_export]
macro_rules! log_verbose {
    ($logger:expr, $category:expr, $($arg:tt)*) => {
        #[cfg(feature = "verbose-logging")]
        {
            $logger.verbose($category, &format!($($arg)*));
        }
        #[cfg(not(feature = "verbose-logging"))]
        {
            let _ = &$logger;
        }
    };
}
