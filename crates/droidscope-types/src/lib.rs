//! Shared types for droidscope
//!
//! This crate contains data structures used across multiple droidscope crates.

use chrono::NaiveTime;
use ratatui::style::Color;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Default rolling history size for the log buffer.
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Default interval between file-growth polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ============================================================================
// Log Types
// ============================================================================

/// Log severity level as emitted by logcat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum LogLevel {
    Verbose,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
    #[default]
    Unknown,
}

impl LogLevel {
    /// Parse the single-letter level token from a threadtime line
    pub fn from_letter(c: char) -> Self {
        match c {
            'V' => Self::Verbose,
            'D' => Self::Debug,
            'I' => Self::Info,
            'W' => Self::Warn,
            'E' => Self::Error,
            'F' => Self::Fatal,
            _ => Self::Unknown,
        }
    }

    /// Severity rank for at-or-above comparisons (V < D < I < W < E < F).
    /// Unknown has no rank and never satisfies a threshold.
    pub fn rank(&self) -> Option<u8> {
        match self {
            Self::Verbose => Some(0),
            Self::Debug => Some(1),
            Self::Info => Some(2),
            Self::Warn => Some(3),
            Self::Error => Some(4),
            Self::Fatal => Some(5),
            Self::Unknown => None,
        }
    }

    /// Get display color for this level
    pub fn color(&self) -> Color {
        match self {
            Self::Verbose => Color::DarkGray,
            Self::Debug => Color::Cyan,
            Self::Info => Color::Green,
            Self::Warn => Color::Yellow,
            Self::Error => Color::Red,
            Self::Fatal => Color::Magenta,
            Self::Unknown => Color::White,
        }
    }

    /// Single-letter display form, logcat style
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Verbose => "V",
            Self::Debug => "D",
            Self::Info => "I",
            Self::Warn => "W",
            Self::Error => "E",
            Self::Fatal => "F",
            Self::Unknown => "?",
        }
    }
}

/// Whether a raw line matched the threadtime layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ParseStatus {
    /// Structured fields are populated
    Ok,
    /// Raw text only; level is Unknown
    #[default]
    Unparsed,
}

/// A single log record
#[derive(Clone, Debug)]
pub struct LogRecord {
    /// Monotonically increasing sequence number, assigned by the buffer
    pub seq: u64,

    /// Original raw log line, always preserved
    pub raw: String,

    /// Parse outcome for this line
    pub status: ParseStatus,

    /// Time of day from the threadtime prefix. Logcat lines carry no year,
    /// so only the clock time is recoverable; the `MM-DD` prefix stays in
    /// `raw`.
    pub timestamp: Option<NaiveTime>,

    /// Emitting process id
    pub pid: Option<u32>,

    /// Emitting thread id
    pub tid: Option<u32>,

    /// Detected severity
    pub level: LogLevel,

    /// Log tag (may be empty)
    pub tag: String,

    /// Message body after the tag separator
    pub message: String,
}

impl LogRecord {
    /// Create a record for a line that did not match the threadtime layout
    pub fn unparsed(raw: String) -> Self {
        Self {
            seq: 0,
            raw,
            status: ParseStatus::Unparsed,
            timestamp: None,
            pid: None,
            tid: None,
            level: LogLevel::Unknown,
            tag: String::new(),
            message: String::new(),
        }
    }

    /// The text to show in the log pane: the parsed message, or the raw
    /// line for records that never parsed.
    pub fn display_message(&self) -> &str {
        match self.status {
            ParseStatus::Ok => &self.message,
            ParseStatus::Unparsed => &self.raw,
        }
    }
}

/// Shared handle used between the buffer and the renderer
pub type ArcLogRecord = Arc<LogRecord>;

// ============================================================================
// Configuration
// ============================================================================

/// Viewer configuration resolved by the CLI wrapper and passed into the
/// core entry point. Everything the viewer needs lives here; there is no
/// ambient global state.
#[derive(Clone, Debug)]
pub struct ViewerConfig {
    /// Log file to follow
    pub log_path: PathBuf,

    /// Initial package filter value (best-effort application id)
    pub package: Option<String>,

    /// Whether the package filter starts enabled
    pub package_filter_enabled: bool,

    /// Rolling history size
    pub buffer_capacity: usize,

    /// Interval between file-growth polls
    pub poll_interval: Duration,

    /// Seed the buffer with the tail of existing file content before
    /// following, instead of starting from the current end
    pub seed_existing: bool,
}

impl ViewerConfig {
    pub fn new(log_path: PathBuf) -> Self {
        Self {
            log_path,
            package: None,
            package_filter_enabled: true,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            poll_interval: DEFAULT_POLL_INTERVAL,
            seed_existing: true,
        }
    }
}
