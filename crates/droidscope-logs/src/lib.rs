//! Log processing for droidscope
//!
//! This crate provides log buffering, line parsing, filtering, and file
//! tailing for the interactive viewer.

mod buffer;
mod filter;
mod parser;
mod tailer;

pub use buffer::{LevelCounts, LogBuffer};
pub use filter::{FilterState, LevelFilter, LevelSpecError};
pub use parser::LineParser;
pub use tailer::{LogTailer, PollOutcome, TailError, TailEvent, TailHandle};

// Re-export types used in our public API
pub use droidscope_types::{ArcLogRecord, LogLevel, LogRecord, ParseStatus};
