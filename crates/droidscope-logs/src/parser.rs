use chrono::NaiveTime;
use regex::Regex;

use droidscope_types::{LogLevel, LogRecord, ParseStatus};

/// Parser for logcat "threadtime" lines
/// (`MM-DD HH:MM:SS.mmm  PID  TID LEVEL TAG: message`).
///
/// Parsing is pure: one line in, one record out, no IO and no clock.
/// Lines that do not match the layout come back as `Unparsed` records
/// with the raw text preserved, so nothing is silently dropped.
pub struct LineParser {
    threadtime: Regex,
}

impl LineParser {
    pub fn new() -> Self {
        // The tag/message split happens at the first ": " after the level
        // token; later occurrences of ": " belong to the message body.
        let threadtime = Regex::new(
            r"^(\d{2}-\d{2})\s+(\d{2}:\d{2}:\d{2}\.\d{3})\s+(\d+)\s+(\d+)\s+([VDIWEF])\s+(.*?)\s*:\s?(.*)$",
        )
        .expect("threadtime pattern is valid");
        Self { threadtime }
    }

    /// Parse a raw log line into a LogRecord. The sequence number is
    /// assigned later by the buffer.
    pub fn parse(&self, raw: &str) -> LogRecord {
        let Some(caps) = self.threadtime.captures(raw) else {
            return LogRecord::unparsed(raw.to_string());
        };

        let timestamp = NaiveTime::parse_from_str(&caps[2], "%H:%M:%S%.3f").ok();
        let pid = caps[3].parse::<u32>().ok();
        let tid = caps[4].parse::<u32>().ok();
        let level = LogLevel::from_letter(caps[5].chars().next().unwrap_or('?'));

        LogRecord {
            seq: 0,
            raw: raw.to_string(),
            status: ParseStatus::Ok,
            timestamp,
            pid,
            tid,
            level,
            tag: caps[6].to_string(),
            message: caps[7].to_string(),
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_threadtime_line() {
        let parser = LineParser::new();
        let record = parser.parse("01-01 00:00:00.000  100  100 I MyTag: hello");

        assert_eq!(record.status, ParseStatus::Ok);
        assert_eq!(record.level, LogLevel::Info);
        assert_eq!(record.pid, Some(100));
        assert_eq!(record.tid, Some(100));
        assert_eq!(record.tag, "MyTag");
        assert_eq!(record.message, "hello");
        assert!(record.timestamp.is_some());
    }

    #[test]
    fn test_parse_keeps_delimiter_inside_message() {
        let parser = LineParser::new();
        let record =
            parser.parse("06-15 12:34:56.789  1234  5678 W NetQueue: retry: backoff: 2s");

        assert_eq!(record.tag, "NetQueue");
        assert_eq!(record.message, "retry: backoff: 2s");
    }

    #[test]
    fn test_parse_padded_tag_and_empty_message() {
        let parser = LineParser::new();
        let record = parser.parse("06-15 12:34:56.789   801   801 D chatty  : ");

        assert_eq!(record.status, ParseStatus::Ok);
        assert_eq!(record.tag, "chatty");
        assert_eq!(record.message, "");
    }

    #[test]
    fn test_malformed_line_is_unparsed_not_dropped() {
        let parser = LineParser::new();
        let record = parser.parse("--------- beginning of crash");

        assert_eq!(record.status, ParseStatus::Unparsed);
        assert_eq!(record.level, LogLevel::Unknown);
        assert_eq!(record.raw, "--------- beginning of crash");
    }

    #[test]
    fn test_unknown_level_letter_is_unparsed() {
        let parser = LineParser::new();
        // 'S' (silent) never appears on records; treat as unparseable
        let record = parser.parse("01-01 00:00:00.000  100  100 S MyTag: hello");
        assert_eq!(record.status, ParseStatus::Unparsed);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let parser = LineParser::new();
        let line = "01-01 00:00:00.000  100  100 E MyTag: boom";
        let a = parser.parse(line);
        let b = parser.parse(line);
        assert_eq!(a.message, b.message);
        assert_eq!(a.level, b.level);
        assert_eq!(a.tag, b.tag);
    }
}
