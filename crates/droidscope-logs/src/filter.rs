use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

use droidscope_types::{LogLevel, LogRecord};

/// Error produced by [`LevelFilter::parse`] for specs outside the two
/// documented forms (`VDI`-style sets and `W+`-style thresholds).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LevelSpecError {
    #[error("empty level spec")]
    Empty,
    #[error("unknown level letter '{0}' (expected V, D, I, W, E or F)")]
    UnknownLetter(char),
    #[error("'+' must follow exactly one level letter, e.g. W+")]
    BadThreshold,
}

/// Level constraint in one of two explicit modes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LevelFilter {
    /// Record level must be a member of this set (`VDI` = V, D or I)
    Exact(HashSet<LogLevel>),
    /// Record level must rank at or above this level (`W+` = W, E or F)
    AtLeast(LogLevel),
}

impl LevelFilter {
    /// Parse a level spec: one or more letters from `VDIWEF` for an exact
    /// set, or a single letter followed by `+` for at-or-above. No other
    /// shorthand is accepted.
    pub fn parse(spec: &str) -> Result<Self, LevelSpecError> {
        let spec = spec.trim();
        if spec.is_empty() {
            return Err(LevelSpecError::Empty);
        }

        if let Some(prefix) = spec.strip_suffix('+') {
            let mut chars = prefix.chars();
            let (Some(letter), None) = (chars.next(), chars.next()) else {
                return Err(LevelSpecError::BadThreshold);
            };
            let level = parse_letter(letter)?;
            return Ok(Self::AtLeast(level));
        }

        let mut set = HashSet::new();
        for c in spec.chars() {
            set.insert(parse_letter(c)?);
        }
        Ok(Self::Exact(set))
    }

    /// Whether a record level satisfies this constraint. Unknown levels
    /// have no rank and satisfy neither mode unless the set holds them.
    pub fn matches(&self, level: LogLevel) -> bool {
        match self {
            Self::Exact(set) => set.contains(&level),
            Self::AtLeast(threshold) => match (level.rank(), threshold.rank()) {
                (Some(r), Some(t)) => r >= t,
                _ => false,
            },
        }
    }
}

impl fmt::Display for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(set) => {
                let mut members: Vec<&LogLevel> = set.iter().collect();
                members.sort_by_key(|l| l.rank());
                for level in members {
                    write!(f, "{}", level.as_str())?;
                }
                Ok(())
            }
            Self::AtLeast(level) => write!(f, "{}+", level.as_str()),
        }
    }
}

fn parse_letter(c: char) -> Result<LogLevel, LevelSpecError> {
    let level = LogLevel::from_letter(c.to_ascii_uppercase());
    if level == LogLevel::Unknown {
        return Err(LevelSpecError::UnknownLetter(c));
    }
    Ok(level)
}

/// The live filter configuration. Mutated only by the interactive
/// controller; read by the view projection. A record passes iff every
/// enabled constraint matches (logical AND); an unset constraint always
/// matches.
#[derive(Clone, Debug, Default)]
pub struct FilterState {
    /// Whether the package constraint participates at all
    pub package_enabled: bool,
    /// Application id to match (usually discovered from the build file)
    pub package: Option<String>,
    /// Tag constraint
    pub tag: Option<String>,
    /// Level constraint
    pub level: Option<LevelFilter>,
    /// Free-text constraint against the message
    pub text: Option<String>,
}

impl FilterState {
    pub fn new(package: Option<String>, package_enabled: bool) -> Self {
        Self {
            package_enabled,
            package,
            ..Self::default()
        }
    }

    /// Test a record, short-circuiting cheap-to-expensive:
    /// level, then tag, then package, then text.
    pub fn matches(&self, record: &LogRecord) -> bool {
        if let Some(level) = &self.level
            && !level.matches(record.level)
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !value_matches(tag, &record.tag)
        {
            return false;
        }
        // An enabled package filter with no configured package contributes
        // no constraint; the raw line is the match target since the app id
        // can surface in either the tag or the message.
        if self.package_enabled
            && let Some(package) = &self.package
            && !value_matches(package, &record.raw)
        {
            return false;
        }
        if let Some(text) = &self.text
            && !value_matches(text, record.display_message())
        {
            return false;
        }
        true
    }

    /// Reset tag, level and text, keeping the package constraint
    pub fn clear_transient(&mut self) {
        self.tag = None;
        self.level = None;
        self.text = None;
    }

    /// Reset everything, including the package constraint
    pub fn clear_all(&mut self) {
        self.clear_transient();
        self.package = None;
        self.package_enabled = false;
    }

    /// Whether any constraint is currently in effect
    pub fn is_active(&self) -> bool {
        (self.package_enabled && self.package.is_some())
            || self.tag.is_some()
            || self.level.is_some()
            || self.text.is_some()
    }

    /// One-line summary for the filter bar, e.g.
    /// `pkg:com.example.app tag:NetQueue lvl:W+ text:boom`
    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        if let Some(package) = &self.package {
            if self.package_enabled {
                parts.push(format!("pkg:{package}"));
            } else {
                parts.push(format!("pkg:({package})"));
            }
        }
        if let Some(tag) = &self.tag {
            parts.push(format!("tag:{tag}"));
        }
        if let Some(level) = &self.level {
            parts.push(format!("lvl:{level}"));
        }
        if let Some(text) = &self.text {
            parts.push(format!("text:{text}"));
        }
        parts.join(" ")
    }
}

/// Case-sensitive substring containment, or exact equality when the
/// stored pattern is wrapped in double quotes. Substring is the default
/// because log tags are routinely prefixed or suffixed.
fn value_matches(pattern: &str, value: &str) -> bool {
    if let Some(exact) = pattern
        .strip_prefix('"')
        .and_then(|p| p.strip_suffix('"'))
    {
        value == exact
    } else {
        value.contains(pattern)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidscope_types::ParseStatus;

    fn record(level: LogLevel, tag: &str, message: &str) -> LogRecord {
        LogRecord {
            seq: 0,
            raw: format!("01-01 00:00:00.000  100  100 {} {}: {}", level.as_str(), tag, message),
            status: ParseStatus::Ok,
            timestamp: None,
            pid: Some(100),
            tid: Some(100),
            level,
            tag: tag.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = FilterState::default();
        assert!(filter.matches(&record(LogLevel::Verbose, "A", "x")));
        assert!(filter.matches(&LogRecord::unparsed("garbage".to_string())));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_level_spec_forms() {
        assert_eq!(
            LevelFilter::parse("W+"),
            Ok(LevelFilter::AtLeast(LogLevel::Warn))
        );
        assert_eq!(
            LevelFilter::parse("E"),
            Ok(LevelFilter::Exact(HashSet::from([LogLevel::Error])))
        );
        assert_eq!(
            LevelFilter::parse("vdi"),
            Ok(LevelFilter::Exact(HashSet::from([
                LogLevel::Verbose,
                LogLevel::Debug,
                LogLevel::Info,
            ])))
        );
        assert_eq!(LevelFilter::parse(""), Err(LevelSpecError::Empty));
        assert_eq!(
            LevelFilter::parse("X"),
            Err(LevelSpecError::UnknownLetter('X'))
        );
        assert_eq!(LevelFilter::parse("WE+"), Err(LevelSpecError::BadThreshold));
    }

    #[test]
    fn test_at_least_warn_matches_exactly_w_e_f() {
        let filter = LevelFilter::parse("W+").unwrap();
        assert!(filter.matches(LogLevel::Warn));
        assert!(filter.matches(LogLevel::Error));
        assert!(filter.matches(LogLevel::Fatal));
        assert!(!filter.matches(LogLevel::Verbose));
        assert!(!filter.matches(LogLevel::Debug));
        assert!(!filter.matches(LogLevel::Info));
        assert!(!filter.matches(LogLevel::Unknown));
    }

    #[test]
    fn test_unknown_level_matches_neither_mode() {
        assert!(!LevelFilter::parse("VDIWEF").unwrap().matches(LogLevel::Unknown));
        assert!(!LevelFilter::parse("V+").unwrap().matches(LogLevel::Unknown));
    }

    #[test]
    fn test_tag_substring_and_exact() {
        let mut filter = FilterState::default();
        filter.tag = Some("Net".to_string());
        assert!(filter.matches(&record(LogLevel::Info, "NetQueue", "x")));

        filter.tag = Some("\"Net\"".to_string());
        assert!(!filter.matches(&record(LogLevel::Info, "NetQueue", "x")));
        assert!(filter.matches(&record(LogLevel::Info, "Net", "x")));
    }

    #[test]
    fn test_tag_match_is_case_sensitive() {
        let mut filter = FilterState::default();
        filter.tag = Some("net".to_string());
        assert!(!filter.matches(&record(LogLevel::Info, "NetQueue", "x")));
    }

    #[test]
    fn test_package_toggle_without_name_is_no_op() {
        let filter = FilterState::new(None, true);
        assert!(filter.matches(&record(LogLevel::Info, "A", "x")));
        assert!(!filter.is_active());
    }

    #[test]
    fn test_package_disabled_contributes_no_constraint() {
        let filter = FilterState::new(Some("com.example.app".to_string()), false);
        assert!(filter.matches(&record(LogLevel::Info, "A", "x")));
    }

    #[test]
    fn test_enabling_filters_only_shrinks_match_set() {
        let records = [
            record(LogLevel::Info, "MyTag", "hello"),
            record(LogLevel::Error, "MyTag", "boom"),
            record(LogLevel::Warn, "Other", "slow response"),
        ];

        let mut filter = FilterState::default();
        let all: Vec<bool> = records.iter().map(|r| filter.matches(r)).collect();
        assert!(all.iter().all(|m| *m));

        filter.level = Some(LevelFilter::parse("W+").unwrap());
        let leveled: Vec<bool> = records.iter().map(|r| filter.matches(r)).collect();

        filter.text = Some("boom".to_string());
        let texted: Vec<bool> = records.iter().map(|r| filter.matches(r)).collect();

        for i in 0..records.len() {
            assert!(!leveled[i] || all[i]);
            assert!(!texted[i] || leveled[i]);
        }
        assert_eq!(texted, vec![false, true, false]);
    }

    #[test]
    fn test_documented_level_scenario() {
        let parser = crate::LineParser::new();
        let info = parser.parse("01-01 00:00:00.000  100  100 I MyTag: hello");
        let error = parser.parse("01-01 00:00:00.000  100  100 E MyTag: boom");

        let mut filter = FilterState::default();
        filter.level = Some(LevelFilter::parse("E").unwrap());

        assert!(!filter.matches(&info));
        assert!(filter.matches(&error));
    }

    #[test]
    fn test_matches_is_idempotent_over_snapshot() {
        let records: Vec<LogRecord> = (0..20)
            .map(|i| {
                record(
                    if i % 2 == 0 { LogLevel::Info } else { LogLevel::Error },
                    "T",
                    &format!("m{i}"),
                )
            })
            .collect();
        let mut filter = FilterState::default();
        filter.level = Some(LevelFilter::parse("E").unwrap());

        let first: Vec<u64> = records.iter().filter(|r| filter.matches(r)).map(|r| r.seq).collect();
        let second: Vec<u64> = records.iter().filter(|r| filter.matches(r)).map(|r| r.seq).collect();
        assert_eq!(first, second);
    }
}
