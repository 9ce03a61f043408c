use droidscope_logs::{FilterState, LevelFilter, LogBuffer};
use droidscope_types::{ArcLogRecord, ViewerConfig};

use super::PromptKind;

/// Cache of the current filtered projection, so the log pane is not
/// re-filtered on every frame. Invalidated by filter mutations (via the
/// generation counter) and by buffer growth.
#[derive(Default)]
pub struct FilterCache {
    cached_generation: u64,
    cached_source_len: usize,
    /// The cached filtered records
    pub entries: Vec<ArcLogRecord>,
    /// Whether cache holds a usable projection
    pub is_valid: bool,
}

impl FilterCache {
    pub fn needs_refresh(&self, generation: u64, source_len: usize) -> bool {
        !self.is_valid
            || self.cached_generation != generation
            || self.cached_source_len != source_len
    }

    pub fn update(&mut self, generation: u64, source_len: usize, entries: Vec<ArcLogRecord>) {
        self.cached_generation = generation;
        self.cached_source_len = source_len;
        self.entries = entries;
        self.is_valid = true;
    }
}

/// Whether the tailer is still delivering
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TailStatus {
    /// Live, following the file
    Following,
    /// The source ended; the view covers buffered history only
    Frozen(String),
}

/// UI-specific transient state
pub struct UiState {
    /// Is the visible window frozen? The tailer keeps appending.
    pub paused: bool,

    /// Is help overlay visible?
    pub help_visible: bool,

    /// Active single-line prompt, if any
    pub prompt: Option<PromptKind>,

    /// Current prompt input text
    pub prompt_input: String,

    /// Inline error from the last filter input (e.g. a bad level spec)
    pub filter_error: Option<String>,

    /// Scroll position in the log pane
    pub scroll: usize,

    /// Follow mode: stay pinned to the newest record
    pub follow: bool,

    /// Cache for the filtered projection
    pub filter_cache: FilterCache,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            paused: false,
            help_visible: false,
            prompt: None,
            prompt_input: String::new(),
            filter_error: None,
            scroll: 0,
            follow: true,
            filter_cache: FilterCache::default(),
        }
    }
}

/// Global application state
pub struct AppState {
    /// Resolved viewer configuration
    pub config: ViewerConfig,

    /// The live filter; mutated here only
    pub filter: FilterState,

    /// Bumped on every filter mutation; stale projections are replayed
    /// from the buffer snapshot rather than patched incrementally
    pub filter_generation: u64,

    /// While paused, the snapshot the visible window was frozen over
    frozen_snapshot: Option<Vec<ArcLogRecord>>,

    /// UI state
    pub ui_state: UiState,

    /// Tailer liveness as reported over the event channel
    pub tail_status: TailStatus,

    /// Whether app should quit
    pub should_quit: bool,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let filter = FilterState::new(config.package.clone(), config.package_filter_enabled);
        Self {
            config,
            filter,
            filter_generation: 0,
            frozen_snapshot: None,
            ui_state: UiState::default(),
            tail_status: TailStatus::Following,
            should_quit: false,
        }
    }

    /// Record a filter mutation so the next projection replays the whole
    /// buffer snapshot through the new predicate.
    fn bump_filter(&mut self) {
        self.filter_generation += 1;
        self.ui_state.scroll = 0;
    }

    /// Recompute the visible projection if it is stale. While paused the
    /// source is the snapshot taken at pause time, so new arrivals stay
    /// out of the window but filter edits still apply to it.
    pub fn refresh_projection(&mut self, buffer: &LogBuffer) {
        let (source_len, generation) = match &self.frozen_snapshot {
            Some(snapshot) => (snapshot.len(), self.filter_generation),
            None => (buffer.len(), self.filter_generation),
        };
        if !self
            .ui_state
            .filter_cache
            .needs_refresh(generation, source_len)
        {
            return;
        }

        let entries: Vec<ArcLogRecord> = match &self.frozen_snapshot {
            Some(snapshot) => snapshot
                .iter()
                .filter(|r| self.filter.matches(r))
                .cloned()
                .collect(),
            None => buffer
                .snapshot()
                .into_iter()
                .filter(|r| self.filter.matches(r))
                .collect(),
        };
        self.ui_state
            .filter_cache
            .update(generation, source_len, entries);
    }

    /// Toggle pause. Pausing freezes the window over the records held
    /// right now; unpausing resumes the live projection.
    pub fn toggle_pause(&mut self, buffer: &LogBuffer) {
        if self.ui_state.paused {
            self.ui_state.paused = false;
            self.frozen_snapshot = None;
        } else {
            self.ui_state.paused = true;
            self.frozen_snapshot = Some(buffer.snapshot());
        }
        self.ui_state.filter_cache.is_valid = false;
    }

    /// Toggle the package constraint. Without a configured package this
    /// flips the flag but constrains nothing.
    pub fn toggle_package_filter(&mut self) {
        self.filter.package_enabled = !self.filter.package_enabled;
        self.bump_filter();
    }

    /// Clear tag, level and text filters, keeping package
    pub fn clear_filters(&mut self) {
        self.filter.clear_transient();
        self.ui_state.filter_error = None;
        self.bump_filter();
    }

    /// Clear every filter including package
    pub fn clear_all_filters(&mut self) {
        self.filter.clear_all();
        self.ui_state.filter_error = None;
        self.bump_filter();
    }

    /// Start collecting a filter value
    pub fn open_prompt(&mut self, kind: PromptKind) {
        self.ui_state.prompt = Some(kind);
        self.ui_state.prompt_input.clear();
        self.ui_state.filter_error = None;
    }

    /// Abandon the prompt, leaving the previous filter value in place
    pub fn cancel_prompt(&mut self) {
        self.ui_state.prompt = None;
        self.ui_state.prompt_input.clear();
        self.ui_state.filter_error = None;
    }

    pub fn prompt_char(&mut self, c: char) {
        self.ui_state.prompt_input.push(c);
    }

    pub fn prompt_backspace(&mut self) {
        self.ui_state.prompt_input.pop();
    }

    pub fn prompt_clear(&mut self) {
        self.ui_state.prompt_input.clear();
    }

    /// Apply the prompt input to the filter. Empty input clears the
    /// value. An unparsable level spec keeps the previous filter, shows
    /// the error inline and leaves the prompt open for correction.
    pub fn accept_prompt(&mut self) {
        let Some(kind) = self.ui_state.prompt else {
            return;
        };
        let input = self.ui_state.prompt_input.trim().to_string();

        match kind {
            PromptKind::Package => {
                if input.is_empty() {
                    self.filter.package = None;
                } else {
                    self.filter.package = Some(input);
                    self.filter.package_enabled = true;
                }
            }
            PromptKind::Tag => {
                self.filter.tag = (!input.is_empty()).then_some(input);
            }
            PromptKind::Text => {
                self.filter.text = (!input.is_empty()).then_some(input);
            }
            PromptKind::Level => {
                if input.is_empty() {
                    self.filter.level = None;
                } else {
                    match LevelFilter::parse(&input) {
                        Ok(level) => self.filter.level = Some(level),
                        Err(err) => {
                            self.ui_state.filter_error = Some(err.to_string());
                            return;
                        }
                    }
                }
            }
        }

        self.ui_state.prompt = None;
        self.ui_state.prompt_input.clear();
        self.ui_state.filter_error = None;
        self.bump_filter();
    }

    /// The source ended; keep serving buffered history until quit
    pub fn mark_frozen(&mut self, reason: String) {
        self.tail_status = TailStatus::Frozen(reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droidscope_logs::LineParser;
    use std::path::PathBuf;

    fn config() -> ViewerConfig {
        ViewerConfig::new(PathBuf::from("/tmp/app.log"))
    }

    fn seeded_buffer() -> LogBuffer {
        let parser = LineParser::new();
        let buffer = LogBuffer::new(16);
        buffer.append(parser.parse("01-01 00:00:00.000  100  100 I MyTag: hello"));
        buffer.append(parser.parse("01-01 00:00:01.000  100  100 E MyTag: boom"));
        buffer
    }

    fn apply(state: &mut AppState, kind: PromptKind, input: &str) {
        state.open_prompt(kind);
        for c in input.chars() {
            state.prompt_char(c);
        }
        state.accept_prompt();
    }

    #[test]
    fn test_text_filter_replays_buffered_history() {
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());

        state.refresh_projection(&buffer);
        assert_eq!(state.ui_state.filter_cache.entries.len(), 2);

        // Both lines were buffered before the filter existed; the view
        // must re-derive from the snapshot, not from future arrivals.
        apply(&mut state, PromptKind::Text, "boom");
        state.refresh_projection(&buffer);

        let entries = &state.ui_state.filter_cache.entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "boom");
    }

    #[test]
    fn test_level_filter_projection() {
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());

        apply(&mut state, PromptKind::Level, "E");
        state.refresh_projection(&buffer);

        let entries = &state.ui_state.filter_cache.entries;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "boom");
    }

    #[test]
    fn test_bad_level_spec_keeps_previous_filter() {
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());
        apply(&mut state, PromptKind::Level, "W+");
        let previous = state.filter.level.clone();

        apply(&mut state, PromptKind::Level, "Z");
        assert!(state.ui_state.filter_error.is_some());
        assert_eq!(state.filter.level, previous);
        // Prompt stays open for correction
        assert_eq!(state.ui_state.prompt, Some(PromptKind::Level));

        state.cancel_prompt();
        assert!(state.ui_state.filter_error.is_none());
        assert_eq!(state.filter.level, previous);
        let _ = buffer;
    }

    #[test]
    fn test_pause_freezes_window_while_buffer_grows() {
        let parser = LineParser::new();
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());

        state.toggle_pause(&buffer);
        buffer.append(parser.parse("01-01 00:00:02.000  100  100 W MyTag: late"));

        state.refresh_projection(&buffer);
        assert_eq!(state.ui_state.filter_cache.entries.len(), 2);

        state.toggle_pause(&buffer);
        state.refresh_projection(&buffer);
        assert_eq!(state.ui_state.filter_cache.entries.len(), 3);
    }

    #[test]
    fn test_filter_edit_applies_to_frozen_window() {
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());
        state.toggle_pause(&buffer);

        apply(&mut state, PromptKind::Text, "boom");
        state.refresh_projection(&buffer);
        assert_eq!(state.ui_state.filter_cache.entries.len(), 1);
    }

    #[test]
    fn test_clear_filters_keeps_package() {
        let mut cfg = config();
        cfg.package = Some("com.example.app".to_string());
        let mut state = AppState::new(cfg);
        apply(&mut state, PromptKind::Tag, "MyTag");
        apply(&mut state, PromptKind::Text, "boom");

        state.clear_filters();
        assert!(state.filter.tag.is_none());
        assert!(state.filter.text.is_none());
        assert_eq!(state.filter.package.as_deref(), Some("com.example.app"));
        assert!(state.filter.package_enabled);

        state.clear_all_filters();
        assert!(state.filter.package.is_none());
        assert!(!state.filter.package_enabled);
    }

    #[test]
    fn test_unchanged_filter_projection_is_idempotent() {
        let buffer = seeded_buffer();
        let mut state = AppState::new(config());
        apply(&mut state, PromptKind::Level, "E");

        state.refresh_projection(&buffer);
        let first: Vec<u64> = state
            .ui_state
            .filter_cache
            .entries
            .iter()
            .map(|r| r.seq)
            .collect();

        state.ui_state.filter_cache.is_valid = false;
        state.refresh_projection(&buffer);
        let second: Vec<u64> = state
            .ui_state
            .filter_cache
            .entries
            .iter()
            .map(|r| r.seq)
            .collect();

        assert_eq!(first, second);
    }
}
