use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::UnicodeWidthChar;

use droidscope_logs::LogBuffer;
use droidscope_types::{LogLevel, LogRecord, ParseStatus};

use crate::app::{AppState, TailStatus};
use crate::ui::Theme;

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, buffer: &LogBuffer) {
        let area = frame.area();

        let show_filter_bar = state.ui_state.prompt.is_some()
            || state.filter.is_active()
            || state.ui_state.filter_error.is_some();

        let mut constraints = vec![Constraint::Length(3)]; // Header always
        if show_filter_bar {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1)); // Logs
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 0;
        Self::render_header(frame, chunks[idx], state);
        idx += 1;

        if show_filter_bar {
            Self::render_filter_bar(frame, chunks[idx], state);
            idx += 1;
        }

        Self::render_logs(frame, chunks[idx], state, buffer);
        idx += 1;

        Self::render_status_bar(frame, chunks[idx], state, buffer);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState) {
        let file_name = state
            .config
            .log_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| state.config.log_path.display().to_string());

        let package = state.filter.package.as_deref().unwrap_or("-");
        let package_style = if state.filter.package_enabled && state.filter.package.is_some() {
            Theme::text_highlight()
        } else {
            Theme::text_dim()
        };

        let mut title = vec![
            Span::styled("droidscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(file_name, Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("pkg {}", package), package_style),
            Span::styled(" │ ", Theme::text_dim()),
        ];
        match &state.tail_status {
            TailStatus::Following => {
                title.push(Span::styled(
                    "LIVE",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ));
            }
            TailStatus::Frozen(_) => {
                title.push(Span::styled(
                    "SOURCE ENDED",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ));
            }
        }

        let header = Paragraph::new(Line::from(title)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let mut spans = vec![];

        if let Some(kind) = state.ui_state.prompt {
            spans.push(Span::styled(
                format!(" {}: ", kind.label()),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::styled(
                state.ui_state.prompt_input.clone(),
                Theme::text_highlight(),
            ));
            spans.push(Span::styled(
                "█",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::SLOW_BLINK),
            ));
            spans.push(Span::styled(
                format!("  ({})", kind.hint()),
                Theme::text_dim(),
            ));
            spans.push(Span::styled(
                "  [Enter] Apply  [Esc] Cancel",
                Theme::text_dim(),
            ));
        } else {
            spans.push(Span::styled(" Filter: ", Theme::text_dim()));
            spans.push(Span::styled(state.filter.summary(), Theme::text_highlight()));
            spans.push(Span::styled("  [c] Clear  [C] Clear all", Theme::text_dim()));
        }

        if let Some(err) = &state.ui_state.filter_error {
            spans.push(Span::styled(format!("  ⚠ {}", err), Theme::error()));
        }

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(if state.ui_state.prompt.is_some() {
                    Theme::border_focused()
                } else if state.ui_state.filter_error.is_some() {
                    Style::default().fg(Color::Red)
                } else {
                    Theme::border()
                })
                .title(Span::styled(" Filter ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, buffer: &LogBuffer) {
        state.refresh_projection(buffer);

        let total = state.ui_state.filter_cache.entries.len();
        let inner_height = area.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(inner_height);

        // Follow mode pins the window to the newest record
        if state.ui_state.follow {
            state.ui_state.scroll = max_scroll;
        }
        if state.ui_state.scroll > max_scroll {
            state.ui_state.scroll = max_scroll;
        }

        // Borders plus scrollbar gutter
        let inner_width = area.width.saturating_sub(4) as usize;

        let lines: Vec<Line> = state
            .ui_state
            .filter_cache
            .entries
            .iter()
            .skip(state.ui_state.scroll)
            .take(inner_height)
            .map(|record| format_record_line(record, inner_width))
            .collect();

        let mut title = if state.filter.is_active() {
            format!(" Logs ({} matching) ", total)
        } else {
            format!(" Logs ({}) ", total)
        };
        if state.ui_state.paused {
            title.push_str("⏸ ");
        }

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));

            let mut scrollbar_state = ScrollbarState::default()
                .content_length(max_scroll)
                .position(state.ui_state.scroll.min(max_scroll));

            frame.render_stateful_widget(
                scrollbar,
                area.inner(ratatui::layout::Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, buffer: &LogBuffer) {
        let counts = buffer.level_counts();

        let mut spans = vec![
            Span::styled(" ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("Space", Theme::status_bar_key()),
            Span::styled("]Pause ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("/", Theme::status_bar_key()),
            Span::styled("]Text ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("t", Theme::status_bar_key()),
            Span::styled("]Tag ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("l", Theme::status_bar_key()),
            Span::styled("]Level ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("p", Theme::status_bar_key()),
            Span::styled("]Pkg ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("?", Theme::status_bar_key()),
            Span::styled("]Help ", Theme::status_bar()),
            Span::styled("[", Theme::status_bar()),
            Span::styled("q", Theme::status_bar_key()),
            Span::styled("]Quit", Theme::status_bar()),
        ];

        if state.ui_state.paused {
            spans.push(Span::styled(" ", Theme::status_bar()));
            spans.push(Span::styled(
                "PAUSED",
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ));
        }
        if let TailStatus::Frozen(reason) = &state.tail_status {
            spans.push(Span::styled(" ", Theme::status_bar()));
            spans.push(Span::styled(
                format!("ENDED: {}", reason),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        }

        let right_text = format!(
            "E:{} W:{} I:{} | {} logs {}",
            counts.error + counts.fatal,
            counts.warn,
            counts.info,
            buffer.len(),
            if state.ui_state.follow { "▼" } else { " " }
        );

        let left_width: usize = spans.iter().map(|s| s.content.len()).sum();
        let padding = (area.width as usize).saturating_sub(left_width + right_text.len() + 1);

        spans.push(Span::styled(" ".repeat(padding), Theme::status_bar()));
        spans.push(Span::styled(right_text, Theme::status_bar()));

        let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());

        frame.render_widget(status, area);
    }
}

/// Format one record as a display line with level-based coloring
fn format_record_line(record: &LogRecord, available_width: usize) -> Line<'static> {
    if record.status == ParseStatus::Unparsed {
        // Raw fallback so malformed lines stay visible
        let (text, _) = truncate_to_width(&record.raw, available_width);
        return Line::from(Span::styled(text, Theme::text_dim()));
    }

    let mut spans = Vec::new();
    let mut used = 0usize;

    if let Some(ts) = &record.timestamp {
        spans.push(Span::styled(
            format!("{} ", ts.format("%H:%M:%S%.3f")),
            Theme::text_dim(),
        ));
        used += 13;
    }

    spans.push(Span::styled(
        format!(
            "{:>5} {:>5} ",
            record.pid.map(|p| p.to_string()).unwrap_or_default(),
            record.tid.map(|t| t.to_string()).unwrap_or_default(),
        ),
        Theme::text_dim(),
    ));
    used += 12;

    spans.push(Span::styled(
        format!("{} ", record.level.as_str()),
        Style::default()
            .fg(record.level.color())
            .add_modifier(Modifier::BOLD),
    ));
    used += 2;

    if !record.tag.is_empty() {
        spans.push(Span::styled(
            record.tag.clone(),
            Style::default().fg(tag_color(&record.tag)),
        ));
        spans.push(Span::styled(": ", Theme::text_dim()));
        used += record.tag.chars().count() + 2;
    }

    let remaining = available_width.saturating_sub(used);
    let (message, truncated) = truncate_to_width(&record.message, remaining);
    spans.push(Span::styled(message, level_text_style(record.level)));
    if truncated {
        spans.push(Span::styled("…", Theme::text_dim()));
    }

    Line::from(spans)
}

/// Get text style based on log level
fn level_text_style(level: LogLevel) -> Style {
    match level {
        LogLevel::Error | LogLevel::Fatal => Style::default().fg(Color::Red),
        LogLevel::Warn => Style::default().fg(Color::Yellow),
        _ => Style::default().fg(Color::White),
    }
}

/// Get a consistent color for a tag
fn tag_color(tag: &str) -> Color {
    let hash: u32 = tag.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));

    let colors = [
        Color::Cyan,
        Color::Magenta,
        Color::Blue,
        Color::Yellow,
        Color::Green,
        Color::LightCyan,
        Color::LightMagenta,
        Color::LightBlue,
    ];

    colors[(hash as usize) % colors.len()]
}

/// Truncate a string to a maximum display width (not bytes), returning
/// whether anything was cut off
fn truncate_to_width(s: &str, max_width: usize) -> (String, bool) {
    let mut width = 0;
    for (idx, c) in s.char_indices() {
        let w = c.width().unwrap_or(0);
        if width + w > max_width {
            return (s[..idx].to_string(), true);
        }
        width += w;
    }
    (s.to_string(), false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_display_width() {
        let (text, cut) = truncate_to_width("hello world", 5);
        assert_eq!(text, "hello");
        assert!(cut);

        let (text, cut) = truncate_to_width("short", 20);
        assert_eq!(text, "short");
        assert!(!cut);
    }

    #[test]
    fn test_truncate_handles_wide_chars() {
        // Each CJK character is two columns wide
        let (text, cut) = truncate_to_width("ログビューア", 4);
        assert_eq!(text, "ログ");
        assert!(cut);
    }

    #[test]
    fn test_unparsed_record_renders_raw() {
        let record = LogRecord::unparsed("--------- beginning of main".to_string());
        let line = format_record_line(&record, 80);
        let rendered: String = line.spans.iter().map(|s| s.content.clone()).collect();
        assert_eq!(rendered, "--------- beginning of main");
    }

    #[test]
    fn test_level_styles_distinguish_severity() {
        assert_ne!(
            level_text_style(LogLevel::Error),
            level_text_style(LogLevel::Info)
        );
        assert_ne!(
            level_text_style(LogLevel::Warn),
            level_text_style(LogLevel::Debug)
        );
    }
}
