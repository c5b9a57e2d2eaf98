use super::app::App;
use crate::profile::Subject;
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::ops::Range;

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Header line
            Constraint::Length(1), // Divider
            Constraint::Min(0),    // Match list
            Constraint::Length(1), // Search bar
            Constraint::Length(1), // Footer line
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);
    draw_divider(f, chunks[1]);
    draw_matches(f, app, chunks[2]);
    draw_search_bar(f, app, chunks[3]);
    draw_footer(f, app, chunks[4]);

    if app.show_help {
        draw_help(f);
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let file_name = app
        .profile_path
        .as_ref()
        .and_then(|p| std::path::Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("profile");

    let header_text = format!(
        "flame-search: {} | Frames: {} | Spans: {} | Matches: {}",
        file_name,
        app.frame_count,
        app.span_count,
        app.session.results().len(),
    );

    let header = Paragraph::new(header_text).style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );

    f.render_widget(header, area);
}

fn draw_divider(f: &mut Frame, area: Rect) {
    let divider = Block::default()
        .borders(Borders::TOP)
        .border_style(Style::default().fg(Color::DarkGray));

    f.render_widget(divider, area);
}

fn draw_matches(f: &mut Frame, app: &mut App, area: Rect) {
    let visible_height = area.height as usize;
    app.update_visible_height(visible_height);

    let results = app.session.results();
    let ordered = app.session.ordered();
    let selected = app.session.selected_index();

    if ordered.is_empty() {
        let hint = if app.session.query().is_empty() {
            "Press / to search frames and spans"
        } else if app.session.is_scanning() {
            "Searching..."
        } else {
            "No matches"
        };
        let paragraph = Paragraph::new(hint).style(Style::default().fg(Color::DarkGray));
        f.render_widget(paragraph, area);
        return;
    }

    let start = app.scroll_offset.min(ordered.len());
    let end = (start + visible_height).min(ordered.len());

    let base = Style::default();
    let hit = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let items: Vec<ListItem> = ordered[start..end]
        .iter()
        .filter_map(|key| results.get(*key))
        .map(|entry| {
            let subject = &entry.subject;
            let (tag, tag_color) = match subject {
                Subject::Frame(_) => ("frame", Color::Green),
                Subject::Span(_) => ("span ", Color::Magenta),
            };

            let mut spans = vec![
                Span::styled(format!("{} ", tag), Style::default().fg(tag_color)),
                Span::styled(
                    format!("{:>10.3} ", subject.start()),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw("  ".repeat(subject.depth() as usize)),
            ];
            spans.extend(highlighted_spans(subject.text(), &entry.ranges, base, hit));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let list = List::new(items).highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    if let Some(selected) = selected
        && selected >= start
        && selected < end
    {
        state.select(Some(selected - start));
    }

    f.render_stateful_widget(list, area, &mut state);
}

/// Split `text` into runs styled with `hit` inside `ranges` (char indices)
/// and `base` outside them.
pub(crate) fn highlighted_spans(
    text: &str,
    ranges: &[Range<usize>],
    base: Style,
    hit: Style,
) -> Vec<Span<'static>> {
    let chars: Vec<char> = text.chars().collect();
    let mut spans = Vec::new();
    let mut pos = 0;

    for range in ranges {
        let start = range.start.min(chars.len()).max(pos);
        let end = range.end.min(chars.len());
        if start >= end {
            continue;
        }
        if pos < start {
            spans.push(Span::styled(chars[pos..start].iter().collect::<String>(), base));
        }
        spans.push(Span::styled(chars[start..end].iter().collect::<String>(), hit));
        pos = end;
    }

    if pos < chars.len() {
        spans.push(Span::styled(chars[pos..].iter().collect::<String>(), base));
    }
    spans
}

fn draw_search_bar(f: &mut Frame, app: &App, area: Rect) {
    let session = &app.session;
    let cursor = if app.search_active { "█" } else { "" };

    let mut text = format!("Search [{}]: {}{}", session.mode(), app.input, cursor);

    if !session.query().is_empty() {
        text.push_str(&format!("  [{}]", session.counter()));
    }

    if session.is_scanning()
        && let Some(progress) = session.scan_progress()
    {
        let total = progress.total_spans + progress.total_frames;
        let done = progress.processed_spans + progress.processed_frames;
        let percent = if total == 0 { 100 } else { done * 100 / total };
        text.push_str(&format!("  scanning {}%", percent));
    }

    let style = if let Some(error) = session.query_error() {
        text.push_str(&format!("  {}", error));
        Style::default().bg(Color::Red).fg(Color::White)
    } else if app.search_active {
        Style::default().bg(Color::DarkGray).fg(Color::White)
    } else {
        Style::default().fg(Color::Gray)
    };

    let paragraph = Paragraph::new(text).style(style);
    f.render_widget(paragraph, area);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let mut footer_text = String::from("↑↓: Match | /: Search | Esc: Clear | q: Quit | ?: Help");

    if let Some(target) = app.zoom_target.borrow().as_ref() {
        footer_text.push_str(&format!(
            " | Zoom: {} '{}' [{:.3}, {:.3}]",
            target.kind(),
            truncate(target.text(), 40),
            target.start(),
            target.end()
        ));
    }

    let footer = Paragraph::new(footer_text).style(Style::default().fg(Color::DarkGray));
    f.render_widget(footer, area);
}

fn draw_help(f: &mut Frame) {
    let help_text = vec![
        Line::from(Span::styled(
            "flame-search Help",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Matches:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  ↓/j/n       Next match"),
        Line::from("  ↑/k/N       Previous match"),
        Line::from(""),
        Line::from(Span::styled(
            "Search:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  /           Start typing a query"),
        Line::from("  /re/flags   Regular expression query"),
        Line::from("  Ctrl+N/P    Next/previous match while typing"),
        Line::from("  Enter       Keep query, stop typing"),
        Line::from("  Esc         Clear query"),
        Line::from(""),
        Line::from(Span::styled(
            "Other:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )),
        Line::from("  q/Q         Quit"),
        Line::from("  ?           Toggle this help"),
        Line::from("  Ctrl+C      Force quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press ? or Esc to close help",
            Style::default().fg(Color::Yellow),
        )),
    ];

    let help = Paragraph::new(help_text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: true });

    let area = centered_rect(60, 70, f.area());
    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(help, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else {
        let kept: String = chars.iter().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contents(spans: &[Span]) -> Vec<String> {
        spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_highlighted_spans() {
        let base = Style::default();
        let hit = Style::default().fg(Color::Yellow);

        let spans = highlighted_spans("parse_args", &[0..5], base, hit);
        assert_eq!(contents(&spans), vec!["parse", "_args"]);
        assert_eq!(spans[0].style, hit);
        assert_eq!(spans[1].style, base);

        let spans = highlighted_spans("abcabc", &[1..2, 4..6], base, hit);
        assert_eq!(contents(&spans), vec!["a", "b", "ca", "bc"]);
    }

    #[test]
    fn test_highlighted_spans_uses_char_indices() {
        let base = Style::default();
        let hit = Style::default().fg(Color::Yellow);

        let spans = highlighted_spans("déjà vu", &[2..4], base, hit);
        assert_eq!(contents(&spans), vec!["dé", "jà", " vu"]);
    }

    #[test]
    fn test_highlighted_spans_clamps_ranges() {
        let base = Style::default();
        let hit = Style::default().fg(Color::Yellow);

        let spans = highlighted_spans("abc", &[2..10], base, hit);
        assert_eq!(contents(&spans), vec!["ab", "c"]);
        assert!(highlighted_spans("", &[0..1], base, hit).is_empty());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a_very_long_function_name", 10), "a_very_...");
    }
}
