use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tui_textarea::TextArea;

use crate::app::Checkbox;

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

pub fn render_modal_frame(
    f: &mut ratatui::Frame,
    title: &str,
    percent_x: u16,
    percent_y: u16,
) -> Rect {
    let area = centered_rect(percent_x, percent_y, f.area());
    f.render_widget(Clear, area);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", title));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

fn label_style(focused: bool) -> Style {
    Style::default().fg(if focused {
        Color::Cyan
    } else {
        Color::DarkGray
    })
}

/// Render a single-line text input with label.
pub fn text_input<'a>(label: &str, value: &'a str, focused: bool, required: bool) -> Line<'a> {
    let cursor = if focused { "_" } else { "" };
    let marker = if required { "*" } else { "" };
    Line::from(vec![
        Span::styled(format!("{}{}: ", label, marker), label_style(focused)),
        Span::styled(
            value,
            Style::default().fg(Color::White).add_modifier(if focused {
                Modifier::BOLD
            } else {
                Modifier::empty()
            }),
        ),
        Span::styled(cursor, Style::default().fg(Color::DarkGray)),
    ])
}

/// Picker lines: the full option list while focused, only the selection otherwise.
pub fn picker_lines(label: &str, options: &[String], selected: usize, focused: bool) -> Vec<Line<'static>> {
    if !focused {
        let current = options.get(selected).cloned().unwrap_or_default();
        return vec![Line::from(vec![
            Span::styled(format!("{}: ", label), label_style(false)),
            Span::styled(current, Style::default().fg(Color::White)),
        ])];
    }

    let mut lines = vec![Line::from(Span::styled(
        format!("{}:", label),
        label_style(true),
    ))];
    for (i, option) in options.iter().enumerate() {
        let prefix = if i == selected { "> " } else { "  " };
        let style = if i == selected {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        lines.push(Line::from(Span::styled(
            format!("  {}{}", prefix, option),
            style,
        )));
    }
    lines
}

pub fn picker_height(option_count: usize, focused: bool) -> u16 {
    if focused {
        u16::try_from(option_count + 1).unwrap_or(u16::MAX)
    } else {
        1
    }
}

pub fn checkbox(label: &str, state: Checkbox, focused: bool) -> Line<'static> {
    let mark = if state.checked { "[x]" } else { "[ ]" };
    let style = if !state.enabled {
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::CROSSED_OUT)
    } else if focused {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    Line::from(Span::styled(format!("{} {}", mark, label), style))
}

/// A button span; `busy_label` replaces the label while its request is in flight.
pub fn button(label: &str, busy_label: &str, busy: bool, focused: bool) -> Span<'static> {
    let text = if busy { busy_label } else { label };
    let style = if busy {
        Style::default().fg(Color::DarkGray)
    } else if focused {
        Style::default()
            .fg(Color::Black)
            .bg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    Span::styled(format!("[ {} ]", text), style)
}

/// Bordered frame for a multi-line editor; returns the inner area.
pub fn editor_frame(f: &mut ratatui::Frame, area: Rect, title: &str, focused: bool) -> Rect {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(label_style(focused))
        .title(format!(" {} ", title));
    let inner = block.inner(area);
    f.render_widget(block, area);
    inner
}

/// Columns left for text once the section and editor borders are drawn.
pub fn editor_text_width(section_width: u16) -> u16 {
    section_width.saturating_sub(4)
}

/// The live editor when focused; otherwise the content wrapped to the frame.
pub fn editor_body(f: &mut ratatui::Frame, area: Rect, editor: &TextArea<'_>, focused: bool) {
    if focused {
        f.render_widget(editor, area);
        return;
    }
    let text = editor.lines().join("\n");
    let body = if text.is_empty() {
        Paragraph::new(Span::styled(
            editor.placeholder_text().to_string(),
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Paragraph::new(text)
    };
    f.render_widget(body.wrap(Wrap { trim: false }), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn unfocused_picker_shows_only_selection() {
        let options = vec!["HI (HGI Informatics)".to_string(), "HB (HGI Bioinformatics)".to_string()];
        let lines = picker_lines("Project", &options, 1, false);
        assert_eq!(lines.len(), 1);
        assert_eq!(text(&lines[0]), "Project: HB (HGI Bioinformatics)");
        assert_eq!(picker_height(options.len(), false), 1);
    }

    #[test]
    fn focused_picker_lists_all_options() {
        let options = vec!["HI".to_string(), "HB".to_string()];
        let lines = picker_lines("Project", &options, 0, true);
        assert_eq!(lines.len(), 3);
        assert_eq!(text(&lines[1]), "  > HI");
        assert_eq!(text(&lines[2]), "    HB");
        assert_eq!(picker_height(options.len(), true), 3);
    }

    #[test]
    fn busy_button_swaps_label() {
        assert_eq!(button("Generate Preview", "Generating...", false, true).content, "[ Generate Preview ]");
        assert_eq!(button("Generate Preview", "Generating...", true, true).content, "[ Generating... ]");
    }

    #[test]
    fn checkbox_mark_follows_state() {
        let on = Checkbox { checked: true, enabled: true };
        let off = Checkbox { checked: false, enabled: false };
        assert_eq!(text(&checkbox("User story", on, false)), "[x] User story");
        assert_eq!(text(&checkbox("Softpack admin", off, false)), "[ ] Softpack admin");
    }
}
