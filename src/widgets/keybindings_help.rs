use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use super::form;

fn heading(text: &'static str) -> Line<'static> {
    Line::from(Span::styled(
        text,
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    ))
}

pub fn render(f: &mut ratatui::Frame) {
    let inner = form::render_modal_frame(f, "Keybindings", 64, 66);

    let lines = vec![
        heading("Navigation"),
        Line::from("  Tab / Shift+Tab: next / previous field"),
        Line::from("  Up / Down or j / k (on Project): choose project"),
        Line::from("  Space (on a checkbox): toggle"),
        Line::from("  Enter (on a button): activate"),
        Line::from(""),
        heading("Request"),
        Line::from("  Ctrl+G: generate preview"),
        Line::from("  Enter in Request / Description: new line"),
        Line::from(""),
        heading("Preview"),
        Line::from("  Ctrl+S: create ticket"),
        Line::from("  Ctrl+E: discard preview and edit request"),
        Line::from("  Ctrl+O (after creation): open ticket in browser"),
        Line::from(""),
        heading("General"),
        Line::from("  F1: toggle this help"),
        Line::from("  Ctrl+C or Ctrl+Q: quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press F1 or Esc to close",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let body = Paragraph::new(lines).block(Block::default());
    f.render_widget(body, inner);
}
