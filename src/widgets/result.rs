use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::ResultPanel;

pub const HEIGHT: u16 = 7;

pub fn lines(panel: &ResultPanel) -> Vec<Line<'static>> {
    match panel {
        ResultPanel::Created(ticket) => vec![
            Line::from(vec![
                Span::styled("JIRA Key: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(ticket.jira_key.clone(), Style::default().fg(Color::Yellow)),
            ]),
            Line::from(vec![
                Span::styled("URL: ", Style::default().add_modifier(Modifier::BOLD)),
                Span::styled(
                    ticket.jira_url.clone(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]),
            Line::from("Your ticket has been created and is ready for review."),
            Line::from(Span::styled(
                "[Ctrl+O] open in browser",
                Style::default().fg(Color::DarkGray),
            )),
        ],
        ResultPanel::Error(message) => vec![
            Line::from(message.clone()),
            Line::from(""),
            Line::from(Span::styled(
                "Please try again or contact support if the problem persists.",
                Style::default().fg(Color::DarkGray),
            )),
        ],
    }
}

pub fn render(f: &mut ratatui::Frame, area: Rect, panel: &ResultPanel) {
    let (title, color) = match panel {
        ResultPanel::Created(_) => (" Ticket Created Successfully ", Color::Green),
        ResultPanel::Error(_) => (" Error ", Color::Red),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(color))
        .title(Span::styled(
            title,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
    let body = Paragraph::new(lines(panel))
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);
}
