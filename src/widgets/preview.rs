use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::form;
use crate::app::{App, Field};
use crate::ticket::CounterState;

fn counter_style(state: CounterState) -> Style {
    match state {
        CounterState::Normal => Style::default().fg(Color::DarkGray),
        CounterState::Warning => Style::default().fg(Color::Yellow),
        CounterState::Error => Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    }
}

pub fn height(app: &App, width: u16) -> u16 {
    let description = app.description_height(form::editor_text_width(width));
    // border + summary + counter + gap + editor + gap + buttons + border
    1 + 1 + 1 + 1 + description + 1 + 1 + 1
}

pub fn render(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Magenta))
        .title(" Generated Preview ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(app.description_height(form::editor_text_width(area.width))),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(form::text_input(
            "Summary",
            &app.summary,
            app.focus == Field::Summary,
            true,
        )),
        rows[0],
    );

    let counter = app.summary_counter();
    f.render_widget(
        Paragraph::new(Line::from(Span::styled(
            format!("  {}", counter.text()),
            counter_style(counter.state()),
        ))),
        rows[1],
    );

    let description_focused = app.focus == Field::Description;
    let description_inner =
        form::editor_frame(f, rows[3], "Description*", description_focused);
    form::editor_body(f, description_inner, &app.description, description_focused);

    let buttons = Line::from(vec![
        form::button(
            "Edit Request",
            "Edit Request",
            false,
            app.focus == Field::EditRequest,
        ),
        Span::raw("  "),
        form::button(
            "Create JIRA Ticket",
            "Creating...",
            app.creating,
            app.focus == Field::CreateTicket,
        ),
    ]);
    f.render_widget(Paragraph::new(buttons), rows[5]);
}
