use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use super::form;
use crate::app::{App, Field};

pub fn project_options(app: &App) -> Vec<String> {
    app.projects.iter().map(|p| p.label()).collect()
}

fn admin_label(app: &App) -> String {
    if app.softpack_admin.enabled {
        "Softpack admin".to_string()
    } else {
        format!("Softpack admin ({} only)", app.admin_project())
    }
}

/// Rows needed to show the full draft section.
pub fn height(app: &App, width: u16) -> u16 {
    let picker = form::picker_height(app.projects.len(), app.focus == Field::Project);
    // border + username + gap + picker + gap + editor + 2 checkboxes + gap + button + border
    let prompt = app.prompt_height(form::editor_text_width(width));
    1 + 1 + 1 + picker + 1 + prompt + 2 + 1 + 1 + 1
}

pub fn render(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" New Ticket Request ");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let picker_rows = form::picker_height(app.projects.len(), app.focus == Field::Project);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(picker_rows),
            Constraint::Length(1),
            Constraint::Length(app.prompt_height(form::editor_text_width(area.width))),
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    f.render_widget(
        Paragraph::new(form::text_input(
            "Username",
            &app.username,
            app.focus == Field::Username,
            true,
        )),
        rows[0],
    );

    let options = project_options(app);
    f.render_widget(
        Paragraph::new(form::picker_lines(
            "Project",
            &options,
            app.project_idx,
            app.focus == Field::Project,
        )),
        rows[2],
    );

    let prompt_focused = app.focus == Field::Prompt;
    let prompt_inner = form::editor_frame(f, rows[4], "Request*", prompt_focused);
    form::editor_body(f, prompt_inner, &app.prompt, prompt_focused);

    let admin_label = admin_label(app);
    let checkboxes = vec![
        form::checkbox(&admin_label, app.softpack_admin, app.focus == Field::SoftpackAdmin),
        form::checkbox(
            "User story (Connextra format)",
            app.user_story,
            app.focus == Field::UserStory,
        ),
    ];
    f.render_widget(Paragraph::new(checkboxes), rows[5]);

    f.render_widget(
        Paragraph::new(Line::from(form::button(
            "Generate Preview",
            "Generating...",
            app.generating,
            app.focus == Field::Generate,
        ))),
        rows[7],
    );
}

/// One-line recap shown while the preview is scrolled to the top.
pub fn render_compact(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let (user, project, prompt) = match app.current_draft() {
        Some(d) => (d.username.clone(), d.project.clone(), d.prompt.clone()),
        None => (String::new(), String::new(), String::new()),
    };
    let prompt_line = prompt.lines().next().unwrap_or_default().to_string();
    let line = Line::from(vec![
        Span::styled("Request: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} · {} · ", user, project)),
        Span::styled(prompt_line, Style::default().fg(Color::Gray)),
        Span::styled("  (Ctrl+E to edit)", Style::default().fg(Color::DarkGray)),
    ]);
    f.render_widget(Paragraph::new(line), area);
}
