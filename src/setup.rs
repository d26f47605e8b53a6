use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Terminal;
use std::io;
use std::time::Duration;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SetupStep {
    ServerUrl,
    Username,
    Confirm,
}

struct SetupState {
    step: SetupStep,
    server_url: String,
    username: String,
    cancelled: bool,
}

fn looks_like_url(s: &str) -> bool {
    let s = s.trim();
    (s.starts_with("http://") || s.starts_with("https://")) && s.len() > "https://".len()
}

impl SetupState {
    fn new(base: &AppConfig) -> Self {
        Self {
            step: SetupStep::ServerUrl,
            server_url: base.server.base_url.clone(),
            username: base.form.default_username.clone(),
            cancelled: false,
        }
    }

    /// Returns true once the user has confirmed.
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.cancelled = true;
            return false;
        }
        match self.step {
            SetupStep::ServerUrl => match key.code {
                KeyCode::Enter if looks_like_url(&self.server_url) => {
                    self.step = SetupStep::Username;
                }
                KeyCode::Char(c) if !c.is_whitespace() => self.server_url.push(c),
                KeyCode::Backspace => {
                    self.server_url.pop();
                }
                _ => {}
            },
            SetupStep::Username => match key.code {
                // Username is optional; it only prefills the form.
                KeyCode::Enter => self.step = SetupStep::Confirm,
                KeyCode::Esc => self.step = SetupStep::ServerUrl,
                KeyCode::Char(c) if !c.is_whitespace() => self.username.push(c),
                KeyCode::Backspace => {
                    self.username.pop();
                }
                _ => {}
            },
            SetupStep::Confirm => match key.code {
                KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => return true,
                KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                    self.step = SetupStep::ServerUrl;
                }
                _ => {}
            },
        }
        false
    }

    fn build_config(&self, base: &AppConfig) -> AppConfig {
        let mut config = base.clone();
        config.server.base_url = self.server_url.trim().trim_end_matches('/').to_string();
        config.form.default_username = self.username.trim().to_string();
        config
    }
}

/// Interactive first-run setup. Returns `Ok(None)` if the user cancels.
pub fn run_setup(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    base: &AppConfig,
) -> Result<Option<AppConfig>> {
    let mut state = SetupState::new(base);

    loop {
        terminal.draw(|f| render_setup(f, &state))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if state.handle_key(key) {
                    let config = state.build_config(base);
                    crate::config::save_config(&config)?;
                    return Ok(Some(config));
                }
                if state.cancelled {
                    tracing::info!("Setup cancelled");
                    return Ok(None);
                }
            }
        }
    }
}

fn input_line<'a>(label: &'a str, value: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::Cyan)),
        Span::styled(
            value,
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled("_", Style::default().fg(Color::DarkGray)),
    ])
}

fn hint(text: &str) -> Line<'_> {
    Line::from(Span::styled(text, Style::default().fg(Color::DarkGray)))
}

fn render_setup(f: &mut ratatui::Frame, state: &SetupState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(f.area());

    let title = Paragraph::new(" jirato - First-Time Setup ")
        .block(Block::default().borders(Borders::ALL))
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    f.render_widget(title, chunks[0]);

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "Welcome! Point jirato at your ticket generation server.",
            Style::default().fg(Color::White),
        )),
        Line::from(""),
    ];

    match state.step {
        SetupStep::ServerUrl => {
            lines.push(input_line("Server URL: ", &state.server_url));
            lines.push(Line::from(""));
            lines.push(hint("  (e.g., http://127.0.0.1:8000)  Press Enter to continue."));
        }
        SetupStep::Username => {
            lines.push(Line::from(vec![
                Span::styled("Server: ", Style::default().fg(Color::DarkGray)),
                Span::raw(state.server_url.as_str()),
            ]));
            lines.push(Line::from(""));
            lines.push(input_line("Default username (optional): ", &state.username));
            lines.push(Line::from(""));
            lines.push(hint("  Press Enter to continue, Esc to go back."));
        }
        SetupStep::Confirm => {
            lines.push(Line::from(Span::styled(
                "Configuration Summary:",
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Server:     ", Style::default().fg(Color::DarkGray)),
                Span::raw(state.server_url.as_str()),
            ]));
            let username = if state.username.is_empty() {
                "(none)"
            } else {
                state.username.as_str()
            };
            lines.push(Line::from(vec![
                Span::styled("  Username:   ", Style::default().fg(Color::DarkGray)),
                Span::raw(username),
            ]));
            lines.push(Line::from(""));

            let path_str = match crate::config::config_path() {
                Ok(p) => p.display().to_string(),
                Err(_) => "~/.config/jirato/config.toml".to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled("  Config:     ", Style::default().fg(Color::DarkGray)),
                Span::raw(path_str),
            ]));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Press Enter or y to save.  Esc or n to start over.",
                Style::default().fg(Color::Yellow),
            )));
        }
    }

    let body = Paragraph::new(lines).block(Block::default().borders(Borders::ALL));
    f.render_widget(body, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn type_str(state: &mut SetupState, s: &str) {
        for c in s.chars() {
            state.handle_key(key(KeyCode::Char(c)));
        }
    }

    #[test]
    fn walks_through_steps_and_builds_config() {
        let base = AppConfig::default();
        let mut state = SetupState::new(&base);
        state.server_url.clear();

        type_str(&mut state, "http://tickets:8000/");
        assert!(!state.handle_key(key(KeyCode::Enter)));
        assert_eq!(state.step, SetupStep::Username);

        type_str(&mut state, "jdoe");
        assert!(!state.handle_key(key(KeyCode::Enter)));
        assert_eq!(state.step, SetupStep::Confirm);
        assert!(state.handle_key(key(KeyCode::Char('y'))));

        let config = state.build_config(&base);
        assert_eq!(config.server.base_url, "http://tickets:8000");
        assert_eq!(config.form.default_username, "jdoe");
        assert_eq!(config.projects, base.projects);
    }

    #[test]
    fn invalid_url_does_not_advance() {
        let mut state = SetupState::new(&AppConfig::default());
        state.server_url = "tickets".to_string();
        state.handle_key(key(KeyCode::Enter));
        assert_eq!(state.step, SetupStep::ServerUrl);
    }

    #[test]
    fn ctrl_c_cancels() {
        let mut state = SetupState::new(&AppConfig::default());
        assert!(!state.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(state.cancelled);
    }
}
