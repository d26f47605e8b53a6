mod api_client;
mod app;
mod config;
mod logging;
mod setup;
mod ticket;
mod widgets;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

use crate::api_client::{ApiError, HealthStatus, TicketClient};
use crate::app::{App, Field, HealthState, Section};
use crate::config::{AppConfig, Overrides};
use crate::ticket::{CreatedTicket, Draft, PreviewContent, TicketRequest};

/// Draft JIRA tickets with an AI-generated summary and description.
#[derive(Debug, Parser)]
#[command(name = "jirato", version, about)]
struct Cli {
    /// Base URL of the ticket generation server (overrides config and JIRATO_SERVER_URL).
    #[arg(long)]
    server: Option<String>,
    /// Prefill the username field.
    #[arg(long)]
    username: Option<String>,
    /// Preselect a project code, e.g. HB.
    #[arg(long)]
    project: Option<String>,
    /// Re-run the first-time setup wizard.
    #[arg(long)]
    setup: bool,
}

enum BackgroundMessage {
    PreviewGenerated(std::result::Result<PreviewContent, ApiError>),
    TicketCreated(std::result::Result<CreatedTicket, ApiError>),
    HealthChecked(std::result::Result<HealthStatus, ApiError>),
}

fn spawn_preview(tx: &UnboundedSender<BackgroundMessage>, client: &TicketClient, draft: Draft) {
    let tx = tx.clone();
    let client = client.clone();
    tokio::spawn(async move {
        let result = client.preview_ticket(&draft).await;
        let _ = tx.send(BackgroundMessage::PreviewGenerated(result));
    });
}

fn spawn_create(tx: &UnboundedSender<BackgroundMessage>, client: &TicketClient, ticket: TicketRequest) {
    let tx = tx.clone();
    let client = client.clone();
    tokio::spawn(async move {
        let result = client.create_ticket(&ticket).await;
        let _ = tx.send(BackgroundMessage::TicketCreated(result));
    });
}

fn spawn_health_check(tx: &UnboundedSender<BackgroundMessage>, client: &TicketClient) {
    let tx = tx.clone();
    let client = client.clone();
    tokio::spawn(async move {
        let result = client.health().await;
        let _ = tx.send(BackgroundMessage::HealthChecked(result));
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let _log_guard = match config::config_dir().and_then(|dir| logging::setup_logging(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {:#}", e);
            None
        }
    };

    let overrides = Overrides::from_env().merge(Overrides {
        server_url: cli.server.clone(),
        username: cli.username.clone(),
    });
    let loaded = config::load_config()?;
    let needs_setup = cli.setup || (loaded.is_none() && overrides.server_url.is_none());

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &cli, loaded, overrides, needs_setup).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        let message = format!("{:#}", e);
        tracing::error!(error = %message, "jirato exited with an error");
    }
    result
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    cli: &Cli,
    loaded: Option<AppConfig>,
    overrides: Overrides,
    needs_setup: bool,
) -> Result<()> {
    let mut config = loaded.unwrap_or_default();
    if needs_setup {
        match setup::run_setup(terminal, &config)? {
            Some(saved) => config = saved,
            None => return Ok(()),
        }
    }
    config.apply(&overrides);

    let mut app = App::new(&config);
    if let Some(code) = cli.project.as_deref() {
        match config.project_index(code) {
            Some(idx) => app.set_home_project(idx),
            None => app.flash = Some(format!("Unknown project {}", code)),
        }
    }

    let client = TicketClient::new(&config.server.base_url);
    tracing::info!(server = %client.base_url(), projects = config.projects.len(), "Starting jirato");

    let (bg_tx, mut bg_rx) = tokio::sync::mpsc::unbounded_channel();
    spawn_health_check(&bg_tx, &client);

    // Main loop
    loop {
        while let Ok(message) = bg_rx.try_recv() {
            match message {
                BackgroundMessage::PreviewGenerated(result) => {
                    app.finish_preview(result, Instant::now());
                }
                BackgroundMessage::TicketCreated(result) => app.finish_commit(result),
                BackgroundMessage::HealthChecked(result) => {
                    match &result {
                        Ok(status) => tracing::info!(
                            status = %status.status,
                            host = ?status.ollama_host,
                            model = ?status.default_model,
                            available = status.model_available,
                            "Health check"
                        ),
                        Err(e) => tracing::warn!(error = %e, "Health check failed"),
                    }
                    app.set_health(result);
                }
            }
        }

        app.tick(Instant::now());
        terminal.draw(|f| ui(f, &app, client.base_url()))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                // Clear flash on any keypress
                app.flash = None;

                if app.show_keybindings {
                    handle_keybindings_keys(&mut app, key.code);
                } else {
                    handle_form_keys(&mut app, key, &bg_tx, &client);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn request_preview(app: &mut App, bg_tx: &UnboundedSender<BackgroundMessage>, client: &TicketClient) {
    // Disabled while a preview is already being generated.
    if app.generating {
        return;
    }
    if let Ok(draft) = app.submit_for_preview() {
        tracing::info!(project = %draft.project, user_story = draft.user_story, "Requesting preview");
        spawn_preview(bg_tx, client, draft);
    }
}

fn request_create(app: &mut App, bg_tx: &UnboundedSender<BackgroundMessage>, client: &TicketClient) {
    if app.creating || !app.preview_visible {
        return;
    }
    if let Ok(ticket) = app.commit_ticket() {
        tracing::info!(project = %ticket.project, "Creating ticket");
        spawn_create(bg_tx, client, ticket);
    }
}

/// Launch `opener url` and reap it in the background once it exits.
fn spawn_opener(
    opener: &str,
    url: &str,
) -> io::Result<tokio::task::JoinHandle<io::Result<std::process::ExitStatus>>> {
    let mut child = tokio::process::Command::new(opener).arg(url).spawn()?;
    let opener = opener.to_string();
    Ok(tokio::spawn(async move {
        let status = child.wait().await;
        match &status {
            Ok(code) if !code.success() => tracing::warn!(%opener, %code, "Browser opener exited with failure"),
            Err(e) => tracing::warn!(%opener, error = %e, "Failed to wait for browser opener"),
            _ => {}
        }
        status
    }))
}

fn open_created_ticket(app: &mut App) {
    let Some(url) = app.created_ticket_url().map(str::to_string) else {
        return;
    };
    let opener = if cfg!(target_os = "macos") { "open" } else { "xdg-open" };
    match spawn_opener(opener, &url) {
        Ok(_) => app.flash = Some(format!("Opened {}", url)),
        Err(e) => {
            tracing::warn!(error = %e, %url, "Failed to open browser");
            app.flash = Some(format!("Could not open browser: {}", e));
        }
    }
}

fn handle_keybindings_keys(app: &mut App, key: KeyCode) {
    match key {
        KeyCode::Esc | KeyCode::F(1) => app.close_keybindings(),
        _ => {}
    }
}

fn handle_form_keys(
    app: &mut App,
    key: KeyEvent,
    bg_tx: &UnboundedSender<BackgroundMessage>,
    client: &TicketClient,
) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => app.should_quit = true,
        KeyCode::F(1) => app.toggle_keybindings(),
        KeyCode::Char('g') if ctrl => request_preview(app, bg_tx, client),
        KeyCode::Char('s') if ctrl => request_create(app, bg_tx, client),
        KeyCode::Char('e') if ctrl && app.preview_visible => app.discard_preview(),
        KeyCode::Tab => app.focus_next(),
        KeyCode::BackTab => app.focus_prev(),
        KeyCode::Char('o') if ctrl => open_created_ticket(app),
        _ => handle_field_keys(app, key, bg_tx, client),
    }
}

fn handle_field_keys(
    app: &mut App,
    key: KeyEvent,
    bg_tx: &UnboundedSender<BackgroundMessage>,
    client: &TicketClient,
) {
    match app.focus {
        Field::Project => match key.code {
            KeyCode::Char('k') | KeyCode::Up | KeyCode::Left => app.prev_project(),
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Right => app.next_project(),
            KeyCode::Enter => app.focus_next(),
            _ => {}
        },
        Field::SoftpackAdmin | Field::UserStory => {
            if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                app.toggle_focused_checkbox();
            }
        }
        Field::Generate => {
            if key.code == KeyCode::Enter {
                request_preview(app, bg_tx, client);
            }
        }
        Field::EditRequest => {
            if key.code == KeyCode::Enter {
                app.discard_preview();
            }
        }
        Field::CreateTicket => {
            if key.code == KeyCode::Enter {
                request_create(app, bg_tx, client);
            }
        }
        // Enter in the single-line username submits, like a plain form.
        Field::Username if key.code == KeyCode::Enter => request_preview(app, bg_tx, client),
        Field::Summary if key.code == KeyCode::Enter => app.focus_next(),
        Field::Username | Field::Summary | Field::Prompt | Field::Description => {
            app.edit_focused(key);
        }
    }
}

fn health_span(app: &App) -> ratatui::text::Span<'static> {
    use ratatui::style::{Color, Style};
    use ratatui::text::Span;

    match &app.health {
        HealthState::Checking => Span::styled(" server: checking ", Style::default().fg(Color::DarkGray)),
        HealthState::Reported(status) if status.is_ready() => Span::styled(
            format!(
                " model: {} ready ",
                status.default_model.as_deref().unwrap_or("default")
            ),
            Style::default().fg(Color::Green),
        ),
        HealthState::Reported(status) => Span::styled(
            format!(
                " model unavailable{} ",
                status
                    .error
                    .as_deref()
                    .map(|e| format!(": {}", e))
                    .unwrap_or_default()
            ),
            Style::default().fg(Color::Yellow),
        ),
        HealthState::Unreachable(reason) => Span::styled(
            format!(" server unreachable: {} ", reason),
            Style::default().fg(Color::Red),
        ),
    }
}

fn ui(f: &mut ratatui::Frame, app: &App, server: &str) {
    use ratatui::layout::{Constraint, Direction, Layout};
    use ratatui::style::{Color, Modifier, Style};
    use ratatui::text::{Line, Span};
    use ratatui::widgets::{Block, Borders, Paragraph};

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Form
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            "AI-assisted JIRA tickets",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", server), Style::default().fg(Color::DarkGray)),
    ]))
    .block(Block::default().borders(Borders::ALL).title(" jirato "));
    f.render_widget(title, chunks[0]);

    #[derive(Clone, Copy)]
    enum Part {
        Draft,
        CompactDraft,
        Preview,
        Result,
    }

    let mut parts: Vec<(Part, u16)> = Vec::new();
    if app.preview_visible && app.scroll_anchor == Section::Preview {
        parts.push((Part::CompactDraft, 1));
    } else {
        parts.push((Part::Draft, widgets::draft_form::height(app, chunks[1].width)));
    }
    if app.preview_visible {
        parts.push((Part::Preview, widgets::preview::height(app, chunks[1].width)));
    }
    if app.result.is_some() {
        parts.push((Part::Result, widgets::result::HEIGHT));
    }

    let mut constraints: Vec<Constraint> = parts.iter().map(|(_, h)| Constraint::Length(*h)).collect();
    constraints.push(Constraint::Min(0));
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(chunks[1]);

    for (i, (part, _)) in parts.iter().enumerate() {
        match part {
            Part::Draft => widgets::draft_form::render(f, areas[i], app),
            Part::CompactDraft => widgets::draft_form::render_compact(f, areas[i], app),
            Part::Preview => widgets::preview::render(f, areas[i], app),
            Part::Result => {
                if let Some(panel) = &app.result {
                    widgets::result::render(f, areas[i], panel);
                }
            }
        }
    }

    // Status bar
    let status = if let Some(ref flash) = app.flash {
        Line::from(Span::styled(flash.as_str(), Style::default().fg(Color::Red)))
    } else {
        let hints = if app.preview_visible {
            " Tab: next  Ctrl+S: create  Ctrl+E: edit request  F1: keys  Ctrl+C: quit "
        } else {
            " Tab: next  Ctrl+G: generate  F1: keys  Ctrl+C: quit "
        };
        Line::from(vec![
            health_span(app),
            Span::styled(hints, Style::default().fg(Color::DarkGray)),
        ])
    };
    f.render_widget(Paragraph::new(status), chunks[2]);

    if app.show_keybindings {
        widgets::keybindings_help::render(f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn harness() -> (App, UnboundedSender<BackgroundMessage>, UnboundedReceiver<BackgroundMessage>, TicketClient) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        // Nothing listens on the discard port; spawned requests just fail.
        let client = TicketClient::new("http://127.0.0.1:9");
        (App::new(&AppConfig::default()), tx, rx, client)
    }

    fn fill(app: &mut App) {
        app.username = "jdoe".to_string();
        app.prompt.insert_str("install samtools");
    }

    #[tokio::test]
    async fn unhandled_control_chords_do_not_type_into_fields() {
        let (mut app, tx, _rx, client) = harness();
        app.set_focus(Field::Username);
        handle_form_keys(&mut app, ctrl('e'), &tx, &client);
        handle_form_keys(&mut app, ctrl('a'), &tx, &client);
        assert_eq!(app.username, "");

        fill(&mut app);
        app.submit_for_preview().expect("valid draft");
        app.finish_preview(
            Ok(PreviewContent {
                summary: "Fix".to_string(),
                description: "Details".to_string(),
            }),
            Instant::now(),
        );
        app.set_focus(Field::Summary);
        handle_form_keys(&mut app, ctrl('w'), &tx, &client);
        assert_eq!(app.summary, "Fix");
    }

    #[tokio::test]
    async fn second_generate_while_busy_is_ignored() {
        let (mut app, tx, _rx, client) = harness();
        fill(&mut app);

        request_preview(&mut app, &tx, &client);
        assert!(app.generating);

        // Would fail validation if it reached the controller again.
        app.username.clear();
        handle_form_keys(&mut app, ctrl('g'), &tx, &client);

        assert!(app.generating);
        assert!(app.result.is_none());
        assert_eq!(app.current_draft().map(|d| d.username.as_str()), Some("jdoe"));
    }

    #[tokio::test]
    async fn second_create_while_busy_is_ignored() {
        let (mut app, tx, _rx, client) = harness();
        fill(&mut app);
        app.submit_for_preview().expect("valid draft");
        app.finish_preview(
            Ok(PreviewContent {
                summary: "Install samtools".to_string(),
                description: "Install samtools 1.19.".to_string(),
            }),
            Instant::now(),
        );

        request_create(&mut app, &tx, &client);
        assert!(app.creating);

        app.summary = "a".repeat(101);
        handle_form_keys(&mut app, ctrl('s'), &tx, &client);

        assert!(app.creating);
        assert!(app.result.is_none());
    }

    #[tokio::test]
    async fn create_is_ignored_without_a_preview() {
        let (mut app, tx, _rx, client) = harness();
        fill(&mut app);
        app.summary = "x".to_string();

        request_create(&mut app, &tx, &client);

        assert!(!app.creating);
        assert!(app.result.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn browser_opener_is_reaped() {
        let handle = spawn_opener("true", "https://jira.sanger.ac.uk/browse/HI-1").expect("spawn");
        let status = handle.await.expect("join").expect("wait");
        assert!(status.success());
    }
}
