use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Paragraph, Wrap};
use thiserror::Error;
use tui_textarea::TextArea;

use crate::api_client::{ApiError, HealthStatus};
use crate::config::AppConfig;
use crate::ticket::{CharCounter, CreatedTicket, Draft, PreviewContent, Project, TicketRequest, SUMMARY_MAX_CHARS};

/// Delay before focusing the summary, so the preview has settled on screen first.
pub const FOCUS_SETTLE_DELAY: Duration = Duration::from_millis(300);

const PROMPT_PLACEHOLDER: &str = "Describe what you need, e.g. \"Install samtools 1.19 in softpack\"";
const DESCRIPTION_PLACEHOLDER: &str = "Ticket description";
const EDITOR_MIN_ROWS: u16 = 3;

/// Local validation failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please fill in all required fields.")]
    MissingRequired,
    #[error("Please ensure both summary and description are filled.")]
    MissingPreview,
    #[error("Summary must be {max} characters or less.", max = SUMMARY_MAX_CHARS)]
    SummaryTooLong,
    #[error("Nothing to submit yet. Generate a preview first.")]
    NoDraft,
}

/// Focusable form elements, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Project,
    Prompt,
    SoftpackAdmin,
    UserStory,
    Generate,
    Summary,
    Description,
    EditRequest,
    CreateTicket,
}

const DRAFT_FIELDS: &[Field] = &[
    Field::Username,
    Field::Project,
    Field::Prompt,
    Field::SoftpackAdmin,
    Field::UserStory,
    Field::Generate,
];

const PREVIEW_FIELDS: &[Field] = &[
    Field::Summary,
    Field::Description,
    Field::EditRequest,
    Field::CreateTicket,
];

/// Which part of the screen is scrolled to the top.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Draft,
    Preview,
}

/// Outcome panel shown under the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultPanel {
    Created(CreatedTicket),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkbox {
    pub checked: bool,
    pub enabled: bool,
}

impl Checkbox {
    fn new() -> Self {
        Self {
            checked: false,
            enabled: true,
        }
    }

    /// Flip the value; disabled boxes ignore the toggle.
    pub fn toggle(&mut self) -> bool {
        if self.enabled {
            self.checked = !self.checked;
        }
        self.enabled
    }
}

/// Backend status from the startup `/health` probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthState {
    Checking,
    Reported(HealthStatus),
    Unreachable(String),
}

fn editor(placeholder: &str, text: &str) -> TextArea<'static> {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let mut area = if lines.is_empty() {
        TextArea::default()
    } else {
        TextArea::new(lines)
    };
    area.set_placeholder_text(placeholder);
    area.set_cursor_line_style(Style::default());
    area
}

fn editor_text(area: &TextArea<'_>) -> String {
    area.lines().join("\n")
}

/// Borders plus content wrapped at `width`, never below the minimum editor size.
fn editor_height(area: &TextArea<'_>, width: u16) -> u16 {
    let wrapped = Paragraph::new(editor_text(area))
        .wrap(Wrap { trim: false })
        .line_count(width.max(1));
    let rows = wrapped.max(area.lines().len());
    u16::try_from(rows)
        .unwrap_or(u16::MAX)
        .max(EDITOR_MIN_ROWS)
        .saturating_add(2)
}

/// Form controller: field state, the submitted draft and the preview/commit lifecycle.
pub struct App {
    pub projects: Vec<Project>,
    admin_project: String,
    default_username: String,
    /// Project selected on startup and after every reset.
    home_project: usize,
    pub username: String,
    pub project_idx: usize,
    pub prompt: TextArea<'static>,
    pub softpack_admin: Checkbox,
    pub user_story: Checkbox,
    /// Editable preview fields; only meaningful while the preview is visible.
    pub summary: String,
    pub description: TextArea<'static>,
    pub preview_visible: bool,
    pub focus: Field,
    pending_focus: Option<(Field, Instant)>,
    pub scroll_anchor: Section,
    /// True while `/preview-ticket` is in flight.
    pub generating: bool,
    /// True while `/create-ticket` is in flight.
    pub creating: bool,
    pub result: Option<ResultPanel>,
    /// Last successfully submitted draft; cleared after a ticket is created.
    current_draft: Option<Draft>,
    pub health: HealthState,
    /// Status bar message, cleared on next keypress.
    pub flash: Option<String>,
    pub show_keybindings: bool,
    pub should_quit: bool,
}

impl App {
    pub fn new(config: &AppConfig) -> Self {
        let mut app = Self {
            projects: config.projects.clone(),
            admin_project: config.form.admin_project.clone(),
            default_username: config.form.default_username.clone(),
            home_project: config.project_index(&config.form.default_project).unwrap_or(0),
            username: String::new(),
            project_idx: 0,
            prompt: editor(PROMPT_PLACEHOLDER, ""),
            softpack_admin: Checkbox::new(),
            user_story: Checkbox::new(),
            summary: String::new(),
            description: editor(DESCRIPTION_PLACEHOLDER, ""),
            preview_visible: false,
            focus: Field::Username,
            pending_focus: None,
            scroll_anchor: Section::Draft,
            generating: false,
            creating: false,
            result: None,
            current_draft: None,
            health: HealthState::Checking,
            flash: None,
            show_keybindings: false,
            should_quit: false,
        };
        app.reset_form();
        app
    }

    /// Restore every draft field to its default.
    pub fn reset_form(&mut self) {
        self.username = self.default_username.clone();
        self.prompt = editor(PROMPT_PLACEHOLDER, "");
        self.softpack_admin = Checkbox::new();
        self.user_story = Checkbox::new();
        self.select_project(self.home_project);
        let first = if self.username.is_empty() {
            Field::Username
        } else {
            Field::Prompt
        };
        self.set_focus(first);
    }

    pub fn current_draft(&self) -> Option<&Draft> {
        self.current_draft.as_ref()
    }

    pub fn selected_project(&self) -> Option<&Project> {
        self.projects.get(self.project_idx)
    }

    pub fn admin_project(&self) -> &str {
        &self.admin_project
    }

    /// Select `idx` now and keep it selected across form resets.
    pub fn set_home_project(&mut self, idx: usize) {
        self.home_project = idx.min(self.projects.len().saturating_sub(1));
        self.select_project(self.home_project);
    }

    pub fn is_admin_project(&self) -> bool {
        self.selected_project()
            .map(|p| p.code == self.admin_project)
            .unwrap_or(false)
    }

    /// Select a project. Leaving the admin project disables and clears the
    /// softpack admin box; returning re-enables it without re-checking.
    pub fn select_project(&mut self, idx: usize) {
        self.project_idx = idx.min(self.projects.len().saturating_sub(1));
        let is_admin = self.is_admin_project();
        self.softpack_admin.enabled = is_admin;
        if !is_admin {
            self.softpack_admin.checked = false;
        }
    }

    pub fn next_project(&mut self) {
        if self.projects.is_empty() {
            return;
        }
        self.select_project((self.project_idx + 1) % self.projects.len());
    }

    pub fn prev_project(&mut self) {
        if self.projects.is_empty() {
            return;
        }
        let len = self.projects.len();
        self.select_project((self.project_idx + len - 1) % len);
    }

    /// Fields reachable with Tab in the current visibility state.
    pub fn focus_order(&self) -> Vec<Field> {
        let mut fields = DRAFT_FIELDS.to_vec();
        if self.preview_visible {
            fields.extend_from_slice(PREVIEW_FIELDS);
        }
        fields
    }

    pub fn set_focus(&mut self, field: Field) {
        self.focus = field;
        if DRAFT_FIELDS.contains(&field) {
            self.scroll_anchor = Section::Draft;
        }
        let focused = Style::default().add_modifier(Modifier::REVERSED);
        let hidden = Style::default();
        self.prompt.set_cursor_style(if field == Field::Prompt { focused } else { hidden });
        self.description
            .set_cursor_style(if field == Field::Description { focused } else { hidden });
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(order[(pos + 1) % order.len()]);
    }

    pub fn focus_prev(&mut self) {
        let order = self.focus_order();
        let pos = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.set_focus(order[(pos + order.len() - 1) % order.len()]);
    }

    /// Apply any scheduled focus change that is due.
    pub fn tick(&mut self, now: Instant) {
        if let Some((field, due)) = self.pending_focus {
            if now >= due {
                self.pending_focus = None;
                if self.preview_visible || !PREVIEW_FIELDS.contains(&field) {
                    self.set_focus(field);
                }
            }
        }
    }

    pub fn prompt_text(&self) -> String {
        editor_text(&self.prompt)
    }

    pub fn description_text(&self) -> String {
        editor_text(&self.description)
    }

    /// Editor height for a text area `width` columns wide.
    pub fn prompt_height(&self, width: u16) -> u16 {
        editor_height(&self.prompt, width)
    }

    pub fn description_height(&self, width: u16) -> u16 {
        editor_height(&self.description, width)
    }

    pub fn summary_counter(&self) -> CharCounter {
        CharCounter::for_text(&self.summary)
    }

    /// Route a key to the focused text field. Returns false if nothing consumed it.
    pub fn edit_focused(&mut self, key: KeyEvent) -> bool {
        match self.focus {
            Field::Username => edit_line(&mut self.username, key),
            Field::Summary => edit_line(&mut self.summary, key),
            Field::Prompt => {
                self.prompt.input(key);
                true
            }
            Field::Description => {
                self.description.input(key);
                true
            }
            _ => false,
        }
    }

    /// Space on a checkbox.
    pub fn toggle_focused_checkbox(&mut self) {
        match self.focus {
            Field::SoftpackAdmin => {
                if !self.softpack_admin.toggle() {
                    self.flash = Some(format!(
                        "Softpack admin is only available for {}",
                        self.admin_project
                    ));
                }
            }
            Field::UserStory => {
                self.user_story.toggle();
            }
            _ => {}
        }
    }

    fn collect_draft(&self) -> Draft {
        Draft {
            username: self.username.trim().to_string(),
            project: self
                .selected_project()
                .map(|p| p.code.clone())
                .unwrap_or_default(),
            prompt: self.prompt_text().trim().to_string(),
            softpack_admin: self.softpack_admin.enabled && self.softpack_admin.checked,
            user_story: self.user_story.checked,
        }
    }

    fn show_error(&mut self, message: String) {
        self.result = Some(ResultPanel::Error(message));
    }

    /// Validate the draft fields and enter the generating state. The returned
    /// draft is what must be sent to `/preview-ticket`.
    pub fn submit_for_preview(&mut self) -> Result<Draft, ValidationError> {
        let draft = self.collect_draft();
        if !draft.has_required_fields() {
            tracing::info!("Preview blocked: missing required fields");
            self.show_error(ValidationError::MissingRequired.to_string());
            return Err(ValidationError::MissingRequired);
        }

        self.current_draft = Some(draft.clone());
        self.generating = true;
        self.result = None;
        Ok(draft)
    }

    pub fn finish_preview(&mut self, outcome: Result<PreviewContent, ApiError>, now: Instant) {
        self.generating = false;
        match outcome {
            Ok(content) => self.show_preview(content, now),
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "Preview generation failed");
                self.show_error(format!("Failed to generate preview: {}", e));
            }
        }
    }

    fn show_preview(&mut self, content: PreviewContent, now: Instant) {
        self.summary = content.summary;
        self.description = editor(DESCRIPTION_PLACEHOLDER, &content.description);
        self.preview_visible = true;
        // Re-apply cursor styling for the freshly built editor.
        self.set_focus(self.focus);
        self.scroll_anchor = Section::Preview;
        self.pending_focus = Some((Field::Summary, now + FOCUS_SETTLE_DELAY));
    }

    /// Hide the preview and return to the prompt, keeping the stored draft.
    pub fn discard_preview(&mut self) {
        self.preview_visible = false;
        self.pending_focus = None;
        self.result = None;
        self.scroll_anchor = Section::Draft;
        self.set_focus(Field::Prompt);
    }

    /// Validate the edited preview and enter the creating state. The returned
    /// request is what must be sent to `/create-ticket`.
    pub fn commit_ticket(&mut self) -> Result<TicketRequest, ValidationError> {
        let request = match self.current_draft.as_ref() {
            Some(draft) => draft.ticket_request(&self.summary, &self.description_text()),
            None => {
                self.show_error(ValidationError::NoDraft.to_string());
                return Err(ValidationError::NoDraft);
            }
        };

        let invalid = if request.summary.is_empty() || request.description.is_empty() {
            Some(ValidationError::MissingPreview)
        } else if request.summary.chars().count() > SUMMARY_MAX_CHARS {
            Some(ValidationError::SummaryTooLong)
        } else {
            None
        };
        if let Some(err) = invalid {
            tracing::info!(error = %err, "Commit blocked by validation");
            self.show_error(err.to_string());
            return Err(err);
        }

        self.creating = true;
        self.result = None;
        Ok(request)
    }

    pub fn finish_commit(&mut self, outcome: Result<CreatedTicket, ApiError>) {
        self.creating = false;
        match outcome {
            Ok(ticket) => {
                tracing::info!(key = %ticket.jira_key, "Ticket created");
                self.result = Some(ResultPanel::Created(ticket));
                self.preview_visible = false;
                self.pending_focus = None;
                self.scroll_anchor = Section::Draft;
                self.reset_form();
                self.current_draft = None;
            }
            Err(ApiError::Rejected { message }) => {
                tracing::warn!(error = %message, "Ticket creation rejected");
                self.show_error(message);
            }
            Err(e) => {
                tracing::warn!(error = %e, status = ?e.status(), "Ticket creation failed");
                self.show_error(format!("Failed to create ticket: {}", e));
            }
        }
    }

    /// URL of the most recently created ticket, if the success panel is showing.
    pub fn created_ticket_url(&self) -> Option<&str> {
        match &self.result {
            Some(ResultPanel::Created(ticket)) if !ticket.jira_url.is_empty() => {
                Some(ticket.jira_url.as_str())
            }
            _ => None,
        }
    }

    pub fn set_health(&mut self, outcome: Result<HealthStatus, ApiError>) {
        self.health = match outcome {
            Ok(status) => HealthState::Reported(status),
            Err(e) => HealthState::Unreachable(e.to_string()),
        };
    }

    pub fn toggle_keybindings(&mut self) {
        self.show_keybindings = !self.show_keybindings;
    }

    pub fn close_keybindings(&mut self) {
        self.show_keybindings = false;
    }
}

fn edit_line(value: &mut String, key: KeyEvent) -> bool {
    let chord = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    match key.code {
        KeyCode::Char(_) if chord => false,
        KeyCode::Char(c) => {
            value.push(c);
            true
        }
        KeyCode::Backspace => {
            value.pop();
            true
        }
        _ => false,
    }
}
