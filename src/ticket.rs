use serde::{Deserialize, Serialize};

/// Hard client-side limit for ticket summaries.
pub const SUMMARY_MAX_CHARS: usize = 100;

/// A selectable tracker project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub code: String,
    pub name: String,
}

impl Project {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }

    pub fn label(&self) -> String {
        format!("{} ({})", self.code, self.name)
    }
}

pub fn default_projects() -> Vec<Project> {
    vec![
        Project::new("HI", "HGI Informatics"),
        Project::new("HB", "HGI Bioinformatics"),
        Project::new("HSF", "HGI Software Farmers"),
        Project::new("HSH", "HGI Software HailQC"),
        Project::new("HSI", "HGI Software iBackup"),
        Project::new("HSS", "HGI Software Softpack"),
        Project::new("HSW", "HGI Software wrstat"),
    ]
}

/// The user's unconfirmed ticket request. Serialized as-is for `/preview-ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Draft {
    pub username: String,
    pub project: String,
    pub prompt: String,
    pub softpack_admin: bool,
    pub user_story: bool,
}

impl Draft {
    pub fn has_required_fields(&self) -> bool {
        !self.username.is_empty() && !self.prompt.is_empty()
    }

    /// Merge the draft with an edited preview into a create request.
    pub fn ticket_request(&self, summary: &str, description: &str) -> TicketRequest {
        TicketRequest {
            username: self.username.clone(),
            project: self.project.clone(),
            summary: summary.trim().to_string(),
            description: description.trim().to_string(),
            softpack_admin: self.softpack_admin,
            user_story: self.user_story,
        }
    }
}

/// Generated summary/description pending review.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PreviewContent {
    pub summary: String,
    pub description: String,
}

/// Body of `/create-ticket`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRequest {
    pub username: String,
    pub project: String,
    pub summary: String,
    pub description: String,
    pub softpack_admin: bool,
    pub user_story: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTicket {
    pub jira_key: String,
    pub jira_url: String,
}

/// Visual state of the summary character counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterState {
    Normal,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharCounter {
    pub length: usize,
    pub max: usize,
}

impl CharCounter {
    pub fn for_text(text: &str) -> Self {
        Self {
            length: text.chars().count(),
            max: SUMMARY_MAX_CHARS,
        }
    }

    pub fn text(&self) -> String {
        format!("{}/{} characters", self.length, self.max)
    }

    /// Warning above 80% of the budget, error once it is exceeded.
    pub fn state(&self) -> CounterState {
        if self.length > self.max {
            CounterState::Error
        } else if self.length * 10 > self.max * 8 {
            CounterState::Warning
        } else {
            CounterState::Normal
        }
    }
}
