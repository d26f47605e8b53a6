use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::ticket::{default_projects, Project};

pub const SERVER_URL_ENV: &str = "JIRATO_SERVER_URL";
pub const USERNAME_ENV: &str = "JIRATO_USERNAME";

/// Top-level application configuration, persisted as TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default = "default_projects")]
    pub projects: Vec<Project>,
}

/// Where the preview/create backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Form defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormConfig {
    #[serde(default)]
    pub default_username: String,
    /// The only project for which the softpack admin flag may be set.
    #[serde(default = "default_admin_project")]
    pub admin_project: String,
    /// Project code selected on startup and after each created ticket.
    #[serde(default)]
    pub default_project: String,
}

fn default_admin_project() -> String {
    "HI".to_string()
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            default_username: String::new(),
            admin_project: default_admin_project(),
            default_project: String::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            form: FormConfig::default(),
            projects: default_projects(),
        }
    }
}

/// Values that take precedence over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub server_url: Option<String>,
    pub username: Option<String>,
}

impl Overrides {
    /// Read overrides from the process environment (after `.env` has been loaded).
    pub fn from_env() -> Self {
        Self {
            server_url: std::env::var(SERVER_URL_ENV).ok().filter(|s| !s.is_empty()),
            username: std::env::var(USERNAME_ENV).ok().filter(|s| !s.is_empty()),
        }
    }

    /// Fields set in `other` win.
    pub fn merge(self, other: Overrides) -> Self {
        Self {
            server_url: other.server_url.or(self.server_url),
            username: other.username.or(self.username),
        }
    }
}

impl AppConfig {
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(url) = &overrides.server_url {
            self.server.base_url = url.clone();
        }
        if let Some(username) = &overrides.username {
            self.form.default_username = username.clone();
        }
        if self.projects.is_empty() {
            self.projects = default_projects();
        }
    }

    pub fn project_index(&self, code: &str) -> Option<usize> {
        self.projects
            .iter()
            .position(|p| p.code.eq_ignore_ascii_case(code))
    }
}

/// Returns the jirato config directory path (`~/.config/jirato/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME not set")?;
    Ok(PathBuf::from(home).join(".config").join("jirato"))
}

/// Returns the config file path (`~/.config/jirato/config.toml`).
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

/// Load the config from disk. Returns `Ok(None)` if the file does not exist.
pub fn load_config() -> Result<Option<AppConfig>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config = parse_config(&content)?;
    Ok(Some(config))
}

pub fn parse_config(content: &str) -> Result<AppConfig> {
    toml::from_str(content).context("Failed to parse config.toml")
}

/// Write the config to disk, creating the directory if needed.
pub fn save_config(config: &AppConfig) -> Result<()> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
    let path = dir.join("config.toml");
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config file: {}", path.display()))?;
    tracing::info!(path = %path.display(), "Saved config");
    Ok(())
}
