//! Configuration for the `taskdesk` CLI.
//!
//! Layered, highest priority first:
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/taskdesk/config.toml`)
//! 4. Compiled defaults
//!
//! A missing default config file is not an error. An explicit `--config`
//! path that doesn't exist is.
//!
//! ```toml
//! [backend]
//! url = "http://127.0.0.1:5000"
//! request_timeout_secs = 10
//!
//! [session]
//! path = "/home/dana/.config/taskdesk/session.toml"
//!
//! [dashboard]
//! poll_interval_secs = 30
//! toast_duration_ms = 3000
//! date_format = "%Y-%m-%d"
//! datetime_format = "%Y-%m-%d %H:%M"
//! output = "dashboard.html"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use taskdesk_proto::model::{NotificationId, Priority, Role, TaskId, UserId};

use crate::render::{DEFAULT_DATE_FORMAT, DEFAULT_DATETIME_FORMAT, Renderer};

/// Directory name under the platform config dir.
const APP_DIR: &str = "taskdesk";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),

    /// No session path was given and the user's config directory is unknown.
    #[error("could not determine config directory (no HOME or XDG_CONFIG_HOME); pass --session")]
    NoConfigDir,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ConfigFile {
    backend: BackendFileConfig,
    session: SessionFileConfig,
    dashboard: DashboardFileConfig,
}

/// `[backend]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct BackendFileConfig {
    url: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// `[session]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct SessionFileConfig {
    path: Option<PathBuf>,
}

/// `[dashboard]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct DashboardFileConfig {
    poll_interval_secs: Option<u64>,
    toast_duration_ms: Option<u64>,
    date_format: Option<String>,
    datetime_format: Option<String>,
    output: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Fully resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    // -- Backend --
    /// REST API origin.
    pub backend_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,

    // -- Session --
    /// Session file written by the login flow. `None` only when no
    /// config directory exists and none was configured.
    pub session_path: Option<PathBuf>,

    // -- Dashboard --
    /// Notification refresh period.
    pub poll_interval: Duration,
    /// How long toasts stay visible.
    pub toast_duration: Duration,
    /// Date display format (chrono).
    pub date_format: String,
    /// Date-time display format (chrono).
    pub datetime_format: String,
    /// Where rendered pages go; stdout when unset.
    pub output: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            backend_url: "http://127.0.0.1:5000".to_string(),
            request_timeout: Duration::from_secs(10),
            session_path: default_session_path(),
            poll_interval: Duration::from_secs(30),
            toast_duration: Duration::from_millis(3000),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            datetime_format: DEFAULT_DATETIME_FORMAT.to_string(),
            output: None,
        }
    }
}

impl AppConfig {
    /// Load configuration by merging CLI args, env vars and a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read,
    /// or if any config file cannot be parsed.
    pub fn load(cli: &CliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Configuration from CLI args and defaults alone, used when the config
    /// file is unusable.
    #[must_use]
    pub fn from_cli(cli: &CliArgs) -> Self {
        Self::resolve(cli, &ConfigFile::default())
    }

    /// Priority: CLI > file > default. Separated from `load()` so it can be
    /// tested without touching the filesystem.
    fn resolve(cli: &CliArgs, file: &ConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            backend_url: cli
                .backend_url
                .clone()
                .or_else(|| file.backend.url.clone())
                .unwrap_or(defaults.backend_url),
            request_timeout: file
                .backend
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
            session_path: cli
                .session
                .clone()
                .or_else(|| file.session.path.clone())
                .or(defaults.session_path),
            poll_interval: cli
                .poll_interval_secs
                .or(file.dashboard.poll_interval_secs)
                .filter(|s| *s > 0)
                .map_or(defaults.poll_interval, Duration::from_secs),
            toast_duration: file
                .dashboard
                .toast_duration_ms
                .map_or(defaults.toast_duration, Duration::from_millis),
            date_format: file
                .dashboard
                .date_format
                .clone()
                .unwrap_or(defaults.date_format),
            datetime_format: file
                .dashboard
                .datetime_format
                .clone()
                .unwrap_or(defaults.datetime_format),
            output: cli.out.clone().or_else(|| file.dashboard.output.clone()),
        }
    }

    /// The session file location.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoConfigDir`] when none could be determined.
    pub fn session_path(&self) -> Result<&Path, ConfigError> {
        self.session_path.as_deref().ok_or(ConfigError::NoConfigDir)
    }

    /// Renderer using the configured date formats.
    #[must_use]
    pub fn renderer(&self) -> Renderer {
        Renderer::new(self.date_format.clone(), self.datetime_format.clone())
    }
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// CLI arguments parsed by clap.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Team lead and team member task dashboards")]
pub struct CliArgs {
    /// Base URL of the task API.
    #[arg(long, env = "TASKDESK_BACKEND_URL")]
    pub backend_url: Option<String>,

    /// Session file written by the login flow.
    #[arg(long, env = "TASKDESK_SESSION")]
    pub session: Option<PathBuf>,

    /// Path to config file (default: `~/.config/taskdesk/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write rendered pages to this file instead of stdout.
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Answer yes to every confirmation prompt.
    #[arg(short, long)]
    pub yes: bool,

    /// Use a seeded in-memory backend instead of the REST API.
    #[arg(long)]
    pub demo: bool,

    /// Notification refresh period for `watch`, in seconds.
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "TASKDESK_LOG")]
    pub log_level: String,

    /// Path to log file (default: `$TMPDIR/taskdesk.log`).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// What to do (default: `show`).
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands. Lead-only and member-only actions are refused for the
/// other role before anything is sent.
#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Render the dashboard for the signed-in user.
    Show,
    /// Render, then re-render whenever notifications change (Ctrl-C stops).
    Watch,
    /// Render one task's details.
    View {
        /// Task id.
        task: TaskId,
    },
    /// Create a user (lead).
    CreateUser {
        /// Login name.
        #[arg(long)]
        username: String,
        /// Contact address.
        #[arg(long)]
        email: String,
        /// Display name.
        #[arg(long)]
        full_name: String,
        /// `member` or `lead`.
        #[arg(long, default_value = "member")]
        role: Role,
    },
    /// Assign a new task to a member (lead).
    Assign {
        /// Short title.
        #[arg(long)]
        title: String,
        /// Member id.
        #[arg(long)]
        to: Option<UserId>,
        /// Free-text description.
        #[arg(long, default_value = "")]
        description: String,
        /// `low`, `medium` or `high`.
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`).
        #[arg(long)]
        due: Option<String>,
    },
    /// Approve a completed task (lead).
    Approve {
        /// Task id.
        task: TaskId,
    },
    /// Complete an assigned task with a result (member).
    Complete {
        /// Task id.
        task: TaskId,
        /// What was produced.
        #[arg(long)]
        result: String,
    },
    /// Delete a task (lead).
    DeleteTask {
        /// Task id.
        task: TaskId,
    },
    /// Delete a member and their tasks (lead).
    DeleteUser {
        /// User id.
        user: UserId,
    },
    /// Mark a notification read.
    Read {
        /// Notification id.
        notification: NotificationId,
    },
    /// Check that the backend is up.
    Health,
    /// Clear the session.
    Logout,
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("session.toml"))
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Reads the dashboard's TOML settings.
///
/// A `--config` path must be readable. The per-user file under the config
/// directory is optional: when absent, every setting keeps its built-in
/// value and the CLI flags alone decide.
fn load_config_file(explicit_path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    let (path, required) = match explicit_path {
        Some(p) => (p.to_path_buf(), true),
        None => match default_config_path() {
            Some(p) => (p, false),
            None => return Ok(ConfigFile::default()),
        },
    };

    let contents = match std::fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no dashboard config file, using defaults");
            return Ok(ConfigFile::default());
        }
        Err(source) => return Err(ConfigError::ReadFile { path, source }),
    };
    let file: ConfigFile = toml::from_str(&contents)?;
    tracing::debug!(path = %path.display(), "dashboard config loaded");
    Ok(file)
}
