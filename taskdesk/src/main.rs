//! `TaskDesk` CLI entry point.
//!
//! Reads the session left by the login flow, loads the dashboard for the
//! signed-in role, and either renders it as an HTML page or dispatches one
//! action against the backend and renders the refreshed page.
//!
//! Logs go to a file so stdout carries only the rendered page.

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use taskdesk::api::http::HttpBackend;
use taskdesk::api::loopback::LoopbackBackend;
use taskdesk::api::{ApiError, Backend};
use taskdesk::config::{AppConfig, CliArgs, Command, ConfigError};
use taskdesk::dashboard::Dashboard;
use taskdesk::dispatch::{Action, ActionDispatcher, AlwaysConfirm, Confirm, Outcome, TaskDraft};
use taskdesk::error::{AuthError, ValidationError};
use taskdesk::session::{
    self, CurrentUser, FileSession, MemorySession, SessionError, SessionGuard, SessionStore,
};
use taskdesk_proto::model::{Role, UserId};
use taskdesk_proto::request::NewUser;

/// Exit code used when the session does not grant the view.
const EXIT_REDIRECT: u8 = 2;

/// Failures that end the command.
#[derive(Debug, thiserror::Error)]
enum CliError {
    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session file unusable.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Session does not grant a dashboard.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Backend client could not be built or the backend failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request was refused before being sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Output could not be written.
    #[error("failed to write output: {0}")]
    Io(#[from] io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = CliArgs::parse();

    let config = match AppConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config file: {e}");
            AppConfig::from_cli(&cli)
        }
    };

    // Logs go to a file so stdout stays free for rendered HTML.
    let _log_guard = init_logging(&cli.log_level, cli.log_file.as_deref());

    tracing::info!(demo = cli.demo, "taskdesk starting");

    let result = if cli.demo {
        run(Arc::new(LoopbackBackend::demo()), &cli, &config).await
    } else {
        match HttpBackend::new(&config.backend_url, config.request_timeout) {
            Ok(backend) => run(Arc::new(backend), &cli, &config).await,
            Err(e) => Err(e.into()),
        }
    };

    tracing::info!("taskdesk exiting");
    match result {
        Ok(code) => code,
        Err(CliError::Auth(e)) => {
            eprintln!("{e}; redirecting to {}", e.redirect_to());
            ExitCode::from(EXIT_REDIRECT)
        }
        Err(e) => {
            tracing::error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Sends `tracing` output to a log file (`taskdesk.log` in the temp dir
/// unless `--log-file` says otherwise), keeping stdout clean for the HTML
/// page that `show`, `watch` and the actions print.
///
/// Hold the returned guard until exit or buffered lines are lost.
fn init_logging(level: &str, file_path: Option<&Path>) -> Option<WorkerGuard> {
    let default_path = std::env::temp_dir().join("taskdesk.log");
    let log_path = file_path.unwrap_or(&default_path);

    let log_dir = log_path.parent()?;
    let file_name = log_path.file_name()?.to_str()?;

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(env_filter)
        .with_ansi(false)
        .init();

    Some(guard)
}

/// Confirmation prompt on stderr, answered on stdin unless `--yes`.
#[derive(Debug, Clone, Copy)]
struct CliConfirm {
    assume_yes: bool,
}

impl Confirm for CliConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if self.assume_yes {
            return AlwaysConfirm.confirm(prompt);
        }
        eprint!("{prompt} [y/N] ");
        let _ = io::stderr().flush();
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim(), "y" | "Y" | "yes" | "Yes")
    }
}

/// Session for this run. Demo mode signs in as the seeded lead.
fn open_session(cli: &CliArgs, config: &AppConfig) -> Result<Box<dyn SessionStore>, CliError> {
    if cli.demo {
        let lead = CurrentUser {
            id: UserId(1),
            username: "lead".to_string(),
            full_name: Some("Dana Lead".to_string()),
            role: Role::Lead,
        };
        return Ok(Box::new(MemorySession::signed_in(&lead)));
    }
    Ok(Box::new(FileSession::open(config.session_path()?)?))
}

/// Writes a rendered page to the configured output or stdout.
fn emit(config: &AppConfig, page: &str) -> io::Result<()> {
    match &config.output {
        Some(path) => {
            std::fs::write(path, page)?;
            tracing::debug!(path = %path.display(), bytes = page.len(), "page written");
            Ok(())
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(page.as_bytes())?;
            stdout.flush()
        }
    }
}

async fn run<B: Backend + 'static>(
    backend: Arc<B>,
    cli: &CliArgs,
    config: &AppConfig,
) -> Result<ExitCode, CliError> {
    let command = cli.command.clone().unwrap_or(Command::Show);
    let confirm = CliConfirm {
        assume_yes: cli.yes,
    };

    match command {
        Command::Health => {
            let health = backend.health().await?;
            let healthy = health.is_ok();
            println!(
                "{}{}",
                health.status,
                health.message.map(|m| format!(": {m}")).unwrap_or_default()
            );
            return Ok(if healthy {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        Command::Logout => {
            let store = open_session(cli, config)?;
            if session::logout(store.as_ref(), &confirm)? {
                eprintln!("Logged out; redirecting to {}", taskdesk::error::LOGIN_PATH);
            }
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let store = open_session(cli, config)?;
    let user = SessionGuard::authenticated(store.as_ref())?;
    tracing::info!(user = %user.id, role = %user.role, "session accepted");

    let mut dashboard = Dashboard::new(backend, user)
        .with_renderer(config.renderer())
        .with_toast_ttl(config.toast_duration);
    let loaded = dashboard.reload().await.is_ok();

    let action = match command {
        Command::Show => {
            emit(config, &dashboard.render())?;
            return Ok(exit_code(loaded));
        }
        Command::Watch => {
            watch(&mut dashboard, config).await?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::View { task } => {
            let html = dashboard
                .render_task_details(task)
                .ok_or(ValidationError::UnknownTask(task))?;
            emit(config, &html)?;
            return Ok(ExitCode::SUCCESS);
        }
        Command::CreateUser {
            username,
            email,
            full_name,
            role,
        } => Action::CreateUser(NewUser {
            username,
            email,
            full_name,
            role,
        }),
        Command::Assign {
            title,
            to,
            description,
            priority,
            due,
        } => Action::AssignTask(TaskDraft {
            title,
            description,
            assigned_to: to,
            priority,
            due_date: due,
        }),
        Command::Approve { task } => Action::ApproveTask(task),
        Command::Complete { task, result } => Action::CompleteTask { task, result },
        Command::DeleteTask { task } => Action::DeleteTask(task),
        Command::DeleteUser { user } => Action::DeleteUser(user),
        Command::Read { notification } => Action::MarkNotificationRead(notification),
        Command::Health | Command::Logout => return Ok(ExitCode::SUCCESS),
    };

    let dispatcher = ActionDispatcher::new(confirm);
    let outcome = dispatcher.dispatch(&mut dashboard, action).await;
    if let Some(toast) = dashboard.toasts().last() {
        eprintln!("{}", toast.message);
    }
    emit(config, &dashboard.render())?;

    Ok(match outcome {
        Outcome::Applied | Outcome::Cancelled => ExitCode::SUCCESS,
        Outcome::Rejected(_) => ExitCode::FAILURE,
    })
}

const fn exit_code(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Renders, then re-renders on every poll until Ctrl-C.
async fn watch<B: Backend + 'static>(
    dashboard: &mut Dashboard<B>,
    config: &AppConfig,
) -> Result<(), CliError> {
    emit(config, &dashboard.render())?;
    let (handle, mut events) = dashboard.spawn_poller(config.poll_interval);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                dashboard.apply_poll_event(event);
                dashboard.toasts_mut().prune(tokio::time::Instant::now());
                emit(config, &dashboard.render())?;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping watch");
                break;
            }
        }
    }

    handle.cancel();
    Ok(())
}
