//! User actions and their dispatch pipeline.
//!
//! Every action goes through the same steps:
//!
//! 1. role gate (lead-only or member-only)
//! 2. client-side validation against the loaded state
//! 3. confirmation prompt for destructive actions
//! 4. exactly one mutating request
//! 5. a success or error toast
//! 6. a full reload on success
//!
//! There is no optimistic update: the dashboard state changes only
//! through the reload that follows a successful request.

use std::fmt;
use std::str::FromStr;

use taskdesk_proto::model::{NotificationId, Priority, Role, TaskId, UserId};
use taskdesk_proto::request::{NewTask, NewUser};

use crate::api::{ApiError, Backend};
use crate::dashboard::Dashboard;
use crate::error::{AppError, ValidationError};
use crate::toast::ToastKind;

// ---------------------------------------------------------------------------
// Confirmation
// ---------------------------------------------------------------------------

/// Blocking yes/no prompt shown before destructive actions.
pub trait Confirm: Send + Sync {
    /// Returns `true` when the user agrees.
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Accepts every prompt (`--yes`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        tracing::debug!(prompt, "auto-confirmed");
        true
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Contents of the assign-task form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Short title.
    pub title: String,
    /// Free-text description.
    pub description: String,
    /// Selected member, `None` while the selector is on its placeholder.
    pub assigned_to: Option<UserId>,
    /// Priority.
    pub priority: Priority,
    /// Optional due date as typed (`YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`).
    pub due_date: Option<String>,
}

/// One user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Lead approves a completed task.
    ApproveTask(TaskId),
    /// Lead deletes a task.
    DeleteTask(TaskId),
    /// Lead deletes a member (and, on the backend, their tasks).
    DeleteUser(UserId),
    /// Lead creates a user.
    CreateUser(NewUser),
    /// Lead assigns a new task.
    AssignTask(TaskDraft),
    /// Member submits a result.
    CompleteTask {
        /// The task being completed.
        task: TaskId,
        /// What the member produced.
        result: String,
    },
    /// Either role marks a notification read.
    MarkNotificationRead(NotificationId),
}

impl Action {
    /// The action's kind.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::ApproveTask(_) => ActionKind::ApproveTask,
            Self::DeleteTask(_) => ActionKind::DeleteTask,
            Self::DeleteUser(_) => ActionKind::DeleteUser,
            Self::CreateUser(_) => ActionKind::CreateUser,
            Self::AssignTask(_) => ActionKind::AssignTask,
            Self::CompleteTask { .. } => ActionKind::CompleteTask,
            Self::MarkNotificationRead(_) => ActionKind::MarkNotificationRead,
        }
    }
}

/// Action discriminant, also used as the `data-action` attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// `approve-task`
    ApproveTask,
    /// `delete-task`
    DeleteTask,
    /// `delete-user`
    DeleteUser,
    /// `create-user`
    CreateUser,
    /// `assign-task`
    AssignTask,
    /// `complete-task`
    CompleteTask,
    /// `mark-read`
    MarkNotificationRead,
}

impl ActionKind {
    /// Every kind.
    pub const ALL: [Self; 7] = [
        Self::ApproveTask,
        Self::DeleteTask,
        Self::DeleteUser,
        Self::CreateUser,
        Self::AssignTask,
        Self::CompleteTask,
        Self::MarkNotificationRead,
    ];

    /// Stable name used in markup and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApproveTask => "approve-task",
            Self::DeleteTask => "delete-task",
            Self::DeleteUser => "delete-user",
            Self::CreateUser => "create-user",
            Self::AssignTask => "assign-task",
            Self::CompleteTask => "complete-task",
            Self::MarkNotificationRead => "mark-read",
        }
    }

    /// The only role allowed to perform the action, `None` for both.
    #[must_use]
    pub const fn allowed_role(self) -> Option<Role> {
        match self {
            Self::ApproveTask
            | Self::DeleteTask
            | Self::DeleteUser
            | Self::CreateUser
            | Self::AssignTask => Some(Role::Lead),
            Self::CompleteTask => Some(Role::Member),
            Self::MarkNotificationRead => None,
        }
    }

    /// Prompt shown before sending, for destructive actions.
    #[must_use]
    pub const fn confirmation(self) -> Option<&'static str> {
        match self {
            Self::ApproveTask => Some("Are you sure you want to approve this task?"),
            Self::DeleteTask => Some("Are you sure you want to delete this task?"),
            Self::DeleteUser => {
                Some("Are you sure you want to delete this user? All their tasks will be deleted.")
            }
            _ => None,
        }
    }

    /// Whether a confirmation prompt precedes the request.
    #[must_use]
    pub const fn requires_confirmation(self) -> bool {
        self.confirmation().is_some()
    }

    /// Toast shown after the backend accepts the action.
    #[must_use]
    pub const fn success_message(self) -> &'static str {
        match self {
            Self::ApproveTask => "Task approved successfully!",
            Self::DeleteTask => "Task deleted successfully!",
            Self::DeleteUser => "User deleted successfully!",
            Self::CreateUser => "User created successfully!",
            Self::AssignTask => "Task assigned successfully!",
            Self::CompleteTask => "Task completed successfully! Awaiting team lead approval.",
            Self::MarkNotificationRead => "Notification marked as read",
        }
    }

    /// Toast shown when the request fails without a server message.
    #[must_use]
    pub const fn failure_message(self) -> &'static str {
        match self {
            Self::ApproveTask => "Error approving task",
            Self::DeleteTask => "Error deleting task",
            Self::DeleteUser => "Error deleting user",
            Self::CreateUser => "Failed to create user",
            Self::AssignTask => "Failed to assign task",
            Self::CompleteTask => "Failed to complete task",
            Self::MarkNotificationRead => "Error marking notification as read",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown action: {s}"))
    }
}

/// How a dispatched action ended.
#[derive(Debug)]
pub enum Outcome {
    /// The backend accepted the request and the dashboard was refreshed.
    Applied,
    /// The user declined the confirmation prompt; nothing was sent.
    Cancelled,
    /// A check or the request failed; an error toast was raised.
    Rejected(AppError),
}

impl Outcome {
    /// Whether the backend accepted the action.
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Whether the user declined.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// The failure, if any.
    #[must_use]
    pub const fn error(&self) -> Option<&AppError> {
        match self {
            Self::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Runs actions against a [`Dashboard`].
pub struct ActionDispatcher {
    confirm: Box<dyn Confirm>,
}

impl fmt::Debug for ActionDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionDispatcher").finish_non_exhaustive()
    }
}

impl ActionDispatcher {
    /// Creates a dispatcher that asks `confirm` before destructive actions.
    pub fn new(confirm: impl Confirm + 'static) -> Self {
        Self {
            confirm: Box::new(confirm),
        }
    }

    /// Runs one action through the pipeline.
    ///
    /// Never fails outright: problems are reported through the returned
    /// [`Outcome`] and an error toast on the dashboard.
    pub async fn dispatch<B: Backend>(
        &self,
        dashboard: &mut Dashboard<B>,
        action: Action,
    ) -> Outcome {
        let kind = action.kind();
        let request = match prepare(dashboard, action) {
            Ok(request) => request,
            Err(err) => {
                tracing::info!(action = %kind, error = %err, "action refused before sending");
                let err = AppError::from(err);
                dashboard
                    .toasts_mut()
                    .push(ToastKind::Error, err.toast_message(kind.failure_message()));
                return Outcome::Rejected(err);
            }
        };

        if let Some(prompt) = kind.confirmation() {
            if !self.confirm.confirm(prompt) {
                tracing::info!(action = %kind, "action cancelled by user");
                return Outcome::Cancelled;
            }
        }

        let result = send(dashboard.backend(), request).await;
        match result {
            Ok(()) => {
                tracing::info!(action = %kind, "action applied");
                dashboard
                    .toasts_mut()
                    .push(ToastKind::Success, kind.success_message());
                // A failed reload raises its own toast and keeps prior state;
                // the action itself still went through.
                if let Err(e) = dashboard.reload().await {
                    tracing::debug!(action = %kind, error = %e, "reload after action failed");
                }
                Outcome::Applied
            }
            Err(err) => {
                let err = AppError::from(err);
                tracing::warn!(action = %kind, error = %err, "action failed");
                dashboard
                    .toasts_mut()
                    .push(ToastKind::Error, err.toast_message(kind.failure_message()));
                Outcome::Rejected(err)
            }
        }
    }
}

/// A validated request ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Approve { task: TaskId, lead: UserId },
    DeleteTask(TaskId),
    DeleteUser(UserId),
    CreateUser(NewUser),
    Assign(NewTask),
    Complete { task: TaskId, result: String },
    MarkRead(NotificationId),
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

/// Applies the role gate and the form/state checks.
fn prepare<B: Backend>(
    dashboard: &Dashboard<B>,
    action: Action,
) -> Result<Request, ValidationError> {
    let kind = action.kind();
    let user = dashboard.user();
    if kind.allowed_role().is_some_and(|required| required != user.role) {
        return Err(ValidationError::NotPermitted {
            action: kind.as_str(),
            role: user.role,
        });
    }

    let state = dashboard.state();
    match action {
        Action::ApproveTask(id) => {
            let task = state.task(id).ok_or(ValidationError::UnknownTask(id))?;
            if !task.can_approve() {
                return Err(ValidationError::InvalidTransition {
                    task: id,
                    status: task.status,
                    action: "approve",
                });
            }
            Ok(Request::Approve {
                task: id,
                lead: user.id,
            })
        }
        Action::DeleteTask(id) => Ok(Request::DeleteTask(id)),
        Action::DeleteUser(id) => Ok(Request::DeleteUser(id)),
        Action::CreateUser(new_user) => {
            require(&new_user.username, "username")?;
            require(&new_user.email, "email")?;
            require(&new_user.full_name, "full name")?;
            Ok(Request::CreateUser(new_user))
        }
        Action::AssignTask(draft) => {
            let assigned_to = draft.assigned_to.ok_or(ValidationError::NoAssignee)?;
            require(&draft.title, "title")?;
            Ok(Request::Assign(NewTask {
                title: draft.title,
                description: draft.description,
                assigned_to,
                assigned_by: user.id,
                priority: draft.priority,
                due_date: draft.due_date.filter(|d| !d.trim().is_empty()),
            }))
        }
        Action::CompleteTask { task: id, result } => {
            let task = state.task(id).ok_or(ValidationError::UnknownTask(id))?;
            if !task.can_complete() {
                return Err(ValidationError::InvalidTransition {
                    task: id,
                    status: task.status,
                    action: "complete",
                });
            }
            require(&result, "result")?;
            Ok(Request::Complete { task: id, result })
        }
        Action::MarkNotificationRead(id) => Ok(Request::MarkRead(id)),
    }
}

/// Sends exactly one request.
async fn send<B: Backend>(backend: &B, request: Request) -> Result<(), ApiError> {
    match request {
        Request::Approve { task, lead } => backend.approve_task(task, lead).await,
        Request::DeleteTask(id) => backend.delete_task(id).await,
        Request::DeleteUser(id) => backend.delete_user(id).await,
        Request::CreateUser(user) => backend.create_user(&user).await.map(drop),
        Request::Assign(task) => backend.assign_task(&task).await.map(drop),
        Request::Complete { task, result } => backend.complete_task(task, &result).await,
        Request::MarkRead(id) => backend.mark_notification_read(id).await,
    }
}
