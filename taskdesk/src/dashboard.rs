//! Dashboard state and the reload cycle.
//!
//! [`DashboardState`] is the single owner of every fetched collection.
//! Collections are replaced wholesale after a successful fetch and never
//! patched, so a render always sees one consistent snapshot.
//!
//! [`Dashboard`] ties the state to a [`Backend`], the signed-in user, a
//! toast queue and a renderer. The user's role selects the view: leads
//! see members and the tasks they created, members see the tasks
//! assigned to them.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;

use taskdesk_proto::model::{Notification, Role, Task, TaskId, User};

use crate::api::Backend;
use crate::error::AppError;
use crate::poll::{NotificationPoller, PollEvent, PollHandle};
use crate::render::{self, Renderer};
use crate::session::CurrentUser;
use crate::toast::{ToastKind, ToastQueue};
use crate::view::{self, LeadStats, MemberStats};

/// Toast raised when the joined reload fails.
pub const LOAD_ERROR_MESSAGE: &str = "Error loading dashboard data";

/// Toast raised when a notification refetch fails.
pub const NOTIFICATIONS_ERROR_MESSAGE: &str = "Error loading notifications";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Cached collections for one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardState {
    members: Vec<User>,
    tasks: Vec<Task>,
    notifications: Vec<Notification>,
}

impl DashboardState {
    /// Team members (lead view only).
    #[must_use]
    pub fn members(&self) -> &[User] {
        &self.members
    }

    /// Tasks created by the lead, or assigned to the member.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Notifications, newest first.
    #[must_use]
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Replaces the member list.
    pub fn replace_members(&mut self, members: Vec<User>) {
        self.members = members;
    }

    /// Replaces the task list.
    pub fn replace_tasks(&mut self, tasks: Vec<Task>) {
        let inconsistent = tasks.iter().filter(|t| !t.is_consistent()).count();
        if inconsistent > 0 {
            tracing::warn!(inconsistent, "finished tasks without completion time");
        }
        self.tasks = tasks;
    }

    /// Replaces the notification list.
    pub fn replace_notifications(&mut self, notifications: Vec<Notification>) {
        self.notifications = notifications;
    }

    /// Looks up a loaded task.
    #[must_use]
    pub fn task(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Unread notifications.
    #[must_use]
    pub fn unread_count(&self) -> usize {
        view::unread_count(&self.notifications)
    }
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// One running dashboard view.
#[derive(Debug)]
pub struct Dashboard<B> {
    backend: Arc<B>,
    user: CurrentUser,
    state: DashboardState,
    toasts: ToastQueue,
    renderer: Renderer,
}

impl<B: Backend> Dashboard<B> {
    /// Creates an empty dashboard for `user`. Call [`reload`](Self::reload)
    /// before rendering.
    #[must_use]
    pub fn new(backend: Arc<B>, user: CurrentUser) -> Self {
        Self {
            backend,
            user,
            state: DashboardState::default(),
            toasts: ToastQueue::default(),
            renderer: Renderer::default(),
        }
    }

    /// Replaces the renderer (date formats).
    #[must_use]
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    /// Sets how long toasts stay visible.
    #[must_use]
    pub fn with_toast_ttl(mut self, ttl: Duration) -> Self {
        self.toasts = ToastQueue::new(ttl);
        self
    }

    /// The backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &CurrentUser {
        &self.user
    }

    /// Current snapshot.
    #[must_use]
    pub const fn state(&self) -> &DashboardState {
        &self.state
    }

    /// Toasts raised so far.
    #[must_use]
    pub const fn toasts(&self) -> &ToastQueue {
        &self.toasts
    }

    /// Mutable toast queue.
    pub const fn toasts_mut(&mut self) -> &mut ToastQueue {
        &mut self.toasts
    }

    /// Whether this is the lead view.
    #[must_use]
    pub const fn is_lead(&self) -> bool {
        matches!(self.user.role, Role::Lead)
    }

    /// Fetches every collection the view shows, concurrently.
    ///
    /// Lead: members, created tasks and notifications. Member: assigned
    /// tasks and notifications. If any fetch fails the whole group is
    /// abandoned, one error toast is raised and the previous state is
    /// kept.
    ///
    /// # Errors
    ///
    /// Returns the first fetch failure.
    pub async fn reload(&mut self) -> Result<(), AppError> {
        let backend = self.backend.as_ref();
        let id = self.user.id;
        let fetched = match self.user.role {
            Role::Lead => tokio::try_join!(
                backend.members(),
                backend.created_tasks(id),
                backend.notifications(id)
            )
            .map(|(members, tasks, notifications)| (Some(members), tasks, notifications)),
            Role::Member => {
                tokio::try_join!(backend.assigned_tasks(id), backend.notifications(id))
                    .map(|(tasks, notifications)| (None, tasks, notifications))
            }
        };

        match fetched {
            Ok((members, tasks, notifications)) => {
                if let Some(members) = members {
                    self.state.replace_members(members);
                }
                self.state.replace_tasks(tasks);
                self.state.replace_notifications(notifications);
                tracing::debug!(
                    role = %self.user.role,
                    members = self.state.members.len(),
                    tasks = self.state.tasks.len(),
                    notifications = self.state.notifications.len(),
                    "dashboard reloaded"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "dashboard reload failed");
                self.toasts.push(ToastKind::Error, LOAD_ERROR_MESSAGE);
                Err(e.into())
            }
        }
    }

    /// Re-fetches only the notification list. On failure the list stays
    /// in place and an error toast is raised.
    ///
    /// # Errors
    ///
    /// Returns the fetch failure.
    pub async fn refresh_notifications(&mut self) -> Result<(), AppError> {
        match self.backend.notifications(self.user.id).await {
            Ok(list) => {
                self.state.replace_notifications(list);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "notification refresh failed");
                self.toasts.push(ToastKind::Error, NOTIFICATIONS_ERROR_MESSAGE);
                Err(e.into())
            }
        }
    }

    /// Applies one event from the notification poller. A rise in the
    /// unread count raises an info toast; errors keep the previous list.
    pub fn apply_poll_event(&mut self, event: PollEvent) {
        match event {
            PollEvent::Notifications(list) => {
                let before = self.state.unread_count();
                self.state.replace_notifications(list);
                let after = self.state.unread_count();
                if after > before {
                    tracing::info!(unread = after, "new unread notifications");
                    self.toasts.push(
                        ToastKind::Info,
                        format!("You have {after} unread notification(s)"),
                    );
                }
            }
            PollEvent::Error(reason) => {
                tracing::debug!(%reason, "keeping previous notifications");
            }
        }
    }

    /// Lead stat card figures.
    #[must_use]
    pub fn lead_stats(&self) -> LeadStats {
        LeadStats::compute(&self.state.members, &self.state.tasks)
    }

    /// Member stat card figures.
    #[must_use]
    pub fn member_stats(&self) -> MemberStats {
        MemberStats::compute(&self.state.tasks)
    }

    /// Renders the full page for the current view, with the toasts still
    /// visible now.
    #[must_use]
    pub fn render(&self) -> String {
        self.render_at(Instant::now())
    }

    /// Renders the full page with the toasts visible at `now`.
    #[must_use]
    pub fn render_at(&self, now: Instant) -> String {
        let r = &self.renderer;
        let header = format!(
            "{}{}{}",
            r.welcome(&self.user),
            r.unread_badge(self.state.unread_count()),
            r.toasts(self.toasts.active(now)),
        );
        let body = if self.is_lead() {
            r.lead_body(
                &self.lead_stats(),
                &view::join(&self.state.tasks, &self.state.members),
                &view::tasks_per_member(&self.state.tasks, &self.state.members),
                &self.state.members,
            )
        } else {
            r.member_body(
                &self.member_stats(),
                &view::sort_for_member(&self.state.tasks),
            )
        };
        let notifications = format!(
            r#"<section class="notifications"><h2>Notifications</h2>{}</section>"#,
            r.notifications(&self.state.notifications)
        );
        let title = if self.is_lead() {
            "Team Lead Dashboard"
        } else {
            "My Dashboard"
        };
        r.page(title, &header, &format!("{body}{notifications}"))
    }

    /// Details panel for a loaded task, `None` if it is not on this view.
    #[must_use]
    pub fn render_task_details(&self, id: TaskId) -> Option<String> {
        let task = self.state.task(id)?;
        let assignee = self
            .is_lead()
            .then(|| render::assignee_label(task, &self.state.members));
        Some(self.renderer.task_details(task, assignee))
    }

    /// Starts polling this user's notifications.
    #[must_use]
    pub fn spawn_poller(&self, period: Duration) -> (PollHandle, mpsc::Receiver<PollEvent>)
    where
        B: 'static,
    {
        NotificationPoller::spawn(Arc::clone(&self.backend), self.user.id, period)
    }
}
