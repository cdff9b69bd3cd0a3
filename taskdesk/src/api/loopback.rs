//! In-process backend for testing and offline demos.
//!
//! [`LoopbackBackend`] keeps users, tasks and notifications in memory and
//! answers every [`Backend`] call the way the REST API does: the same
//! status codes and `{error}` messages, a notification on each task event,
//! and deletion of a user's assigned tasks when the user is deleted.
//! Individual routes can be made to fail with [`LoopbackBackend::fail`] to
//! exercise error paths, and every call is recorded for inspection.

use std::collections::HashSet;

use chrono::Utc;
use parking_lot::Mutex;

use taskdesk_proto::endpoint::Endpoint;
use taskdesk_proto::model::{
    Notification, NotificationId, Priority, Role, Task, TaskId, TaskStatus, User, UserId,
};
use taskdesk_proto::request::{HealthStatus, NewTask, NewUser};

use super::{ApiError, Backend};

/// Status returned for routes switched to failing mode.
const INJECTED_FAILURE_STATUS: u16 = 503;

#[derive(Debug, Default)]
struct Store {
    users: Vec<User>,
    tasks: Vec<Task>,
    notifications: Vec<Notification>,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn notify(&mut self, user_id: UserId, task_id: TaskId, message: String) {
        let id = NotificationId(self.next_id());
        self.notifications.push(Notification {
            id,
            user_id,
            task_id: Some(task_id),
            message,
            read: false,
            created_at: now(),
        });
    }

    fn user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    fn task_mut(&mut self, endpoint: Endpoint, id: TaskId) -> Result<&mut Task, ApiError> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| rejected(endpoint, 404, "Task not found"))
    }
}

/// Thread-safe in-memory backend.
#[derive(Debug, Default)]
pub struct LoopbackBackend {
    store: Mutex<Store>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<Endpoint>>,
}

fn now() -> String {
    Utc::now()
        .naive_utc()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

fn rejected(endpoint: Endpoint, status: u16, message: &str) -> ApiError {
    ApiError::Rejected {
        endpoint,
        status,
        message: message.to_string(),
    }
}

impl LoopbackBackend {
    /// Creates an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a backend seeded with one lead (id 1), two members and a
    /// handful of tasks in every status. Used by the CLI's demo mode.
    #[must_use]
    pub fn demo() -> Self {
        let backend = Self::new();
        let lead = backend.insert_user("lead", "Dana Lead", Role::Lead);
        let ana = backend.insert_user("ana", "Ana Member", Role::Member);
        let ben = backend.insert_user("ben", "Ben Member", Role::Member);
        backend.insert_task(
            "Draft release notes",
            TaskStatus::Pending,
            ana,
            lead,
            Some("2024-07-01"),
        );
        backend.insert_task(
            "Fix login redirect",
            TaskStatus::InProgress,
            ana,
            lead,
            None,
        );
        backend.insert_task(
            "Review <script> handling",
            TaskStatus::Completed,
            ben,
            lead,
            Some("2024-06-15"),
        );
        backend.insert_task("Rotate API keys", TaskStatus::Approved, ben, lead, None);
        backend
    }

    /// Inserts a user directly, bypassing validation. Returns its id.
    pub fn insert_user(&self, username: &str, full_name: &str, role: Role) -> UserId {
        let mut store = self.store.lock();
        let id = UserId(store.next_id());
        store.users.push(User {
            id,
            username: username.to_string(),
            full_name: full_name.to_string(),
            email: format!("{username}@example.com"),
            role,
            created_at: Some(now()),
        });
        id
    }

    /// Inserts a task directly in the given status. Returns its id.
    pub fn insert_task(
        &self,
        title: &str,
        status: TaskStatus,
        assigned_to: UserId,
        assigned_by: UserId,
        due_date: Option<&str>,
    ) -> TaskId {
        let mut store = self.store.lock();
        let id = TaskId(store.next_id());
        let done = status.is_done();
        store.tasks.push(Task {
            id,
            title: title.to_string(),
            description: None,
            status,
            priority: Priority::default(),
            assigned_to: Some(assigned_to),
            assigned_by: Some(assigned_by),
            due_date: due_date.map(str::to_string),
            result: done.then(|| "done".to_string()),
            created_at: now(),
            completed_at: done.then(now),
            completed: done,
            approved: status == TaskStatus::Approved,
        });
        id
    }

    /// Inserts a notification directly. Returns its id.
    pub fn insert_notification(
        &self,
        user_id: UserId,
        message: &str,
        read: bool,
    ) -> NotificationId {
        let mut store = self.store.lock();
        let id = NotificationId(store.next_id());
        store.notifications.push(Notification {
            id,
            user_id,
            task_id: None,
            message: message.to_string(),
            read,
            created_at: now(),
        });
        id
    }

    /// Makes every call to routes named like `endpoint` fail with 503.
    pub fn fail(&self, endpoint: &Endpoint) {
        self.failing.lock().insert(endpoint.name());
    }

    /// Undoes [`fail`](Self::fail).
    pub fn recover(&self, endpoint: &Endpoint) {
        self.failing.lock().remove(endpoint.name());
    }

    /// Every call made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().clone()
    }

    /// Number of mutating calls made so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.calls.lock().iter().filter(|e| e.is_mutation()).count()
    }

    /// Snapshot of all tasks.
    #[must_use]
    pub fn tasks(&self) -> Vec<Task> {
        self.store.lock().tasks.clone()
    }

    /// Snapshot of all users.
    #[must_use]
    pub fn users(&self) -> Vec<User> {
        self.store.lock().users.clone()
    }

    fn enter(&self, endpoint: Endpoint) -> Result<(), ApiError> {
        self.calls.lock().push(endpoint);
        if self.failing.lock().contains(endpoint.name()) {
            tracing::debug!(%endpoint, "injected failure");
            return Err(ApiError::Status {
                endpoint,
                status: INJECTED_FAILURE_STATUS,
            });
        }
        Ok(())
    }
}

impl Backend for LoopbackBackend {
    async fn members(&self) -> Result<Vec<User>, ApiError> {
        self.enter(Endpoint::Members)?;
        let store = self.store.lock();
        Ok(store
            .users
            .iter()
            .filter(|u| u.role == Role::Member)
            .cloned()
            .collect())
    }

    async fn created_tasks(&self, lead: UserId) -> Result<Vec<Task>, ApiError> {
        self.enter(Endpoint::CreatedTasks(lead))?;
        let store = self.store.lock();
        Ok(store
            .tasks
            .iter()
            .filter(|t| t.assigned_by == Some(lead))
            .cloned()
            .collect())
    }

    async fn assigned_tasks(&self, member: UserId) -> Result<Vec<Task>, ApiError> {
        self.enter(Endpoint::AssignedTasks(member))?;
        let store = self.store.lock();
        Ok(store
            .tasks
            .iter()
            .filter(|t| t.assigned_to == Some(member))
            .cloned()
            .collect())
    }

    async fn notifications(&self, user: UserId) -> Result<Vec<Notification>, ApiError> {
        self.enter(Endpoint::Notifications(user))?;
        let store = self.store.lock();
        let mut list: Vec<Notification> = store
            .notifications
            .iter()
            .filter(|n| n.user_id == user)
            .cloned()
            .collect();
        // Newest first; ids grow monotonically so they break timestamp ties.
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(list)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ApiError> {
        let endpoint = Endpoint::CreateUser;
        self.enter(endpoint)?;
        if user.username.is_empty() || user.email.is_empty() || user.full_name.is_empty() {
            return Err(rejected(endpoint, 400, "Missing required fields"));
        }
        let mut store = self.store.lock();
        if store
            .users
            .iter()
            .any(|u| u.username == user.username || u.email == user.email)
        {
            return Err(rejected(endpoint, 409, "Username or email already exists"));
        }
        let created = User {
            id: UserId(store.next_id()),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: Some(now()),
        };
        store.users.push(created.clone());
        Ok(created)
    }

    async fn assign_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let endpoint = Endpoint::AssignTask;
        self.enter(endpoint)?;
        if task.title.is_empty() {
            return Err(rejected(endpoint, 400, "Missing required fields"));
        }
        let mut store = self.store.lock();
        if store.user(task.assigned_by).map(|u| u.role) != Some(Role::Lead) {
            return Err(rejected(endpoint, 403, "Only team leads can assign tasks"));
        }
        if store.user(task.assigned_to).is_none() {
            return Err(rejected(endpoint, 404, "Assignee not found"));
        }
        let created = Task {
            id: TaskId(store.next_id()),
            title: task.title.clone(),
            description: Some(task.description.clone()).filter(|d| !d.is_empty()),
            status: TaskStatus::Pending,
            priority: task.priority,
            assigned_to: Some(task.assigned_to),
            assigned_by: Some(task.assigned_by),
            due_date: task.due_date.clone(),
            result: None,
            created_at: now(),
            completed_at: None,
            completed: false,
            approved: false,
        };
        store.tasks.push(created.clone());
        store.notify(
            task.assigned_to,
            created.id,
            format!("New task assigned: {}", created.title),
        );
        Ok(created)
    }

    async fn approve_task(&self, task: TaskId, lead: UserId) -> Result<(), ApiError> {
        let endpoint = Endpoint::ApproveTask(task);
        self.enter(endpoint)?;
        let mut store = self.store.lock();
        store.task_mut(endpoint, task)?;
        if store.user(lead).map(|u| u.role) != Some(Role::Lead) {
            return Err(rejected(endpoint, 403, "Only team leads can approve tasks"));
        }
        let found = store.task_mut(endpoint, task)?;
        found.status = TaskStatus::Approved;
        found.approved = true;
        let (assignee, title) = (found.assigned_to, found.title.clone());
        if let Some(assignee) = assignee {
            store.notify(assignee, task, format!("Task '{title}' has been approved"));
        }
        Ok(())
    }

    async fn complete_task(&self, task: TaskId, result: &str) -> Result<(), ApiError> {
        let endpoint = Endpoint::CompleteTask(task);
        self.enter(endpoint)?;
        let mut store = self.store.lock();
        let found = store.task_mut(endpoint, task)?;
        found.status = TaskStatus::Completed;
        found.completed = true;
        found.result = Some(result.to_string());
        found.completed_at = Some(now());
        let (lead, title) = (found.assigned_by, found.title.clone());
        if let Some(lead) = lead {
            store.notify(
                lead,
                task,
                format!("Task '{title}' has been completed by team member"),
            );
        }
        Ok(())
    }

    async fn delete_task(&self, task: TaskId) -> Result<(), ApiError> {
        let endpoint = Endpoint::DeleteTask(task);
        self.enter(endpoint)?;
        let mut store = self.store.lock();
        let before = store.tasks.len();
        store.tasks.retain(|t| t.id != task);
        if store.tasks.len() == before {
            return Err(rejected(endpoint, 404, "Task not found"));
        }
        Ok(())
    }

    async fn delete_user(&self, user: UserId) -> Result<(), ApiError> {
        let endpoint = Endpoint::DeleteUser(user);
        self.enter(endpoint)?;
        let mut store = self.store.lock();
        if store.user(user).is_none() {
            return Err(rejected(endpoint, 404, "User not found"));
        }
        store.users.retain(|u| u.id != user);
        store.tasks.retain(|t| t.assigned_to != Some(user));
        store.notifications.retain(|n| n.user_id != user);
        Ok(())
    }

    async fn mark_notification_read(&self, id: NotificationId) -> Result<(), ApiError> {
        let endpoint = Endpoint::MarkNotificationRead(id);
        self.enter(endpoint)?;
        let mut store = self.store.lock();
        let notification = store
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| rejected(endpoint, 404, "Notification not found"))?;
        notification.read = true;
        Ok(())
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.enter(Endpoint::Health)?;
        Ok(HealthStatus {
            status: "ok".to_string(),
            message: Some("API is running".to_string()),
        })
    }
}
