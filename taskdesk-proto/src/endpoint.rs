//! Routes consumed by the dashboards.
//!
//! Every request the client makes is described by one [`Endpoint`] value,
//! which knows its HTTP method and its path (including query string)
//! relative to the backend origin.

use std::fmt;

use crate::model::{NotificationId, TaskId, UserId};

/// Path prefix of the JSON API.
pub const API_PREFIX: &str = "/api";

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// A backend route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `GET /api/users/members`
    Members,
    /// `GET /api/tasks/created?user_id=`
    CreatedTasks(UserId),
    /// `GET /api/tasks/assigned?user_id=`
    AssignedTasks(UserId),
    /// `POST /api/users`
    CreateUser,
    /// `POST /api/tasks/assign`
    AssignTask,
    /// `PUT /api/tasks/{id}/approve`
    ApproveTask(TaskId),
    /// `PUT /api/tasks/{id}/complete`
    CompleteTask(TaskId),
    /// `DELETE /api/tasks/{id}`
    DeleteTask(TaskId),
    /// `DELETE /api/users/{id}`
    DeleteUser(UserId),
    /// `GET /api/notifications/{user_id}`
    Notifications(UserId),
    /// `PUT /api/notifications/{id}/read`
    MarkNotificationRead(NotificationId),
    /// `GET /api/health`
    Health,
}

impl Endpoint {
    /// HTTP method for this route.
    #[must_use]
    pub const fn method(&self) -> Method {
        match self {
            Self::Members
            | Self::CreatedTasks(_)
            | Self::AssignedTasks(_)
            | Self::Notifications(_)
            | Self::Health => Method::Get,
            Self::CreateUser | Self::AssignTask => Method::Post,
            Self::ApproveTask(_) | Self::CompleteTask(_) | Self::MarkNotificationRead(_) => {
                Method::Put
            }
            Self::DeleteTask(_) | Self::DeleteUser(_) => Method::Delete,
        }
    }

    /// Stable short name, used in logs and for matching routes by kind.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::CreatedTasks(_) => "created_tasks",
            Self::AssignedTasks(_) => "assigned_tasks",
            Self::CreateUser => "create_user",
            Self::AssignTask => "assign_task",
            Self::ApproveTask(_) => "approve_task",
            Self::CompleteTask(_) => "complete_task",
            Self::DeleteTask(_) => "delete_task",
            Self::DeleteUser(_) => "delete_user",
            Self::Notifications(_) => "notifications",
            Self::MarkNotificationRead(_) => "mark_notification_read",
            Self::Health => "health",
        }
    }

    /// Whether the route changes backend state.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        !matches!(self.method(), Method::Get)
    }

    /// Path and query, starting with [`API_PREFIX`].
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Members => format!("{API_PREFIX}/users/members"),
            Self::CreatedTasks(user) => format!("{API_PREFIX}/tasks/created?user_id={user}"),
            Self::AssignedTasks(user) => format!("{API_PREFIX}/tasks/assigned?user_id={user}"),
            Self::CreateUser => format!("{API_PREFIX}/users"),
            Self::AssignTask => format!("{API_PREFIX}/tasks/assign"),
            Self::ApproveTask(task) => format!("{API_PREFIX}/tasks/{task}/approve"),
            Self::CompleteTask(task) => format!("{API_PREFIX}/tasks/{task}/complete"),
            Self::DeleteTask(task) => format!("{API_PREFIX}/tasks/{task}"),
            Self::DeleteUser(user) => format!("{API_PREFIX}/users/{user}"),
            Self::Notifications(user) => format!("{API_PREFIX}/notifications/{user}"),
            Self::MarkNotificationRead(id) => format!("{API_PREFIX}/notifications/{id}/read"),
            Self::Health => format!("{API_PREFIX}/health"),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method(), self.path())
    }
}
