//! Request and response bodies for the mutating endpoints.

use serde::{Deserialize, Serialize};

use crate::model::{Priority, Role, UserId};

/// Body of `POST /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    /// Unique login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Account role; members unless stated otherwise.
    #[serde(default)]
    pub role: Role,
}

/// Body of `POST /api/tasks/assign`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    /// Short title.
    pub title: String,
    /// Free-text description (may be empty).
    #[serde(default)]
    pub description: String,
    /// Member receiving the task.
    pub assigned_to: UserId,
    /// Lead assigning the task.
    pub assigned_by: UserId,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Optional due date. Omitted from the body when unset, since the
    /// backend parses the field whenever the key is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
}

/// Body of `PUT /api/tasks/{id}/approve`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveRequest {
    /// The approving lead.
    pub user_id: UserId,
}

/// Body of `PUT /api/tasks/{id}/complete`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteRequest {
    /// What the assignee produced.
    pub result: String,
}

/// Error body the backend attaches to 4xx/5xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    /// Human-readable reason.
    pub error: String,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` when the API is up.
    pub status: String,
    /// Optional detail.
    #[serde(default)]
    pub message: Option<String>,
}

impl HealthStatus {
    /// Whether the backend reported itself healthy.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self.status.as_str(), "ok" | "healthy" | "ready")
    }
}
