//! Entity types returned by the backend: users, tasks and notifications.
//!
//! Field names follow the backend's JSON exactly. Timestamps stay as the
//! ISO-8601 strings the backend sends; use the accessor methods (backed by
//! [`crate::time::parse_timestamp`]) when a typed value is needed.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::time::parse_timestamp;

/// Error returned when a string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownVariant {
    /// Which enum was being parsed (e.g. "role").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Returns the raw integer id.
            #[must_use]
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

id_newtype!(
    /// Database id of a [`User`].
    UserId
);
id_newtype!(
    /// Database id of a [`Task`].
    TaskId
);
id_newtype!(
    /// Database id of a [`Notification`].
    NotificationId
);

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Role of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Team lead: creates members, assigns and approves tasks.
    Lead,
    /// Team member: completes tasks assigned to them.
    #[default]
    Member,
}

impl Role {
    /// Wire representation (`"lead"` / `"member"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lead" => Ok(Self::Lead),
            "member" => Ok(Self::Member),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// A user account as listed by `/api/users/members`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Database id.
    pub id: UserId,
    /// Unique login name.
    pub username: String,
    /// Display name.
    pub full_name: String,
    /// Contact address.
    pub email: String,
    /// Account role.
    #[serde(default)]
    pub role: Role,
    /// Creation timestamp, when the backend includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Lifecycle state of a task.
///
/// Transitions only move forward: `Pending | InProgress -> Completed ->
/// Approved`. Deletion removes the task from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Assigned, not yet started.
    Pending,
    /// Being worked on.
    InProgress,
    /// Finished by the assignee, awaiting approval.
    Completed,
    /// Approved by the lead. Terminal for the member.
    Approved,
}

impl TaskStatus {
    /// All statuses in rank order.
    pub const ALL: [Self; 4] = [
        Self::Pending,
        Self::InProgress,
        Self::Completed,
        Self::Approved,
    ];

    /// Sort rank used by the member dashboard (pending first).
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Pending => 1,
            Self::InProgress => 2,
            Self::Completed => 3,
            Self::Approved => 4,
        }
    }

    /// Wire representation, also used as a CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Approved => "approved",
        }
    }

    /// Human-readable label (`"in progress"`).
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in progress",
            Self::Completed => "completed",
            Self::Approved => "approved",
        }
    }

    /// Whether the work on this task is finished (completed or approved).
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Approved)
    }

    /// Whether the task is still open (pending or in progress).
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownVariant {
                kind: "task status",
                value: s.to_string(),
            })
    }
}

/// Task priority. The backend defaults to `medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Wire representation, also used as a CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// A task as returned by the task endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Database id.
    pub id: TaskId,
    /// Short title.
    pub title: String,
    /// Optional free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// Current lifecycle state.
    pub status: TaskStatus,
    /// Priority.
    #[serde(default)]
    pub priority: Priority,
    /// Assignee, if any.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Lead who assigned the task.
    #[serde(default)]
    pub assigned_by: Option<UserId>,
    /// Optional due date (ISO-8601).
    #[serde(default)]
    pub due_date: Option<String>,
    /// Result text submitted on completion.
    #[serde(default)]
    pub result: Option<String>,
    /// Creation timestamp (ISO-8601).
    pub created_at: String,
    /// Completion timestamp (ISO-8601), set once completed.
    #[serde(default)]
    pub completed_at: Option<String>,
    /// Legacy completion flag mirrored by the backend.
    #[serde(default)]
    pub completed: bool,
    /// Legacy approval flag mirrored by the backend.
    #[serde(default)]
    pub approved: bool,
}

impl Task {
    /// Parsed due date, `None` when absent or unparsable.
    #[must_use]
    pub fn due_at(&self) -> Option<NaiveDateTime> {
        self.due_date.as_deref().and_then(parse_timestamp)
    }

    /// Parsed creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }

    /// Parsed completion timestamp.
    #[must_use]
    pub fn completed_at(&self) -> Option<NaiveDateTime> {
        self.completed_at.as_deref().and_then(parse_timestamp)
    }

    /// A finished task must carry its completion time.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        !self.status.is_done() || self.completed_at.is_some()
    }

    /// The assignee may submit a result.
    #[must_use]
    pub const fn can_complete(&self) -> bool {
        self.status.is_open()
    }

    /// The lead may approve.
    #[must_use]
    pub const fn can_approve(&self) -> bool {
        matches!(self.status, TaskStatus::Completed)
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// A per-user notification created by the backend on task events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Database id.
    pub id: NotificationId,
    /// Recipient.
    pub user_id: UserId,
    /// Task the event refers to, if any.
    #[serde(default)]
    pub task_id: Option<TaskId>,
    /// Message text.
    pub message: String,
    /// Whether the recipient has seen it.
    #[serde(default)]
    pub read: bool,
    /// Creation timestamp (ISO-8601).
    pub created_at: String,
}

impl Notification {
    /// Parsed creation timestamp.
    #[must_use]
    pub fn created_at(&self) -> Option<NaiveDateTime> {
        parse_timestamp(&self.created_at)
    }
}
