//! Error taxonomy for the dashboards.
//!
//! Three families reach the user:
//! - [`AuthError`]: the session does not grant the view. Unrecoverable
//!   locally; the caller redirects to the login page.
//! - [`ApiError`]: the backend could not be reached or refused a request.
//!   Logged and toasted; previously fetched state is kept.
//! - [`ValidationError`]: a form, role or state check failed, or the
//!   backend rejected the input with a message. Toasted; the form stays
//!   open for correction.
//!
//! [`AppError`] wraps all three. Only [`AppError::Auth`] is fatal.

use taskdesk_proto::model::{Role, TaskId, TaskStatus};

pub use crate::api::ApiError;

/// Login page every authentication failure redirects to.
pub const LOGIN_PATH: &str = "/login";

/// The stored session does not grant access to the requested view.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// `isAuthenticated` is missing or not `"true"`.
    #[error("not signed in")]
    NotAuthenticated,

    /// The stored role differs from the one the view requires.
    #[error("this view requires the {required} role (session has {found:?})")]
    WrongRole {
        /// Role the view requires.
        required: Role,
        /// Raw `userRole` value found in the session.
        found: Option<String>,
    },

    /// `userId` is missing or not an integer.
    #[error("session user id is invalid: {0:?}")]
    InvalidUserId(Option<String>),
}

impl AuthError {
    /// Where the caller must send the user.
    #[must_use]
    pub const fn redirect_to(&self) -> &'static str {
        LOGIN_PATH
    }
}

/// A client-side check failed, or the backend rejected the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required form field is empty.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// The assign form has no member selected.
    #[error("Please select a team member")]
    NoAssignee,

    /// The action is not available to the current role.
    #[error("{action} is not available to a team {role}")]
    NotPermitted {
        /// The refused action.
        action: &'static str,
        /// The current user's role.
        role: Role,
    },

    /// The task's current status does not allow the action.
    #[error("cannot {action} task {task} while it is {status}")]
    InvalidTransition {
        /// The task.
        task: TaskId,
        /// Its current status.
        status: TaskStatus,
        /// The refused action.
        action: &'static str,
    },

    /// The task is not in the loaded collection.
    #[error("task {0} is not on this dashboard")]
    UnknownTask(TaskId),

    /// The backend refused the input and said why.
    #[error("{message}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Message from the `{error}` body.
        message: String,
    },
}

/// Umbrella error for dashboard operations.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Session check failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Backend unreachable or failing.
    #[error(transparent)]
    Network(ApiError),

    /// Input or state check failed.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl AppError {
    /// Whether the page cannot continue (only authentication failures).
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Text for an error toast. Validation errors speak for themselves;
    /// network failures use the caller's generic message.
    #[must_use]
    pub fn toast_message(&self, fallback: &str) -> String {
        match self {
            Self::Validation(e) => e.to_string(),
            Self::Auth(_) | Self::Network(_) => fallback.to_string(),
        }
    }
}

impl From<ApiError> for AppError {
    /// Client errors carrying a server message become validation errors;
    /// everything else is a network failure.
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Rejected {
                status, message, ..
            } if (400..500).contains(&status) => {
                Self::Validation(ValidationError::Rejected { status, message })
            }
            other => Self::Network(other),
        }
    }
}
