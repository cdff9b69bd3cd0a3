//! Backend access for the dashboards.
//!
//! Defines the [`Backend`] trait every data source must satisfy.
//! Implementations:
//! - [`http::HttpBackend`]: JSON over HTTP via `reqwest`
//! - [`loopback::LoopbackBackend`]: in-process store for tests and the
//!   offline demo mode

pub mod http;
pub mod loopback;

use std::future::Future;

use taskdesk_proto::endpoint::Endpoint;
use taskdesk_proto::model::{Notification, NotificationId, Task, TaskId, User, UserId};
use taskdesk_proto::request::{HealthStatus, NewTask, NewUser};

/// Errors from a single backend request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request {endpoint} failed: {source}")]
    Network {
        /// The route that was called.
        endpoint: Endpoint,
        /// Underlying client error.
        source: reqwest::Error,
    },

    /// Non-success status without a readable `{error}` body.
    #[error("{endpoint} returned status {status}")]
    Status {
        /// The route that was called.
        endpoint: Endpoint,
        /// HTTP status code.
        status: u16,
    },

    /// Non-success status with the backend's explanation.
    #[error("{endpoint} rejected ({status}): {message}")]
    Rejected {
        /// The route that was called.
        endpoint: Endpoint,
        /// HTTP status code.
        status: u16,
        /// Message from the `{error}` body.
        message: String,
    },

    /// The response body was not the expected JSON.
    #[error("could not decode {endpoint} response: {reason}")]
    Decode {
        /// The route that was called.
        endpoint: Endpoint,
        /// Decoder message.
        reason: String,
    },

    /// The configured backend URL cannot be used.
    #[error("invalid backend url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The HTTP client could not be constructed.
    #[error("http client setup failed: {0}")]
    Client(reqwest::Error),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Async access to the task backend.
///
/// One method per consumed route. Collection fetches return the whole
/// collection; callers replace their cached copy wholesale. Mutations
/// send exactly one request and never retry.
pub trait Backend: Send + Sync {
    /// `GET /api/users/members`
    fn members(&self) -> impl Future<Output = Result<Vec<User>, ApiError>> + Send;

    /// `GET /api/tasks/created?user_id=`: tasks assigned by a lead.
    fn created_tasks(
        &self,
        lead: UserId,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /api/tasks/assigned?user_id=`: tasks assigned to a member.
    fn assigned_tasks(
        &self,
        member: UserId,
    ) -> impl Future<Output = Result<Vec<Task>, ApiError>> + Send;

    /// `GET /api/notifications/{user_id}`, newest first.
    fn notifications(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<Notification>, ApiError>> + Send;

    /// `POST /api/users`
    fn create_user(&self, user: &NewUser) -> impl Future<Output = Result<User, ApiError>> + Send;

    /// `POST /api/tasks/assign`
    fn assign_task(&self, task: &NewTask) -> impl Future<Output = Result<Task, ApiError>> + Send;

    /// `PUT /api/tasks/{id}/approve`
    fn approve_task(
        &self,
        task: TaskId,
        lead: UserId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PUT /api/tasks/{id}/complete`
    fn complete_task(
        &self,
        task: TaskId,
        result: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/tasks/{id}`
    fn delete_task(&self, task: TaskId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `DELETE /api/users/{id}`
    fn delete_user(&self, user: UserId) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `PUT /api/notifications/{id}/read`
    fn mark_notification_read(
        &self,
        id: NotificationId,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// `GET /api/health`
    fn health(&self) -> impl Future<Output = Result<HealthStatus, ApiError>> + Send;
}
