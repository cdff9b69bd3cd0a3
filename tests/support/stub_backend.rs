//! In-process HTTP stub of the task API for integration tests.
//!
//! Serves the consumed routes with `axum`, delegating every call to a
//! shared [`LoopbackBackend`] so tests can seed data, inject failures and
//! inspect calls while the client under test talks real HTTP.

#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use taskdesk::api::http::HttpBackend;
use taskdesk::api::loopback::LoopbackBackend;
use taskdesk::api::{ApiError, Backend};
use taskdesk_proto::model::{Notification, NotificationId, Task, TaskId, User, UserId};
use taskdesk_proto::request::{
    ApiErrorBody, ApproveRequest, CompleteRequest, HealthStatus, NewTask, NewUser,
};

type Shared = Arc<LoopbackBackend>;

/// Maps loopback errors onto the real API's responses.
struct StubError(ApiError);

impl From<ApiError> for StubError {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let code = |status: u16| {
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        };
        match self.0 {
            ApiError::Rejected {
                status, message, ..
            } => (code(status), Json(ApiErrorBody { error: message })).into_response(),
            ApiError::Status { status, .. } => (code(status), "unavailable").into_response(),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()).into_response(),
        }
    }
}

type StubResult<T> = Result<Json<T>, StubError>;

#[derive(Deserialize)]
struct UserQuery {
    user_id: UserId,
}

#[derive(serde::Serialize)]
struct Message {
    message: &'static str,
}

fn ok(message: &'static str) -> Json<Message> {
    Json(Message { message })
}

async fn members(State(b): State<Shared>) -> StubResult<Vec<User>> {
    Ok(Json(b.members().await?))
}

async fn created(State(b): State<Shared>, Query(q): Query<UserQuery>) -> StubResult<Vec<Task>> {
    Ok(Json(b.created_tasks(q.user_id).await?))
}

async fn assigned(State(b): State<Shared>, Query(q): Query<UserQuery>) -> StubResult<Vec<Task>> {
    Ok(Json(b.assigned_tasks(q.user_id).await?))
}

async fn create_user(
    State(b): State<Shared>,
    Json(body): Json<NewUser>,
) -> Result<(StatusCode, Json<User>), StubError> {
    Ok((StatusCode::CREATED, Json(b.create_user(&body).await?)))
}

async fn assign(
    State(b): State<Shared>,
    Json(body): Json<NewTask>,
) -> Result<(StatusCode, Json<Task>), StubError> {
    Ok((StatusCode::CREATED, Json(b.assign_task(&body).await?)))
}

async fn approve(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<ApproveRequest>,
) -> StubResult<Message> {
    b.approve_task(TaskId(id), body.user_id).await?;
    Ok(ok("Task approved successfully"))
}

async fn complete(
    State(b): State<Shared>,
    Path(id): Path<i64>,
    Json(body): Json<CompleteRequest>,
) -> StubResult<Message> {
    b.complete_task(TaskId(id), &body.result).await?;
    Ok(ok("Task completed successfully"))
}

async fn delete_task(State(b): State<Shared>, Path(id): Path<i64>) -> StubResult<Message> {
    b.delete_task(TaskId(id)).await?;
    Ok(ok("Task deleted successfully"))
}

async fn delete_user(State(b): State<Shared>, Path(id): Path<i64>) -> StubResult<Message> {
    b.delete_user(UserId(id)).await?;
    Ok(ok("User deleted successfully"))
}

async fn notifications(
    State(b): State<Shared>,
    Path(id): Path<i64>,
) -> StubResult<Vec<Notification>> {
    Ok(Json(b.notifications(UserId(id)).await?))
}

async fn mark_read(State(b): State<Shared>, Path(id): Path<i64>) -> StubResult<Message> {
    b.mark_notification_read(NotificationId(id)).await?;
    Ok(ok("Notification marked as read"))
}

async fn health(State(b): State<Shared>) -> StubResult<HealthStatus> {
    Ok(Json(b.health().await?))
}

/// Router serving every consumed route from `backend`.
pub fn router(backend: Shared) -> Router {
    Router::new()
        .route("/api/users/members", get(members))
        .route("/api/users", post(create_user))
        .route("/api/users/{id}", delete(delete_user))
        .route("/api/tasks/created", get(created))
        .route("/api/tasks/assigned", get(assigned))
        .route("/api/tasks/assign", post(assign))
        .route("/api/tasks/{id}", delete(delete_task))
        .route("/api/tasks/{id}/approve", put(approve))
        .route("/api/tasks/{id}/complete", put(complete))
        .route("/api/notifications/{id}", get(notifications))
        .route("/api/notifications/{id}/read", put(mark_read))
        .route("/api/health", get(health))
        .with_state(backend)
}

/// A running stub server.
pub struct StubServer {
    /// Data behind the server.
    pub store: Shared,
    /// Bound address.
    pub addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl StubServer {
    /// Starts a server on an ephemeral loopback port.
    pub async fn start(store: LoopbackBackend) -> Self {
        let store = Arc::new(store);
        let app = router(Arc::clone(&store));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub server");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "stub server error");
            }
        });
        Self {
            store,
            addr,
            handle,
        }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// HTTP client pointed at this server.
    pub fn client(&self) -> HttpBackend {
        HttpBackend::new(&self.url(), Duration::from_secs(5)).expect("client")
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
