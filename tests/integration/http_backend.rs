//! Integration tests for the HTTP client.
//!
//! Runs `HttpBackend` against an in-process stub of the REST API and checks
//! request shapes, status mapping and error bodies over a real socket.

#![allow(clippy::expect_used, clippy::unwrap_used)]

#[path = "../support/stub_backend.rs"]
mod stub_backend;

use std::time::Duration;

use stub_backend::StubServer;
use taskdesk::api::http::HttpBackend;
use taskdesk::api::loopback::LoopbackBackend;
use taskdesk::api::{ApiError, Backend};
use taskdesk::error::{AppError, ValidationError};
use taskdesk_proto::endpoint::Endpoint;
use taskdesk_proto::model::{Priority, Role, TaskId, TaskStatus, UserId};
use taskdesk_proto::request::{NewTask, NewUser};

fn new_user(username: &str) -> NewUser {
    NewUser {
        username: username.to_string(),
        email: format!("{username}@example.com"),
        full_name: format!("{username} Example"),
        role: Role::Member,
    }
}

// ===========================================================================
// Collections
// ===========================================================================

#[tokio::test]
async fn members_lists_only_member_accounts() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let members = server.client().members().await.unwrap();

    let names: Vec<&str> = members.iter().map(|u| u.username.as_str()).collect();
    assert_eq!(names, ["ana", "ben"]);
    assert!(members.iter().all(|u| u.role == Role::Member));
}

#[tokio::test]
async fn task_collections_are_filtered_by_query() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let client = server.client();

    let created = client.created_tasks(UserId(1)).await.unwrap();
    assert_eq!(created.len(), 4);

    let assigned = client.assigned_tasks(UserId(2)).await.unwrap();
    assert_eq!(assigned.len(), 2);
    assert!(assigned.iter().all(|t| t.assigned_to == Some(UserId(2))));

    assert!(server.store.calls().contains(&Endpoint::AssignedTasks(UserId(2))));
}

#[tokio::test]
async fn notifications_arrive_newest_first() {
    let store = LoopbackBackend::new();
    store.insert_notification(UserId(9), "first", false);
    store.insert_notification(UserId(9), "second", true);
    let server = StubServer::start(store).await;

    let list = server.client().notifications(UserId(9)).await.unwrap();
    let messages: Vec<&str> = list.iter().map(|n| n.message.as_str()).collect();
    assert_eq!(messages, ["second", "first"]);
}

// ===========================================================================
// Mutations
// ===========================================================================

#[tokio::test]
async fn create_user_returns_created_account() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let created = server.client().create_user(&new_user("carol")).await.unwrap();

    assert_eq!(created.username, "carol");
    assert!(server.store.users().iter().any(|u| u.username == "carol"));
}

#[tokio::test]
async fn duplicate_user_is_rejected_with_server_message() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let err = server.client().create_user(&new_user("ana")).await.unwrap_err();

    match &err {
        ApiError::Rejected {
            status, message, ..
        } => {
            assert_eq!(*status, 409);
            assert_eq!(message, "Username or email already exists");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }

    match AppError::from(err) {
        AppError::Validation(ValidationError::Rejected { status, .. }) => assert_eq!(status, 409),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn assign_without_due_date_creates_undated_task() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let task = NewTask {
        title: "Write changelog".to_string(),
        description: String::new(),
        assigned_to: UserId(2),
        assigned_by: UserId(1),
        priority: Priority::High,
        due_date: None,
    };

    let created = server.client().assign_task(&task).await.unwrap();
    assert_eq!(created.status, TaskStatus::Pending);
    assert_eq!(created.due_date, None);
    assert_eq!(created.priority, Priority::High);
}

#[tokio::test]
async fn approve_and_complete_change_status() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let client = server.client();

    client.complete_task(TaskId(5), "fixed").await.unwrap();
    client.approve_task(TaskId(5), UserId(1)).await.unwrap();

    let task = server
        .store
        .tasks()
        .into_iter()
        .find(|t| t.id == TaskId(5))
        .unwrap();
    assert_eq!(task.status, TaskStatus::Approved);
    assert_eq!(task.result.as_deref(), Some("fixed"));
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let store = LoopbackBackend::new();
    let id = store.insert_notification(UserId(2), "ping", false);
    let server = StubServer::start(store).await;
    let client = server.client();

    client.mark_notification_read(id).await.unwrap();
    client.mark_notification_read(id).await.unwrap();

    let list = client.notifications(UserId(2)).await.unwrap();
    assert!(list[0].read);
}

#[tokio::test]
async fn deleting_missing_task_is_not_found() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let err = server.client().delete_task(TaskId(999)).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

// ===========================================================================
// Failures
// ===========================================================================

#[tokio::test]
async fn bare_error_status_maps_to_status_error() {
    let store = LoopbackBackend::demo();
    store.fail(&Endpoint::Members);
    let server = StubServer::start(store).await;

    let err = server.client().members().await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
    assert!(matches!(AppError::from(err), AppError::Network(_)));
}

#[tokio::test]
async fn closed_port_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = HttpBackend::new(&url, Duration::from_secs(2)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Network { .. }), "got {err:?}");
}

#[tokio::test]
async fn health_reports_ok() {
    let server = StubServer::start(LoopbackBackend::new()).await;
    let health = server.client().health().await.unwrap();
    assert!(health.is_ok());
    assert_eq!(health.message.as_deref(), Some("API is running"));
}
