//! Integration tests for the team member dashboard.
//!
//! Covers the member's task ordering, the complete flow over HTTP and the
//! checks that refuse actions the member may not take.

#![allow(clippy::expect_used, clippy::unwrap_used)]

#[path = "../support/stub_backend.rs"]
mod stub_backend;

use std::sync::Arc;

use stub_backend::StubServer;
use taskdesk::api::Backend;
use taskdesk::api::http::HttpBackend;
use taskdesk::api::loopback::LoopbackBackend;
use taskdesk::dashboard::{Dashboard, LOAD_ERROR_MESSAGE};
use taskdesk::dispatch::{Action, ActionDispatcher, AlwaysConfirm};
use taskdesk::error::{AppError, ValidationError};
use taskdesk::session::CurrentUser;
use taskdesk::toast::ToastKind;
use taskdesk::view;
use taskdesk_proto::endpoint::Endpoint;
use taskdesk_proto::model::{Role, TaskId, TaskStatus, UserId};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ana() -> CurrentUser {
    CurrentUser {
        id: UserId(2),
        username: "ana".to_string(),
        full_name: None,
        role: Role::Member,
    }
}

async fn loaded_member(store: LoopbackBackend) -> (StubServer, Dashboard<HttpBackend>) {
    let server = StubServer::start(store).await;
    let mut dashboard = Dashboard::new(Arc::new(server.client()), ana());
    dashboard.reload().await.unwrap();
    (server, dashboard)
}

// ===========================================================================
// Loading and ordering
// ===========================================================================

#[tokio::test]
async fn member_load_fetches_assigned_tasks_only() {
    let (server, dashboard) = loaded_member(LoopbackBackend::demo()).await;

    assert!(dashboard.state().members().is_empty());
    assert_eq!(dashboard.state().tasks().len(), 2);
    assert!(!server.store.calls().contains(&Endpoint::Members));

    let stats = dashboard.member_stats();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.done, 0);
}

#[tokio::test]
async fn tasks_sort_by_status_then_due_date() {
    let store = LoopbackBackend::new();
    let lead = store.insert_user("lead", "Dana Lead", Role::Lead);
    let ana = store.insert_user("ana", "Ana Member", Role::Member);
    assert_eq!(ana, UserId(2));
    store.insert_task("done late", TaskStatus::Completed, ana, lead, Some("2024-01-01"));
    store.insert_task("pending undated", TaskStatus::Pending, ana, lead, None);
    store.insert_task("working", TaskStatus::InProgress, ana, lead, Some("2024-02-01"));
    store.insert_task("pending soon", TaskStatus::Pending, ana, lead, Some("2024-03-01"));
    store.insert_task("pending later", TaskStatus::Pending, ana, lead, Some("2024-04-01"));

    let (_server, dashboard) = loaded_member(store).await;
    let titles: Vec<&str> = view::sort_for_member(dashboard.state().tasks())
        .into_iter()
        .map(|t| t.title.as_str())
        .collect();

    assert_eq!(
        titles,
        [
            "pending soon",
            "pending later",
            "pending undated",
            "working",
            "done late"
        ]
    );

    let html = dashboard.render();
    let soon = html.find("pending soon").unwrap();
    let undated = html.find("pending undated").unwrap();
    let done = html.find("done late").unwrap();
    assert!(soon < undated && undated < done);
}

#[tokio::test]
async fn member_page_uses_username_without_full_name() {
    let (_server, dashboard) = loaded_member(LoopbackBackend::demo()).await;
    let html = dashboard.render();

    assert!(html.contains("My Dashboard"));
    assert!(html.contains("Welcome back, ana!"));
    assert!(html.contains(r#"data-action="complete-task" data-id="4""#));
    assert!(!html.contains(r#"data-action="approve-task""#));
}

// ===========================================================================
// Complete flow
// ===========================================================================

#[tokio::test]
async fn completing_task_reloads_and_notifies_lead() {
    let (server, mut dashboard) = loaded_member(LoopbackBackend::demo()).await;
    let dispatcher = ActionDispatcher::new(AlwaysConfirm);

    let outcome = dispatcher
        .dispatch(
            &mut dashboard,
            Action::CompleteTask {
                task: TaskId(4),
                result: "Notes drafted and shared".to_string(),
            },
        )
        .await;

    assert!(outcome.is_applied());
    let task = dashboard.state().task(TaskId(4)).unwrap();
    assert_eq!(task.status, TaskStatus::Completed);
    assert!(task.completed_at.is_some());
    assert_eq!(
        dashboard.toasts().last().unwrap().message,
        "Task completed successfully! Awaiting team lead approval."
    );

    let lead_notes = server.client().notifications(UserId(1)).await.unwrap();
    assert!(
        lead_notes
            .iter()
            .any(|n| n.message == "Task 'Draft release notes' has been completed by team member")
    );

    let html = dashboard.render();
    assert!(html.contains("Awaiting Approval"));
}

#[tokio::test]
async fn empty_result_is_refused_before_sending() {
    let (server, mut dashboard) = loaded_member(LoopbackBackend::demo()).await;
    let dispatcher = ActionDispatcher::new(AlwaysConfirm);

    let outcome = dispatcher
        .dispatch(
            &mut dashboard,
            Action::CompleteTask {
                task: TaskId(4),
                result: "  ".to_string(),
            },
        )
        .await;

    assert!(matches!(
        outcome.error(),
        Some(AppError::Validation(ValidationError::MissingField("result")))
    ));
    assert_eq!(server.store.mutation_count(), 0);
}

#[tokio::test]
async fn approved_task_cannot_be_completed_again() {
    let store = LoopbackBackend::demo();
    let finished = store.insert_task(
        "Archive logs",
        TaskStatus::Approved,
        UserId(2),
        UserId(1),
        None,
    );
    let (server, mut dashboard) = loaded_member(store).await;
    let dispatcher = ActionDispatcher::new(AlwaysConfirm);

    let outcome = dispatcher
        .dispatch(
            &mut dashboard,
            Action::CompleteTask {
                task: finished,
                result: "again".to_string(),
            },
        )
        .await;

    assert!(matches!(
        outcome.error(),
        Some(AppError::Validation(ValidationError::InvalidTransition {
            status: TaskStatus::Approved,
            ..
        }))
    ));
    assert_eq!(server.store.mutation_count(), 0);
}

#[tokio::test]
async fn member_cannot_delete_tasks() {
    let (server, mut dashboard) = loaded_member(LoopbackBackend::demo()).await;
    let dispatcher = ActionDispatcher::new(AlwaysConfirm);

    let outcome = dispatcher
        .dispatch(&mut dashboard, Action::DeleteTask(TaskId(4)))
        .await;

    assert!(matches!(
        outcome.error(),
        Some(AppError::Validation(ValidationError::NotPermitted { .. }))
    ));
    assert_eq!(server.store.mutation_count(), 0);
}

#[tokio::test]
async fn mark_read_toasts_and_reloads() {
    let store = LoopbackBackend::demo();
    let note = store.insert_notification(UserId(2), "New task assigned: x", false);
    store.insert_notification(UserId(2), "older", true);
    let (server, mut dashboard) = loaded_member(store).await;
    assert_eq!(dashboard.state().unread_count(), 1);

    let dispatcher = ActionDispatcher::new(AlwaysConfirm);
    let outcome = dispatcher
        .dispatch(&mut dashboard, Action::MarkNotificationRead(note))
        .await;

    assert!(outcome.is_applied());
    assert_eq!(dashboard.state().unread_count(), 0);
    assert_eq!(
        dashboard.toasts().last().unwrap().message,
        "Notification marked as read"
    );
    let calls = server.store.calls();
    let assigned_fetches = calls
        .iter()
        .filter(|e| **e == Endpoint::AssignedTasks(UserId(2)))
        .count();
    assert_eq!(assigned_fetches, 2);
}

#[tokio::test]
async fn mark_read_with_failing_refetch_is_reported() {
    let store = LoopbackBackend::demo();
    let note = store.insert_notification(UserId(2), "New task assigned: x", false);
    let (server, mut dashboard) = loaded_member(store).await;

    server.store.fail(&Endpoint::Notifications(UserId(2)));
    let dispatcher = ActionDispatcher::new(AlwaysConfirm);
    let outcome = dispatcher
        .dispatch(&mut dashboard, Action::MarkNotificationRead(note))
        .await;

    assert!(outcome.is_applied());
    let toast = dashboard.toasts().last().unwrap();
    assert_eq!(toast.kind, ToastKind::Error);
    assert_eq!(toast.message, LOAD_ERROR_MESSAGE);
    assert_eq!(dashboard.state().unread_count(), 1);
}
