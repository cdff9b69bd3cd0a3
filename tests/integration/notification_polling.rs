//! Integration tests for background notification polling.
//!
//! Runs the poller over HTTP with a short real-time period and checks that
//! new notifications reach the dashboard, failures keep the old list, and
//! cancelling stops the requests.

#![allow(clippy::expect_used, clippy::unwrap_used)]

#[path = "../support/stub_backend.rs"]
mod stub_backend;

use std::sync::Arc;
use std::time::Duration;

use stub_backend::StubServer;
use taskdesk::api::loopback::LoopbackBackend;
use taskdesk::dashboard::Dashboard;
use taskdesk::poll::PollEvent;
use taskdesk::session::CurrentUser;
use taskdesk::toast::ToastKind;
use taskdesk_proto::endpoint::Endpoint;
use taskdesk_proto::model::{Role, UserId};

const PERIOD: Duration = Duration::from_millis(50);
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

fn ben() -> CurrentUser {
    CurrentUser {
        id: UserId(3),
        username: "ben".to_string(),
        full_name: Some("Ben Member".to_string()),
        role: Role::Member,
    }
}

async fn next_event(rx: &mut tokio::sync::mpsc::Receiver<PollEvent>) -> PollEvent {
    tokio::time::timeout(RECV_TIMEOUT, rx.recv())
        .await
        .expect("poll event within timeout")
        .expect("poller still running")
}

#[tokio::test]
async fn new_notification_reaches_dashboard() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let mut dashboard = Dashboard::new(Arc::new(server.client()), ben());
    dashboard.reload().await.unwrap();
    assert_eq!(dashboard.state().unread_count(), 0);

    let (handle, mut rx) = dashboard.spawn_poller(PERIOD);
    server
        .store
        .insert_notification(UserId(3), "New task assigned: Audit", false);

    loop {
        let event = next_event(&mut rx).await;
        dashboard.apply_poll_event(event);
        if dashboard.state().unread_count() == 1 {
            break;
        }
    }
    assert!(dashboard.render().contains("New task assigned: Audit"));
    assert_eq!(dashboard.toasts().last().unwrap().kind, ToastKind::Info);
    handle.cancel();
}

#[tokio::test]
async fn poll_failure_keeps_previous_list() {
    let store = LoopbackBackend::demo();
    store.insert_notification(UserId(3), "kept", false);
    let server = StubServer::start(store).await;
    let mut dashboard = Dashboard::new(Arc::new(server.client()), ben());
    dashboard.reload().await.unwrap();

    server.store.fail(&Endpoint::Notifications(UserId(3)));
    let (_handle, mut rx) = dashboard.spawn_poller(PERIOD);

    let event = next_event(&mut rx).await;
    assert!(matches!(event, PollEvent::Error(_)));
    dashboard.apply_poll_event(event);

    assert_eq!(dashboard.state().notifications().len(), 1);
    assert!(dashboard.toasts().is_empty());
}

#[tokio::test]
async fn cancelled_poller_stops_requesting() {
    let server = StubServer::start(LoopbackBackend::demo()).await;
    let dashboard = Dashboard::new(Arc::new(server.client()), ben());

    let (handle, mut rx) = dashboard.spawn_poller(PERIOD);
    next_event(&mut rx).await;
    handle.cancel();

    // Drain anything queued before the cancel.
    while rx.recv().await.is_some() {}
    tokio::time::sleep(PERIOD).await;
    let settled = server.store.calls().len();

    tokio::time::sleep(PERIOD * 5).await;
    assert_eq!(server.store.calls().len(), settled);
}
