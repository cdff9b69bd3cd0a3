//! Background notification polling.
//!
//! [`NotificationPoller::spawn`] starts a tokio task that re-fetches the
//! user's notifications on a fixed interval and forwards the result as a
//! [`PollEvent`]. The task never touches dashboard state; the owner drains
//! the channel and applies events with
//! [`Dashboard::apply_poll_event`](crate::dashboard::Dashboard::apply_poll_event).
//!
//! ```text
//! dashboard <── PollEvent ── poll task ── GET /api/notifications/{id} ──> backend
//! ```
//!
//! The returned [`PollHandle`] stops the task on [`cancel`](PollHandle::cancel)
//! or when dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use taskdesk_proto::model::{Notification, UserId};

use crate::api::Backend;

/// Default refresh period.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Capacity of the event channel.
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Result of one poll.
#[derive(Debug)]
pub enum PollEvent {
    /// Fresh notification list, newest first.
    Notifications(Vec<Notification>),
    /// The fetch failed; the previous list stays in place.
    Error(String),
}

/// Owns the polling task. Dropping the handle cancels it.
#[derive(Debug)]
pub struct PollHandle {
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Stops the polling task. No event is sent after this returns,
    /// apart from one already queued in the channel.
    pub fn cancel(self) {
        drop(self);
    }

    /// Whether the task has stopped (cancelled, or the receiver is gone).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!("notification poller stopped");
    }
}

/// Spawns notification polling tasks.
pub struct NotificationPoller;

impl NotificationPoller {
    /// Starts polling `user`'s notifications every `period`.
    ///
    /// The first fetch happens one period after the call, since the
    /// dashboard's initial load already fetched the list. A zero period
    /// falls back to [`DEFAULT_POLL_INTERVAL`].
    pub fn spawn<B>(
        backend: Arc<B>,
        user: UserId,
        period: Duration,
    ) -> (PollHandle, mpsc::Receiver<PollEvent>)
    where
        B: Backend + 'static,
    {
        let period = if period.is_zero() {
            tracing::warn!("zero poll interval, using default");
            DEFAULT_POLL_INTERVAL
        } else {
            period
        };
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let task = tokio::spawn(poll_loop(backend, user, period, tx));
        tracing::debug!(%user, period_secs = period.as_secs(), "notification poller started");
        (PollHandle { task }, rx)
    }
}

/// Background task: fetch, forward, wait.
async fn poll_loop<B: Backend>(
    backend: Arc<B>,
    user: UserId,
    period: Duration,
    tx: mpsc::Sender<PollEvent>,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        let event = match backend.notifications(user).await {
            Ok(list) => {
                tracing::trace!(%user, count = list.len(), "polled notifications");
                PollEvent::Notifications(list)
            }
            Err(e) => {
                tracing::warn!(%user, error = %e, "notification poll failed");
                PollEvent::Error(e.to_string())
            }
        };
        if tx.send(event).await.is_err() {
            tracing::debug!("poll receiver dropped, stopping");
            break;
        }
    }
}
