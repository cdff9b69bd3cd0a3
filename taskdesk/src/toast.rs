//! Transient user-facing messages.

use std::time::Duration;

use tokio::time::Instant;

/// Default lifetime of a toast.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_secs(3);

/// Visual flavour of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    /// Action succeeded.
    Success,
    /// Action or fetch failed.
    Error,
    /// Neutral information.
    Info,
}

impl ToastKind {
    /// CSS class suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// One message with its creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Flavour.
    pub kind: ToastKind,
    /// Text shown to the user (rendered escaped).
    pub message: String,
    /// When it was raised.
    pub created_at: Instant,
}

/// Auto-expiring list of toasts, oldest first.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    ttl: Duration,
    items: Vec<Toast>,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl ToastQueue {
    /// Creates an empty queue whose entries live for `ttl`.
    #[must_use]
    pub const fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            items: Vec::new(),
        }
    }

    /// Raises a toast now.
    pub fn push(&mut self, kind: ToastKind, message: impl Into<String>) {
        self.push_at(kind, message, Instant::now());
    }

    /// Raises a toast at an explicit instant.
    pub fn push_at(&mut self, kind: ToastKind, message: impl Into<String>, at: Instant) {
        let message = message.into();
        match kind {
            ToastKind::Error => tracing::warn!(%message, "error toast"),
            ToastKind::Success | ToastKind::Info => tracing::info!(%message, "toast"),
        }
        self.items.push(Toast {
            kind,
            message,
            created_at: at,
        });
    }

    /// Drops every toast older than the ttl.
    pub fn prune(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.items
            .retain(|t| now.saturating_duration_since(t.created_at) < ttl);
    }

    /// Toasts still visible at `now`.
    pub fn active(&self, now: Instant) -> impl Iterator<Item = &Toast> {
        self.items
            .iter()
            .filter(move |t| now.saturating_duration_since(t.created_at) < self.ttl)
    }

    /// Every toast currently held, expired or not.
    #[must_use]
    pub fn all(&self) -> &[Toast] {
        &self.items
    }

    /// Most recent toast, if any.
    #[must_use]
    pub fn last(&self) -> Option<&Toast> {
        self.items.last()
    }

    /// Number of toasts currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no toast is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
