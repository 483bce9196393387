//! Single-slot transient notifications.
//!
//! At most one toast is visible. A new toast replaces the current one at
//! once and aborts its pending expiry; each expiry only clears the toast it
//! was scheduled for.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Default time a toast stays visible.
pub const DEFAULT_TOAST_TTL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ToastKind {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
}

/// Cheaply cloneable handle to the notification slot.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    inner: Arc<NotifyInner>,
}

#[derive(Debug)]
struct NotifyInner {
    slot: watch::Sender<Option<Toast>>,
    next_id: AtomicU64,
    ttl: Duration,
    expiry: Mutex<Option<JoinHandle<()>>>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(DEFAULT_TOAST_TTL)
    }
}

impl NotificationQueue {
    pub fn new(ttl: Duration) -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            inner: Arc::new(NotifyInner {
                slot,
                next_id: AtomicU64::new(1),
                ttl,
                expiry: Mutex::new(None),
            }),
        }
    }

    /// Show `message`, replacing whatever is visible. Must be called from
    /// within a Tokio runtime. Returns the new toast's id.
    pub fn notify(&self, message: impl Into<String>, kind: ToastKind) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let toast = Toast {
            id,
            message: message.into(),
            kind,
        };
        tracing::debug!(id, %kind, message = %toast.message, "toast");
        self.inner.slot.send_replace(Some(toast));

        let expiry = tokio::spawn(expire(Arc::downgrade(&self.inner), id));
        let previous = match self.inner.expiry.lock() {
            Ok(mut guard) => guard.replace(expiry),
            Err(poisoned) => poisoned.into_inner().replace(expiry),
        };
        if let Some(previous) = previous {
            previous.abort();
        }

        id
    }

    pub fn info(&self, message: impl Into<String>) -> u64 {
        self.notify(message, ToastKind::Info)
    }

    pub fn success(&self, message: impl Into<String>) -> u64 {
        self.notify(message, ToastKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> u64 {
        self.notify(message, ToastKind::Error)
    }

    /// The visible toast, if any.
    pub fn current(&self) -> Option<Toast> {
        self.inner.slot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Toast>> {
        self.inner.slot.subscribe()
    }
}

async fn expire(inner: Weak<NotifyInner>, id: u64) {
    let Some(ttl) = inner.upgrade().map(|inner| inner.ttl) else {
        return;
    };
    tokio::time::sleep(ttl).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    inner.slot.send_if_modified(|slot| {
        if slot.as_ref().is_some_and(|toast| toast.id == id) {
            *slot = None;
            true
        } else {
            false
        }
    });
}
