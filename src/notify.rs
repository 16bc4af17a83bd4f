//! User-facing failure notifications.
//!
//! The client builds one [`Notification`] per failed logical request and
//! hands it to a [`Notifier`]. Notifications are transient: a
//! [`NotificationCenter`] keeps them visible until their display duration
//! runs out or the user dismisses them.

use crate::Error;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Display duration for failures where no response was received.
pub const NETWORK_ERROR_DURATION: Duration = Duration::from_secs(10);

/// Display duration for every other failure.
pub const HTTP_ERROR_DURATION: Duration = Duration::from_secs(5);

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A transient, user-visible message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    /// How long the notification stays visible unless dismissed earlier.
    pub duration: Duration,
    /// Suppressed notifications are never delivered.
    pub suppressed: bool,
}

impl Notification {
    /// Builds the error notification for a failure.
    ///
    /// # Examples
    ///
    /// ```
    /// use nids_client::{Error, Notification};
    /// use std::time::Duration;
    ///
    /// let notification = Notification::for_error(&Error::Timeout);
    /// assert_eq!(notification.duration, Duration::from_secs(10));
    /// assert!(!notification.suppressed);
    /// ```
    pub fn for_error(error: &Error) -> Self {
        let duration = if error.is_network() {
            NETWORK_ERROR_DURATION
        } else {
            HTTP_ERROR_DURATION
        };
        Self {
            severity: Severity::Error,
            message: error.user_message(),
            duration,
            suppressed: false,
        }
    }

    /// Marks the notification as suppressed (or not).
    pub fn suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }
}

/// A sink for notifications.
///
/// Implementations must not merge or deduplicate: every call represents a
/// separate failed request.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

impl<N: Notifier + ?Sized> Notifier for Arc<N> {
    fn notify(&self, notification: Notification) {
        (**self).notify(notification)
    }
}

/// Writes each notification to the `tracing` log.
///
/// This is the client's default sink when nothing else is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.severity {
            Severity::Error => tracing::error!(
                text = %notification.message,
                duration_ms = notification.duration.as_millis(),
                "Notification"
            ),
            Severity::Warning => tracing::warn!(
                text = %notification.message,
                duration_ms = notification.duration.as_millis(),
                "Notification"
            ),
            Severity::Info => tracing::info!(
                text = %notification.message,
                duration_ms = notification.duration.as_millis(),
                "Notification"
            ),
        }
    }
}

/// A notification currently held by a [`NotificationCenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveNotification {
    pub id: u64,
    pub notification: Notification,
    pub shown_at: Instant,
}

impl ActiveNotification {
    /// Returns `true` once the display duration has elapsed at `now`.
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= self.notification.duration
    }
}

/// In-memory store of visible notifications, the backing for a toast area.
///
/// Cloning yields another handle to the same store.
///
/// # Examples
///
/// ```
/// use nids_client::{Error, Notification, NotificationCenter, Notifier};
///
/// let center = NotificationCenter::new();
/// center.notify(Notification::for_error(&Error::Timeout));
/// center.notify(Notification::for_error(&Error::Timeout));
///
/// let active = center.active();
/// assert_eq!(active.len(), 2);
///
/// assert!(center.dismiss(active[0].id));
/// assert_eq!(center.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct NotificationCenter {
    inner: Arc<CenterInner>,
}

#[derive(Debug, Default)]
struct CenterInner {
    next_id: AtomicU64,
    entries: Mutex<Vec<ActiveNotification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<ActiveNotification>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.inner
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stores a notification shown at `now` and returns its id.
    ///
    /// Entries already expired at `now` are swept first, so a center nobody
    /// reads stays bounded.
    pub fn push_at(&self, notification: Notification, now: Instant) -> u64 {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.entries();
        entries.retain(|entry| !entry.is_expired(now));
        entries.push(ActiveNotification {
            id,
            notification,
            shown_at: now,
        });
        id
    }

    /// Visible notifications at `now`, oldest first. Expired ones are dropped.
    pub fn active_at(&self, now: Instant) -> Vec<ActiveNotification> {
        let mut entries = self.entries();
        entries.retain(|entry| !entry.is_expired(now));
        entries.clone()
    }

    /// Visible notifications right now.
    pub fn active(&self) -> Vec<ActiveNotification> {
        self.active_at(Instant::now())
    }

    /// Removes a notification on explicit user action.
    ///
    /// Returns `false` if it was already gone.
    pub fn dismiss(&self, id: u64) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        entries.len() != before
    }

    /// Removes every notification.
    pub fn clear(&self) {
        self.entries().clear();
    }

    /// Number of stored notifications, expired ones included until the next sweep.
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Notifier for NotificationCenter {
    fn notify(&self, notification: Notification) {
        if notification.suppressed {
            return;
        }
        self.push_at(notification, Instant::now());
    }
}
