//! User-facing notifications ("toasts").
//!
//! Every notification expires after its duration unless the duration is zero.
//! Hosts render the current set from [`NotificationRelay::stacked`] or follow
//! [`NotificationRelay::subscribe`].

use std::fmt;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::clock::{Clock, SystemClock};

/// Vertical offset of the first notification, in pixels.
pub const STACK_TOP_OFFSET: u32 = 80;
/// Vertical distance between stacked notifications, in pixels.
pub const STACK_SPACING: u32 = 70;

const ID_JITTER_BITS: u32 = 10;
const ID_DRAW_ATTEMPTS: usize = 16;
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        };
        f.write_str(s)
    }
}

/// Timestamp in milliseconds shifted left, with random low bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub severity: Severity,
    pub message: String,
    /// Zero means the notification stays until removed.
    #[serde(with = "duration_millis")]
    pub duration: Duration,
    pub created_at: DateTime<Utc>,
}

/// A notification together with its stacking offset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedNotification {
    #[serde(flatten)]
    pub notification: Notification,
    pub offset: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NotificationEvent {
    Added(Notification),
    Removed(NotificationId),
}

struct RelayInner {
    active: Mutex<Vec<Notification>>,
    events: broadcast::Sender<NotificationEvent>,
    default_duration: Duration,
    clock: Arc<dyn Clock>,
}

/// Shared handle to the set of visible notifications.
#[derive(Clone)]
pub struct NotificationRelay {
    inner: Arc<RelayInner>,
}

impl fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("default_duration", &self.inner.default_duration)
            .field("active", &self.len())
            .finish()
    }
}

impl Default for NotificationRelay {
    fn default() -> Self {
        Self::new(Duration::from_secs(4))
    }
}

impl NotificationRelay {
    pub fn new(default_duration: Duration) -> Self {
        Self::with_clock(default_duration, Arc::new(SystemClock))
    }

    pub fn with_clock(default_duration: Duration, clock: Arc<dyn Clock>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(RelayInner {
                active: Mutex::new(Vec::new()),
                events,
                default_duration,
                clock,
            }),
        }
    }

    pub fn default_duration(&self) -> Duration {
        self.inner.default_duration
    }

    /// Show a notification. `duration` falls back to the relay default.
    ///
    /// Expiry is scheduled on the current tokio runtime; outside a runtime the
    /// notification stays until [`remove`](Self::remove) is called.
    pub fn add(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Option<Duration>,
    ) -> NotificationId {
        let duration = duration.unwrap_or(self.inner.default_duration);
        let now = self.inner.clock.now();

        let notification = {
            let mut active = self.lock_active();
            let id = next_id(now.timestamp_millis(), &active);
            let notification = Notification {
                id,
                severity,
                message: message.into(),
                duration,
                created_at: now,
            };
            active.push(notification.clone());
            notification
        };

        tracing::debug!(
            id = %notification.id,
            severity = %severity,
            message = %notification.message,
            "notification added"
        );

        let id = notification.id;
        let _ = self.inner.events.send(NotificationEvent::Added(notification));

        if !duration.is_zero() {
            self.schedule_expiry(id, duration);
        }
        id
    }

    pub fn success(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, Severity::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, Severity::Error, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, Severity::Warning, None)
    }

    pub fn info(&self, message: impl Into<String>) -> NotificationId {
        self.add(message, Severity::Info, None)
    }

    /// Remove a notification. Returns false if it was already gone.
    pub fn remove(&self, id: NotificationId) -> bool {
        let removed = {
            let mut active = self.lock_active();
            let before = active.len();
            active.retain(|n| n.id != id);
            active.len() != before
        };
        if removed {
            let _ = self.inner.events.send(NotificationEvent::Removed(id));
        }
        removed
    }

    pub fn clear(&self) {
        let drained: Vec<_> = self.lock_active().drain(..).map(|n| n.id).collect();
        for id in drained {
            let _ = self.inner.events.send(NotificationEvent::Removed(id));
        }
    }

    /// Visible notifications, oldest first.
    pub fn active(&self) -> Vec<Notification> {
        self.lock_active().clone()
    }

    pub fn contains(&self, id: NotificationId) -> bool {
        self.lock_active().iter().any(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.lock_active().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible notifications with their vertical offsets, newest last.
    pub fn stacked(&self) -> Vec<StackedNotification> {
        self.lock_active()
            .iter()
            .enumerate()
            .map(|(index, n)| StackedNotification {
                notification: n.clone(),
                offset: stack_offset(index),
            })
            .collect()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.inner.events.subscribe()
    }

    fn lock_active(&self) -> std::sync::MutexGuard<'_, Vec<Notification>> {
        self.inner.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn schedule_expiry(&self, id: NotificationId, duration: Duration) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::debug!(id = %id, "no runtime; notification will not auto-expire");
            return;
        };
        let weak: Weak<RelayInner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(duration).await;
            if let Some(inner) = weak.upgrade() {
                NotificationRelay { inner }.remove(id);
            }
        });
    }
}

/// Offset of the notification at `index` in the stack.
pub fn stack_offset(index: usize) -> u32 {
    let index = u32::try_from(index).unwrap_or(u32::MAX);
    STACK_TOP_OFFSET.saturating_add(STACK_SPACING.saturating_mul(index))
}

fn next_id(now_millis: i64, active: &[Notification]) -> NotificationId {
    let base = u64::try_from(now_millis).unwrap_or(0) << ID_JITTER_BITS;
    let taken = |id: NotificationId| active.iter().any(|n| n.id == id);
    let mut rng = rand::thread_rng();
    for _ in 0..ID_DRAW_ATTEMPTS {
        let candidate = NotificationId(base | rng.gen_range(0..(1u64 << ID_JITTER_BITS)));
        if !taken(candidate) {
            return candidate;
        }
    }

    // The millisecond is crowded: step past the newest id instead.
    let highest = active.iter().map(|n| n.id.0).max().unwrap_or(base);
    match highest.max(base).checked_add(1) {
        Some(next) => NotificationId(next),
        None => (0..)
            .map(NotificationId)
            .find(|id| !taken(*id))
            .unwrap_or(NotificationId(0)),
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::Serializer;

    pub fn serialize<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
