//! Transient notification list
//!
//! Insertion order is display order. Each entry schedules its own removal;
//! the timer holds only the id, so a timer firing after `remove`/`clear_all`
//! finds nothing and does nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::constants::{
    ERROR_EXPIRY_SECS, INFO_EXPIRY_SECS, NOTIFICATION_EVENT_CAPACITY, WARNING_EXPIRY_SECS,
};

pub type NotificationId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub message: String,
    pub severity: Severity,
    pub timestamp: DateTime<Utc>,
    pub details: Option<Value>,
}

/// Auto-removal delay per severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub error: Duration,
    pub warning: Duration,
    pub info: Duration,
}

impl ExpiryPolicy {
    pub fn delay_for(&self, severity: Severity) -> Duration {
        match severity {
            Severity::Error => self.error,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self {
            error: Duration::from_secs(ERROR_EXPIRY_SECS),
            warning: Duration::from_secs(WARNING_EXPIRY_SECS),
            info: Duration::from_secs(INFO_EXPIRY_SECS),
        }
    }
}

/// Change feed for UI layers
#[derive(Debug, Clone)]
pub enum NotificationEvent {
    Added(Notification),
    Removed(NotificationId),
    Cleared,
}

/// Cheap to clone; all clones share one list and one id counter
#[derive(Clone)]
pub struct NotificationStore {
    entries: Arc<RwLock<Vec<Notification>>>,
    next_id: Arc<AtomicU64>,
    expiry: ExpiryPolicy,
    events: broadcast::Sender<NotificationEvent>,
}

impl NotificationStore {
    pub fn new(expiry: ExpiryPolicy) -> Self {
        let (events, _) = broadcast::channel(NOTIFICATION_EVENT_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            expiry,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<NotificationEvent> {
        self.events.subscribe()
    }

    pub async fn add_error(&self, message: impl Into<String>, details: Option<Value>) -> NotificationId {
        self.add(Severity::Error, message.into(), details).await
    }

    pub async fn add_warning(&self, message: impl Into<String>, details: Option<Value>) -> NotificationId {
        self.add(Severity::Warning, message.into(), details).await
    }

    pub async fn add_info(&self, message: impl Into<String>, details: Option<Value>) -> NotificationId {
        self.add(Severity::Info, message.into(), details).await
    }

    async fn add(&self, severity: Severity, message: String, details: Option<Value>) -> NotificationId {
        let notification = {
            let mut entries = self.entries.write().await;
            // Id allocation and push share one lock
            let id = self.next_id.fetch_add(1, Ordering::Relaxed);
            let notification = Notification {
                id,
                message,
                severity,
                timestamp: Utc::now(),
                details,
            };
            entries.push(notification.clone());
            notification
        };
        let id = notification.id;

        match severity {
            Severity::Error => error!(notification_id = id, message = %notification.message, "Notification"),
            Severity::Warning => warn!(notification_id = id, message = %notification.message, "Notification"),
            Severity::Info => info!(notification_id = id, message = %notification.message, "Notification"),
        }

        // No subscribers is fine
        let _ = self.events.send(NotificationEvent::Added(notification));

        let store = self.clone();
        let delay = self.expiry.delay_for(severity);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            store.remove(id).await;
        });

        id
    }

    /// Remove by id; absent ids are ignored
    pub async fn remove(&self, id: NotificationId) {
        let removed = {
            let mut entries = self.entries.write().await;
            match entries.iter().position(|n| n.id == id) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            debug!(notification_id = id, "Notification removed");
            let _ = self.events.send(NotificationEvent::Removed(id));
        }
    }

    /// Empty the list now. Pending timers become no-ops.
    pub async fn clear_all(&self) {
        self.entries.write().await.clear();
        let _ = self.events.send(NotificationEvent::Cleared);
    }

    /// Current list in display order
    pub async fn snapshot(&self) -> Vec<Notification> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for NotificationStore {
    fn default() -> Self {
        Self::new(ExpiryPolicy::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_ids_strictly_increase_across_severities() {
        let store = NotificationStore::default();
        let a = store.add_error("a", None).await;
        let b = store.add_warning("b", None).await;
        let c = store.add_info("c", None).await;
        let d = store.add_error("d", None).await;

        assert!(a < b && b < c && c < d);
        let ids: Vec<_> = store.snapshot().await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![a, b, c, d]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_adds_keep_display_order_sorted_by_id() {
        for _ in 0..50 {
            let store = NotificationStore::default();
            let tasks: Vec<_> = (0..16)
                .map(|i| {
                    let store = store.clone();
                    tokio::spawn(async move { store.add_info(format!("n{}", i), None).await })
                })
                .collect();
            for task in tasks {
                task.await.unwrap();
            }

            let ids: Vec<_> = store.snapshot().await.into_iter().map(|n| n.id).collect();
            assert_eq!(ids.len(), 16);
            assert!(ids.windows(2).all(|w| w[0] < w[1]), "out of order: {:?}", ids);
        }
    }

    #[tokio::test]
    async fn test_ids_are_never_reused_after_removal() {
        let store = NotificationStore::default();
        let first = store.add_error("first", None).await;
        store.remove(first).await;
        store.clear_all().await;
        let second = store.add_error("second", None).await;
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_entry_carries_severity_and_details() {
        let store = NotificationStore::default();
        store.add_warning("Careful", Some(json!({"k": 1}))).await;

        let entries = store.snapshot().await;
        assert_eq!(entries[0].severity, Severity::Warning);
        assert_eq!(entries[0].message, "Careful");
        assert_eq!(entries[0].details, Some(json!({"k": 1})));
    }

    #[tokio::test]
    async fn test_remove_twice_is_noop() {
        let store = NotificationStore::default();
        let keep = store.add_info("keep", None).await;
        let gone = store.add_info("gone", None).await;

        store.remove(gone).await;
        store.remove(gone).await;

        let ids: Vec<_> = store.snapshot().await.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![keep]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_severity_expires_after_its_delay() {
        let store = NotificationStore::default();
        store.add_error("error", None).await;
        store.add_warning("warning", None).await;
        store.add_info("info", None).await;

        tokio::time::sleep(Duration::from_millis(5_500)).await;
        let left: Vec<_> = store.snapshot().await.into_iter().map(|n| n.severity).collect();
        assert_eq!(left, vec![Severity::Error, Severity::Warning]);

        tokio::time::sleep(Duration::from_millis(3_000)).await;
        let left: Vec<_> = store.snapshot().await.into_iter().map(|n| n.severity).collect();
        assert_eq!(left, vec![Severity::Error]);

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_after_clear_all_do_not_resurrect() {
        let store = NotificationStore::default();
        store.add_error("one", None).await;
        store.add_info("two", None).await;
        store.clear_all().await;
        assert!(store.is_empty().await);

        // Let every pending timer fire against the empty list
        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(store.is_empty().await);

        let fresh = store.add_info("fresh", None).await;
        assert_eq!(store.snapshot().await[0].id, fresh);
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let store = NotificationStore::default();
        let mut rx = store.subscribe();

        let id = store.add_error("boom", None).await;
        store.remove(id).await;
        store.clear_all().await;

        assert!(matches!(rx.recv().await.unwrap(), NotificationEvent::Added(n) if n.id == id));
        assert!(matches!(rx.recv().await.unwrap(), NotificationEvent::Removed(removed) if removed == id));
        assert!(matches!(rx.recv().await.unwrap(), NotificationEvent::Cleared));
    }

    #[test]
    fn test_default_expiry_delays() {
        let policy = ExpiryPolicy::default();
        assert_eq!(policy.delay_for(Severity::Error), Duration::from_secs(10));
        assert_eq!(policy.delay_for(Severity::Warning), Duration::from_secs(8));
        assert_eq!(policy.delay_for(Severity::Info), Duration::from_secs(5));
    }
}
