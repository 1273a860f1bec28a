//! Notification queue
//!
//! Bounded, deduplicated feed of user-facing alerts derived from store and
//! channel events. Never a second source of truth for order data: entries
//! carry display text plus an opaque payload and that is all.

use parking_lot::Mutex;
use shared::notification::Notification;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

/// Cap on retained entries; older ones are dropped silently
pub const MAX_NOTIFICATIONS: usize = 10;

// ============================================================================
// Platform notifier seam
// ============================================================================

/// Host permission for raising system-level notifications
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyPermission {
    Granted,
    Denied,
    /// Not decided yet - a request may be issued
    Default,
}

/// System notification sink (desktop toasts, etc.).
///
/// In-app delivery never depends on this: when permission is undecided a
/// request is issued and the entry is still queued, so no alert is lost.
pub trait PlatformNotifier: Send + Sync {
    fn permission(&self) -> NotifyPermission;
    fn request_permission(&self);
    /// Raise a system notification. `tag` lets the host collapse repeats
    /// for the same entity instead of stacking duplicates.
    fn notify(&self, title: &str, body: &str, tag: Option<&str>);
}

/// Headless default: never raises anything
pub struct NoopNotifier;

impl PlatformNotifier for NoopNotifier {
    fn permission(&self) -> NotifyPermission {
        NotifyPermission::Denied
    }

    fn request_permission(&self) {}

    fn notify(&self, _title: &str, _body: &str, _tag: Option<&str>) {}
}

// ============================================================================
// Queue
// ============================================================================

struct QueueState {
    entries: VecDeque<Notification>,
    unread: u32,
    /// Dedup tags with an open window; equal tags are suppressed until the
    /// window closes
    open_windows: HashSet<String>,
}

/// Bounded, deduplicated notification feed
pub struct NotificationQueue {
    state: Mutex<QueueState>,
    notifier: Arc<dyn PlatformNotifier>,
}

impl NotificationQueue {
    pub fn new() -> Self {
        Self::with_notifier(Arc::new(NoopNotifier))
    }

    pub fn with_notifier(notifier: Arc<dyn PlatformNotifier>) -> Self {
        Self {
            state: Mutex::new(QueueState {
                entries: VecDeque::new(),
                unread: 0,
                open_windows: HashSet::new(),
            }),
            notifier,
        }
    }

    /// Queue a notification. Returns false when suppressed by an open
    /// dedup window.
    pub fn push(&self, notification: Notification) -> bool {
        {
            let mut state = self.state.lock();
            if let Some(tag) = &notification.dedup_tag
                && !state.open_windows.insert(tag.clone())
            {
                tracing::debug!(tag = %tag, "Duplicate notification suppressed");
                return false;
            }
            state.entries.push_front(notification.clone());
            state.entries.truncate(MAX_NOTIFICATIONS);
            state.unread += 1;
        }

        match self.notifier.permission() {
            NotifyPermission::Granted => self.notifier.notify(
                &notification.title,
                &notification.message,
                notification.dedup_tag.as_deref(),
            ),
            // Ask for next time; this entry is already queued in-app
            NotifyPermission::Default => self.notifier.request_permission(),
            NotifyPermission::Denied => {}
        }
        true
    }

    /// Close a dedup window so the tag can alert again
    pub fn close_window(&self, tag: &str) {
        self.state.lock().open_windows.remove(tag);
    }

    /// Entries, most recent first
    pub fn entries(&self) -> Vec<Notification> {
        self.state.lock().entries.iter().cloned().collect()
    }

    pub fn unread_count(&self) -> u32 {
        self.state.lock().unread
    }

    pub fn mark_as_read(&self) {
        self.state.lock().unread = 0;
    }

    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn plain(message: &str) -> Notification {
        Notification::generic("Aviso", message)
    }

    fn tagged(message: &str, tag: &str) -> Notification {
        let mut n = plain(message);
        n.dedup_tag = Some(tag.to_string());
        n
    }

    #[test]
    fn bounded_at_ten_most_recent_first() {
        let queue = NotificationQueue::new();
        for i in 0..15 {
            queue.push(plain(&format!("aviso {i}")));
        }

        let entries = queue.entries();
        assert_eq!(entries.len(), MAX_NOTIFICATIONS);
        assert_eq!(entries[0].message, "aviso 14");
        assert_eq!(entries[9].message, "aviso 5");
    }

    #[test]
    fn open_window_suppresses_equal_tags() {
        let queue = NotificationQueue::new();
        assert!(queue.push(tagged("listo", "listo:o-1:l-1")));
        assert!(!queue.push(tagged("listo otra vez", "listo:o-1:l-1")));
        assert_eq!(queue.len(), 1);

        queue.close_window("listo:o-1:l-1");
        assert!(queue.push(tagged("listo de nuevo", "listo:o-1:l-1")));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn unread_counts_accepted_pushes_only() {
        let queue = NotificationQueue::new();
        queue.push(tagged("a", "t-1"));
        queue.push(tagged("b", "t-1")); // suppressed
        queue.push(plain("c"));
        assert_eq!(queue.unread_count(), 2);

        queue.mark_as_read();
        assert_eq!(queue.unread_count(), 0);

        queue.push(plain("d"));
        assert_eq!(queue.unread_count(), 1);
    }

    struct RecordingNotifier {
        permission: NotifyPermission,
        raised: PlMutex<Vec<String>>,
        requests: PlMutex<u32>,
    }

    impl RecordingNotifier {
        fn new(permission: NotifyPermission) -> Self {
            Self {
                permission,
                raised: PlMutex::new(Vec::new()),
                requests: PlMutex::new(0),
            }
        }
    }

    impl PlatformNotifier for RecordingNotifier {
        fn permission(&self) -> NotifyPermission {
            self.permission
        }

        fn request_permission(&self) {
            *self.requests.lock() += 1;
        }

        fn notify(&self, title: &str, _body: &str, _tag: Option<&str>) {
            self.raised.lock().push(title.to_string());
        }
    }

    #[test]
    fn granted_permission_raises_system_notification() {
        let notifier = Arc::new(RecordingNotifier::new(NotifyPermission::Granted));
        let queue = NotificationQueue::with_notifier(notifier.clone());

        queue.push(plain("hola"));
        assert_eq!(notifier.raised.lock().len(), 1);
        assert_eq!(*notifier.requests.lock(), 0);
    }

    #[test]
    fn undecided_permission_requests_but_still_queues() {
        let notifier = Arc::new(RecordingNotifier::new(NotifyPermission::Default));
        let queue = NotificationQueue::with_notifier(notifier.clone());

        queue.push(plain("hola"));
        // No system toast, one permission request, entry kept in-app
        assert!(notifier.raised.lock().is_empty());
        assert_eq!(*notifier.requests.lock(), 1);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.unread_count(), 1);
    }
}
