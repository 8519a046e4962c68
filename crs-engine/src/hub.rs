//! Live update hub
//!
//! Fans document-state events out to connected viewers, grouped per session.
//! The hub is an explicitly-owned object created at service startup and
//! passed by reference to whoever publishes or subscribes; there is no
//! module-level registry.
//!
//! Each subscriber owns an independent queue, so a stalled consumer never
//! blocks delivery to the others. Events are ephemeral: no persistence, no
//! replay. A subscriber is removed only by its own unsubscribe, which runs
//! on every exit path via `Subscription`'s `Drop`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

use crs_common::events::DocumentEvent;

/// What a subscriber's bounded wait produced
#[derive(Debug, Clone)]
pub enum StreamItem {
    /// A data event for this session
    Event(DocumentEvent),
    /// No data event within the wait; connection is still live
    Keepalive,
}

/// Per-session subscriber registry and fan-out
pub struct UpdateHub {
    /// session -> (handle -> queue). One coarse lock serializes subscribe,
    /// unsubscribe and publish against the same session entry.
    sessions: Mutex<HashMap<Uuid, HashMap<u64, mpsc::UnboundedSender<DocumentEvent>>>>,
    next_handle: AtomicU64,
}

impl UpdateHub {
    pub fn new() -> Arc<Self> {
        Arc::new(UpdateHub {
            sessions: Mutex::new(HashMap::new()),
            next_handle: AtomicU64::new(1),
        })
    }

    /// Register a new subscriber queue for a session
    ///
    /// The session's set is created on demand. Dropping the returned
    /// [`Subscription`] unsubscribes it.
    pub fn subscribe(self: &Arc<Self>, session_id: Uuid) -> Subscription {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();

        let mut sessions = self.sessions.lock().expect("hub lock poisoned");
        sessions.entry(session_id).or_default().insert(handle, tx);
        debug!(
            "Session {} subscriber {} connected ({} total)",
            session_id,
            handle,
            sessions.get(&session_id).map(HashMap::len).unwrap_or(0)
        );

        Subscription {
            session_id,
            handle,
            rx,
            hub: Arc::downgrade(self),
        }
    }

    /// Push an event onto every queue registered for its session
    ///
    /// A session with no subscribers is a no-op, not an error. Returns the
    /// number of queues the event was delivered to.
    pub fn publish(&self, event: DocumentEvent) -> usize {
        let session_id = event.session_id();
        let sessions = self.sessions.lock().expect("hub lock poisoned");
        let Some(subscribers) = sessions.get(&session_id) else {
            return 0;
        };

        let mut delivered = 0;
        for tx in subscribers.values() {
            // A receiver torn down without its Drop having run yet just
            // misses the event; its entry goes away with its unsubscribe.
            if tx.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        debug!("Published {} to {} subscribers", event.event_name(), delivered);
        delivered
    }

    /// Remove one subscriber queue
    ///
    /// Removing the last subscriber drops the session's entry entirely, so
    /// idle sessions do not accumulate.
    pub fn unsubscribe(&self, session_id: Uuid, handle: u64) {
        let mut sessions = self.sessions.lock().expect("hub lock poisoned");
        if let Some(subscribers) = sessions.get_mut(&session_id) {
            subscribers.remove(&handle);
            if subscribers.is_empty() {
                sessions.remove(&session_id);
            }
        }
        debug!("Session {} subscriber {} disconnected", session_id, handle);
    }

    /// Number of subscribers currently registered for a session
    pub fn subscriber_count(&self, session_id: Uuid) -> usize {
        self.sessions
            .lock()
            .expect("hub lock poisoned")
            .get(&session_id)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    /// Number of sessions with at least one subscriber
    pub fn session_count(&self) -> usize {
        self.sessions.lock().expect("hub lock poisoned").len()
    }
}

/// One connected viewer's queue
///
/// Unsubscribes itself on drop, so teardown on any exit path (disconnect,
/// cancellation) cleans up its registry entry.
pub struct Subscription {
    session_id: Uuid,
    handle: u64,
    rx: mpsc::UnboundedReceiver<DocumentEvent>,
    hub: Weak<UpdateHub>,
}

impl Subscription {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Await the next event with a bounded wait
    ///
    /// On timeout with no event, yields [`StreamItem::Keepalive`] instead of
    /// terminating, so long-lived connections can be detected as live.
    /// Returns `None` only once the queue is closed (unsubscribed or hub
    /// gone).
    pub async fn next_event(&mut self, keepalive: Duration) -> Option<StreamItem> {
        match tokio::time::timeout(keepalive, self.rx.recv()).await {
            Ok(Some(event)) => Some(StreamItem::Event(event)),
            Ok(None) => None,
            Err(_elapsed) => Some(StreamItem::Keepalive),
        }
    }

    /// Non-blocking poll, mainly for tests
    pub fn try_next(&mut self) -> Option<DocumentEvent> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.session_id, self.handle);
        }
    }
}
