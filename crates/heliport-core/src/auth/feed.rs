//! Fan-out of auth change notifications to subscribers.
//!
//! Each subscriber gets its own unbounded channel, so notifications are
//! delivered in emission order and never coalesced. A `Subscription` removes
//! itself from the feed when dropped.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use super::AuthChange;

type SubscriberId = u64;

#[derive(Default)]
struct FeedInner {
    next_id: SubscriberId,
    subscribers: Vec<(SubscriberId, mpsc::UnboundedSender<AuthChange>)>,
}

/// Registry of change subscribers, shared by an `AuthProvider` implementation.
#[derive(Clone, Default)]
pub struct ChangeFeed {
    inner: Arc<Mutex<FeedInner>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(inner: &Mutex<FeedInner>) -> MutexGuard<'_, FeedInner> {
        inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = Self::lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, tx));
        debug!(subscriber = id, total = inner.subscribers.len(), "Auth change subscriber added");

        Subscription {
            id,
            rx,
            feed: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver a change to every live subscriber.
    pub fn emit(&self, change: AuthChange) {
        let mut inner = Self::lock(&self.inner);
        inner
            .subscribers
            .retain(|(_, tx)| tx.send(change.clone()).is_ok());
        debug!(event = ?change.event, subscribers = inner.subscribers.len(), "Auth change emitted");
    }

    pub fn subscriber_count(&self) -> usize {
        Self::lock(&self.inner).subscribers.len()
    }
}

/// Receiving end of a `ChangeFeed` registration.
pub struct Subscription {
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<AuthChange>,
    feed: Weak<Mutex<FeedInner>>,
}

impl Subscription {
    /// Next already-delivered change, without waiting.
    pub fn try_next(&mut self) -> Option<AuthChange> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next change. Returns `None` once the feed is gone.
    pub async fn next(&mut self) -> Option<AuthChange> {
        self.rx.recv().await
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.feed.upgrade() {
            let mut inner = ChangeFeed::lock(&inner);
            inner.subscribers.retain(|(id, _)| *id != self.id);
            debug!(subscriber = self.id, "Auth change subscriber released");
        }
    }
}
