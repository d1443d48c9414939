use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use chatbox_logging::chat_debug;

use crate::SubscriptionId;

/// Live stream binding for one thread. Dropping it releases the binding and
/// cancels every task started under it.
#[derive(Debug)]
pub struct StreamSubscription {
    handle: SubscriptionHandle,
}

impl StreamSubscription {
    fn new(thread_id: String, id: SubscriptionId) -> Self {
        Self {
            handle: SubscriptionHandle {
                thread_id,
                id,
                token: CancellationToken::new(),
                streamed: Arc::new(AtomicBool::new(false)),
            },
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.handle.id
    }

    pub fn thread_id(&self) -> &str {
        &self.handle.thread_id
    }

    /// A handle for work bound to this subscription.
    pub fn handle(&self) -> SubscriptionHandle {
        self.handle.clone()
    }
}

impl Drop for StreamSubscription {
    fn drop(&mut self) {
        self.handle.token.cancel();
    }
}

/// Cloneable view of a subscription held by the tasks working for it.
#[derive(Debug, Clone)]
pub struct SubscriptionHandle {
    thread_id: String,
    id: SubscriptionId,
    token: CancellationToken,
    streamed: Arc<AtomicBool>,
}

impl SubscriptionHandle {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn is_released(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the owning subscription is released.
    pub async fn released(&self) {
        self.token.cancelled().await;
    }

    /// Records that a run delivered live state; history loads must not
    /// overwrite it afterwards.
    pub fn mark_streamed(&self) {
        self.streamed.store(true, Ordering::Release);
    }

    pub fn has_streamed(&self) -> bool {
        self.streamed.load(Ordering::Acquire)
    }
}

/// Holds at most one subscription. Acquiring a new one releases the old one first.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    current: Option<StreamSubscription>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&mut self, thread_id: impl Into<String>, id: SubscriptionId) -> SubscriptionHandle {
        self.release();
        let subscription = StreamSubscription::new(thread_id.into(), id);
        chat_debug!(
            "Subscribed to thread {} as #{}",
            subscription.thread_id(),
            id
        );
        self.current.insert(subscription).handle()
    }

    pub fn release(&mut self) {
        if let Some(previous) = self.current.take() {
            chat_debug!(
                "Released subscription #{} for thread {}",
                previous.id(),
                previous.thread_id()
            );
        }
    }

    pub fn current(&self) -> Option<&StreamSubscription> {
        self.current.as_ref()
    }

    /// Handle for `id` if it is still the live subscription.
    pub fn handle_for(&self, id: SubscriptionId) -> Option<SubscriptionHandle> {
        self.current
            .as_ref()
            .filter(|subscription| subscription.id() == id)
            .map(StreamSubscription::handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquiring_releases_previous_subscription() {
        let mut manager = SubscriptionManager::new();
        let first = manager.acquire("t1", 1);
        assert!(!first.is_released());

        let second = manager.acquire("t2", 2);
        assert!(first.is_released());
        assert!(!second.is_released());
        assert_eq!(manager.current().map(StreamSubscription::thread_id), Some("t2"));
    }

    #[test]
    fn stale_ids_have_no_handle() {
        let mut manager = SubscriptionManager::new();
        manager.acquire("t1", 1);
        manager.acquire("t1", 2);
        assert!(manager.handle_for(1).is_none());
        assert_eq!(manager.handle_for(2).map(|handle| handle.id()), Some(2));
    }

    #[test]
    fn release_cancels_outstanding_handles() {
        let mut manager = SubscriptionManager::new();
        let handle = manager.acquire("t1", 1);
        manager.release();
        assert!(handle.is_released());
        assert!(manager.current().is_none());
    }

    #[test]
    fn streamed_flag_is_shared_between_handles() {
        let mut manager = SubscriptionManager::new();
        let history = manager.acquire("t1", 1);
        let run = manager.handle_for(1).unwrap();
        run.mark_streamed();
        assert!(history.has_streamed());
    }
}
