//! Lifecycle events and the event manager.

use std::fmt;
use std::sync::Arc;

use bson::Document;
use parking_lot::RwLock;
use tracing::trace;

/// Document lifecycle stages subscribers can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    /// Before a document is inserted.
    PrePersist,
    /// After a document was inserted.
    PostPersist,
    /// Before a document is updated.
    PreUpdate,
    /// After a document was updated.
    PostUpdate,
    /// Before a document is removed.
    PreRemove,
    /// After a document was removed.
    PostRemove,
}

/// A subscriber hooked into document lifecycle stages.
pub trait EventSubscriber: Send + Sync {
    /// The stages this subscriber wants to see.
    fn subscribed_stages(&self) -> &'static [LifecycleStage];

    /// Handle one event. `document` may be mutated in place.
    fn handle(&self, stage: LifecycleStage, class: &str, document: &mut Document);
}

/// Dispatches lifecycle events to subscribers.
#[derive(Default)]
pub struct EventManager {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventManager {
    /// Create an empty event manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a subscriber.
    pub fn add_subscriber(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Dispatch `stage` for `class` to every subscriber listening to it.
    pub fn dispatch(&self, stage: LifecycleStage, class: &str, document: &mut Document) {
        let subscribers: Vec<_> = self.subscribers.read().iter().cloned().collect();
        for subscriber in subscribers {
            if subscriber.subscribed_stages().contains(&stage) {
                trace!(?stage, class = %class, "dispatching lifecycle event");
                subscriber.handle(stage, class, document);
            }
        }
    }
}

impl fmt::Debug for EventManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bson::doc;
    use pretty_assertions::assert_eq;

    use super::*;

    struct Recorder {
        stages: &'static [LifecycleStage],
        seen: AtomicUsize,
    }

    impl Recorder {
        fn new(stages: &'static [LifecycleStage]) -> Self {
            Self {
                stages,
                seen: AtomicUsize::new(0),
            }
        }
    }

    impl EventSubscriber for Recorder {
        fn subscribed_stages(&self) -> &'static [LifecycleStage] {
            self.stages
        }

        fn handle(&self, _stage: LifecycleStage, _class: &str, document: &mut Document) {
            self.seen.fetch_add(1, Ordering::SeqCst);
            document.insert("touched", true);
        }
    }

    #[test]
    fn test_dispatch_filters_by_stage() {
        let manager = EventManager::new();
        let persist_only = Arc::new(Recorder::new(&[LifecycleStage::PrePersist]));
        manager.add_subscriber(persist_only.clone());
        assert_eq!(manager.subscriber_count(), 1);

        let mut document = doc! {};
        manager.dispatch(LifecycleStage::PreUpdate, "User", &mut document);
        assert_eq!(persist_only.seen.load(Ordering::SeqCst), 0);
        assert!(!document.contains_key("touched"));

        manager.dispatch(LifecycleStage::PrePersist, "User", &mut document);
        assert_eq!(persist_only.seen.load(Ordering::SeqCst), 1);
        assert!(document.contains_key("touched"));
    }
}
