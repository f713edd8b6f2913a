//! Routing table from native window ids to their owning webviews.
//!
//! Entries are non-owning: the registry never keeps a webview alive. A dead
//! weak reference is treated as "no owner" and pruned on lookup.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use blink_common::{Disposition, Message, WindowId};

/// An object that gets first refusal on messages for its window.
pub trait MessageConsumer: Send + Sync {
    fn window_id(&self) -> WindowId;

    /// Handle `msg` before default dispatch. Runs on the UI thread.
    fn process_message(&self, msg: &Message) -> Disposition;

    /// The native window is gone. Runs on the UI thread, at most once.
    fn window_destroyed(&self) {}
}

#[derive(Default)]
pub struct HandleRegistry {
    entries: HashMap<WindowId, Weak<dyn MessageConsumer>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route messages for `id` to `consumer`, replacing any existing entry.
    pub fn register(&mut self, id: WindowId, consumer: Weak<dyn MessageConsumer>) {
        if let Some(previous) = self.entries.insert(id, consumer) {
            if previous.strong_count() > 0 {
                tracing::warn!(window = %id, "replacing live registry entry");
            }
        }
        tracing::debug!(window = %id, "window registered");
    }

    /// Returns `true` if an entry was removed.
    pub fn unregister(&mut self, id: WindowId) -> bool {
        let removed = self.entries.remove(&id).is_some();
        if removed {
            tracing::debug!(window = %id, "window unregistered");
        }
        removed
    }

    pub fn lookup(&mut self, id: WindowId) -> Option<Arc<dyn MessageConsumer>> {
        let entry = self.entries.get(&id)?;
        match entry.upgrade() {
            Some(consumer) => Some(consumer),
            None => {
                self.entries.remove(&id);
                None
            }
        }
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.entries
            .get(&id)
            .is_some_and(|entry| entry.strong_count() > 0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        let mut ids: Vec<WindowId> = self.entries.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Remove every entry in id order. Entries whose owner is gone come
    /// back as `None`; their native windows still exist.
    pub fn drain(&mut self) -> Vec<(WindowId, Option<Arc<dyn MessageConsumer>>)> {
        let mut drained: Vec<_> = self
            .entries
            .drain()
            .map(|(id, entry)| (id, entry.upgrade()))
            .collect();
        drained.sort_by_key(|(id, _)| *id);
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blink_common::MessageKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counter {
        id: WindowId,
        seen: AtomicUsize,
    }

    impl MessageConsumer for Counter {
        fn window_id(&self) -> WindowId {
            self.id
        }

        fn process_message(&self, _msg: &Message) -> Disposition {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Disposition::Consumed
        }
    }

    fn counter(id: isize) -> Arc<dyn MessageConsumer> {
        Arc::new(Counter {
            id: WindowId(id),
            seen: AtomicUsize::new(0),
        })
    }

    #[test]
    fn lookup_after_register() {
        let mut registry = HandleRegistry::new();
        let owner = counter(1001);
        registry.register(WindowId(1001), Arc::downgrade(&owner));

        let found = registry.lookup(WindowId(1001)).unwrap();
        assert_eq!(found.window_id(), WindowId(1001));
        let msg = Message::new(WindowId(1001), MessageKind::USER);
        assert_eq!(found.process_message(&msg), Disposition::Consumed);
    }

    #[test]
    fn lookup_missing_is_none() {
        let mut registry = HandleRegistry::new();
        assert!(registry.lookup(WindowId(7)).is_none());
    }

    #[test]
    fn unregister_removes_entry() {
        let mut registry = HandleRegistry::new();
        let owner = counter(1001);
        registry.register(WindowId(1001), Arc::downgrade(&owner));
        assert!(registry.unregister(WindowId(1001)));
        assert!(!registry.unregister(WindowId(1001)));
        assert!(registry.lookup(WindowId(1001)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn register_replaces_existing_entry() {
        let mut registry = HandleRegistry::new();
        let first = counter(1);
        let second = counter(1);
        registry.register(WindowId(1), Arc::downgrade(&first));
        registry.register(WindowId(1), Arc::downgrade(&second));
        assert_eq!(registry.len(), 1);
        let found = registry.lookup(WindowId(1)).unwrap();
        assert!(Arc::ptr_eq(&found, &second));
    }

    #[test]
    fn dead_owner_is_pruned() {
        let mut registry = HandleRegistry::new();
        let owner = counter(3);
        registry.register(WindowId(3), Arc::downgrade(&owner));
        drop(owner);
        assert!(!registry.contains(WindowId(3)));
        assert!(registry.lookup(WindowId(3)).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn drain_returns_every_entry_in_id_order() {
        let mut registry = HandleRegistry::new();
        let a = counter(20);
        let b = counter(10);
        let dead = counter(30);
        registry.register(WindowId(20), Arc::downgrade(&a));
        registry.register(WindowId(10), Arc::downgrade(&b));
        registry.register(WindowId(30), Arc::downgrade(&dead));
        drop(dead);

        let drained: Vec<(WindowId, bool)> = registry
            .drain()
            .into_iter()
            .map(|(id, owner)| (id, owner.is_some()))
            .collect();
        assert_eq!(
            drained,
            vec![(WindowId(10), true), (WindowId(20), true), (WindowId(30), false)]
        );
        assert!(registry.is_empty());
    }
}
