// ABOUTME: Listener registry - ordered storage of no-argument refresh callbacks.
// ABOUTME: Ids are monotonic, so map order is registration order.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A refresh listener. Reads coordinator state itself when invoked.
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Identifies one listener registration.
///
/// Registering the same callable twice yields two distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    listeners: BTreeMap<ListenerId, Listener>,
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.insert(id, listener);
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(&id).is_some()
    }

    pub(crate) fn get(&self, id: ListenerId) -> Option<Listener> {
        self.listeners.get(&id).cloned()
    }

    /// Ids in registration order. Notification walks this snapshot and looks
    /// each id up again, so listeners removed mid-walk are skipped.
    pub(crate) fn ids(&self) -> Vec<ListenerId> {
        self.listeners.keys().copied().collect()
    }

    pub(crate) fn clear(&mut self) {
        self.listeners.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
