//! Dependency Sets
//!
//! A dependency set is an insertion-ordered set of subscribers. Order
//! matters: a write notifies subscribers first-subscribed, first-notified.
//!
//! Sets own their subscribers. A computation stays registered, and alive,
//! for as long as some set it joined can notify it; `deactivate` is what
//! takes it out of every set. The computation points back at its sets only
//! weakly, so a set dropped with its object or ref frees its subscribers.

use std::fmt;
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::reactive::{Subscriber, SubscriberId};

#[derive(Default)]
pub(crate) struct DepInner {
    subscribers: Mutex<IndexMap<SubscriberId, Arc<dyn Subscriber>>>,
}

/// The set of computations subscribed to one state location.
///
/// Hosts building their own tracked containers create a `Dep` per slot and
/// drive it with [`Runtime::track_dep`](crate::Runtime::track_dep) and
/// [`Runtime::trigger_dep`](crate::Runtime::trigger_dep).
#[derive(Clone, Default)]
pub struct Dep {
    inner: Arc<DepInner>,
}

impl Dep {
    /// Create an empty dependency set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscribers.
    pub fn len(&self) -> usize {
        self.inner.subscribers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the subscriber is a member.
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.subscribers.lock().contains_key(&id)
    }

    /// Whether two handles refer to the same set.
    pub fn ptr_eq(&self, other: &Dep) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Add a subscriber. Returns `false` if it was already a member.
    pub(crate) fn insert(&self, id: SubscriberId, subscriber: Arc<dyn Subscriber>) -> bool {
        let mut subscribers = self.inner.subscribers.lock();
        if subscribers.contains_key(&id) {
            return false;
        }
        subscribers.insert(id, subscriber);
        true
    }

    /// Remove a subscriber, keeping the order of the others.
    pub(crate) fn remove(&self, id: SubscriberId) -> bool {
        self.inner.subscribers.lock().shift_remove(&id).is_some()
    }

    /// Subscribers in insertion order.
    pub(crate) fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.inner.subscribers.lock().values().cloned().collect()
    }

    pub(crate) fn downgrade(&self) -> WeakDep {
        WeakDep(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep").field("len", &self.len()).finish()
    }
}

/// Reverse edge from a computation to a dependency set.
#[derive(Clone)]
pub(crate) struct WeakDep(Weak<DepInner>);

impl WeakDep {
    pub(crate) fn upgrade(&self) -> Option<Dep> {
        self.0.upgrade().map(|inner| Dep { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}
