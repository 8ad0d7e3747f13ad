//! Subscriber types for the reactive system.
//!
//! A subscriber is any computation that can sit in a dependency set: it has
//! an identity, it can be re-run, and it may carry a scheduler override that
//! takes over re-execution when one of its dependencies changes.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use crate::graph::WeakDep;

/// Unique identifier for a subscriber.
///
/// Each computation gets a unique ID when created. Dependency sets are keyed
/// by it, which is what gives them set semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased view of a computation, as seen by dependency sets and the
/// execution context.
pub(crate) trait Subscriber: Send + Sync {
    fn subscriber_id(&self) -> SubscriberId;

    fn is_active(&self) -> bool;

    fn has_scheduler(&self) -> bool;

    /// Hand the computation to its scheduler override.
    fn schedule(self: Arc<Self>);

    /// Run the computation, discarding its result.
    fn rerun(self: Arc<Self>);

    /// Record the reverse edge to a dependency set this subscriber joined.
    fn link(&self, dep: WeakDep);
}

/// A deferred re-run of a computation, handed to scheduler overrides.
///
/// A job holds the computation weakly: queuing it does not keep the
/// computation alive, and running a job whose computation was dropped or
/// deactivated does nothing.
#[derive(Clone)]
pub struct Job {
    id: SubscriberId,
    subscriber: Weak<dyn Subscriber>,
}

impl Job {
    pub(crate) fn new(id: SubscriberId, subscriber: Weak<dyn Subscriber>) -> Self {
        Self { id, subscriber }
    }

    /// ID of the computation this job re-runs.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Whether the computation is still alive and active.
    pub fn is_live(&self) -> bool {
        self.subscriber
            .upgrade()
            .map(|subscriber| subscriber.is_active())
            .unwrap_or(false)
    }

    /// Run the computation. Returns `false` if it is gone or deactivated.
    pub fn run(&self) -> bool {
        match self.subscriber.upgrade() {
            Some(subscriber) if subscriber.is_active() => {
                subscriber.rerun();
                true
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
