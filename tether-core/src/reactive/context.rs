//! Execution Context
//!
//! The execution context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a reactive location is
//! read, the runtime registers the computation on top of the stack as a
//! dependent.
//!
//! # Implementation
//!
//! Each runtime owns one stack. Running a computation pushes it; the
//! returned guard pops it when dropped, so the stack stays balanced even when
//! the work function panics. The top of the stack is "the active
//! computation", and there is no separate pointer that could drift from it.
//!
//! Nesting is what the stack is for: a computation that runs another one
//! inline becomes active again as soon as the inner one returns, so reads on
//! either side of the nested run are attributed to the outer computation.

use std::sync::Arc;

use parking_lot::Mutex;

use super::subscriber::{Subscriber, SubscriberId};

/// LIFO stack of running computations.
pub(crate) struct ExecutionContext {
    stack: Mutex<Vec<Arc<dyn Subscriber>>>,
}

impl ExecutionContext {
    pub(crate) fn new() -> Self {
        Self {
            stack: Mutex::new(Vec::new()),
        }
    }

    /// Push `subscriber` unless it is already running.
    ///
    /// Returns `None` for a re-entrant invocation; otherwise the guard keeps
    /// the subscriber on the stack until dropped.
    pub(crate) fn try_enter(&self, subscriber: Arc<dyn Subscriber>) -> Option<ExecutionGuard<'_>> {
        let subscriber_id = subscriber.subscriber_id();
        let mut stack = self.stack.lock();
        if stack.iter().any(|entry| entry.subscriber_id() == subscriber_id) {
            return None;
        }
        stack.push(subscriber);

        Some(ExecutionGuard {
            context: self,
            subscriber_id,
        })
    }

    /// Whether any computation is running.
    pub(crate) fn is_active(&self) -> bool {
        !self.stack.lock().is_empty()
    }

    /// The computation on top of the stack.
    pub(crate) fn active(&self) -> Option<Arc<dyn Subscriber>> {
        self.stack.lock().last().cloned()
    }

    pub(crate) fn active_id(&self) -> Option<SubscriberId> {
        self.stack.lock().last().map(|entry| entry.subscriber_id())
    }

    pub(crate) fn depth(&self) -> usize {
        self.stack.lock().len()
    }
}

/// Guard that pops the context when dropped.
///
/// This ensures the stack is properly maintained even if the computation
/// panics.
pub(crate) struct ExecutionGuard<'a> {
    context: &'a ExecutionContext,
    subscriber_id: SubscriberId,
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        let popped = self.context.stack.lock().pop();

        if let Some(entry) = popped {
            debug_assert_eq!(
                entry.subscriber_id(),
                self.subscriber_id,
                "execution stack mismatch: expected {:?}, got {:?}",
                self.subscriber_id,
                entry.subscriber_id()
            );
        }
    }
}
