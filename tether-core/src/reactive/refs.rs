//! Boxed Values
//!
//! A [`Ref`] is a single-slot reactive container for values that are not
//! naturally keyed objects: a number, a string, an object that gets swapped
//! out wholesale. It owns exactly one dependency set, created the first time
//! a computation reads the ref.
//!
//! The ref keeps both the raw value it was given and a converted value:
//! keyed objects are passed through the runtime's reactive wrapper on the way
//! in, so reading an object out of a ref yields a tracked view.

use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;

use super::runtime::Runtime;
use crate::graph::Dep;
use crate::value::Value;

struct Slot {
    /// The value as written; change detection compares against this.
    raw: Value,
    /// The value as read; objects are wrapped.
    value: Value,
}

struct RefInner {
    runtime: Runtime,
    slot: Mutex<Slot>,
    dep: OnceLock<Dep>,
}

/// A boxed reactive value.
///
/// # Example
///
/// ```rust
/// use tether_core::Runtime;
///
/// let rt = Runtime::new();
/// let count = rt.ref_value(1);
///
/// let reader = count.clone();
/// let runner = rt.effect(move || reader.get());
///
/// count.set(2);
/// count.set(2);
/// assert_eq!(runner.effect().run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Ref {
    inner: Arc<RefInner>,
}

impl Ref {
    pub(crate) fn new(runtime: Runtime, raw: Value) -> Self {
        let value = runtime.reactive(raw.clone());
        Self {
            inner: Arc::new(RefInner {
                runtime,
                slot: Mutex::new(Slot { raw, value }),
                dep: OnceLock::new(),
            }),
        }
    }

    /// Get the current value.
    ///
    /// If called within a running computation, this also registers the
    /// computation as a subscriber.
    pub fn get(&self) -> Value {
        let runtime = &self.inner.runtime;
        if runtime.is_tracking() {
            let dep = self.inner.dep.get_or_init(Dep::new);
            runtime.track_dep(dep);
        }
        self.inner.slot.lock().value.clone()
    }

    /// Get the current value without tracking.
    pub fn get_untracked(&self) -> Value {
        self.inner.slot.lock().value.clone()
    }

    /// The raw value last written, before conversion.
    pub fn raw(&self) -> Value {
        self.inner.slot.lock().raw.clone()
    }

    /// Set a new value and notify subscribers.
    ///
    /// Does nothing if the value equals the raw value already stored.
    pub fn set(&self, value: impl Into<Value>) {
        let raw = value.into();
        {
            let mut slot = self.inner.slot.lock();
            if slot.raw == raw {
                return;
            }
            slot.value = self.inner.runtime.reactive(raw.clone());
            slot.raw = raw;
        }

        if let Some(dep) = self.inner.dep.get() {
            self.inner.runtime.trigger_dep(dep);
        }
    }

    /// Update the value using a function of the raw value.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&Value) -> Value,
    {
        let next = f(&self.raw());
        self.set(next);
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.inner.dep.get().map_or(0, Dep::len)
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ref")
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
