//! Reactive Object Wrapper
//!
//! A [`Reactive`] is a tracked view of an [`Object`]. Reads record a
//! dependency for the active computation; writes that change a value notify
//! the computations that read it.
//!
//! # Identity
//!
//! Wrapping the same object twice through one runtime yields the same
//! wrapper for as long as any handle to it is alive. The identity cache maps
//! object IDs to weak wrapper handles, so it extends neither the object's
//! nor the wrapper's lifetime. An object that is wrapped again after every
//! wrapper handle was dropped gets a fresh wrapper; nobody is left holding
//! the old one to compare against.
//!
//! # Nested objects
//!
//! Wrapping is lazy. `get` returns nested objects raw; `child` wraps them at
//! the moment they are read.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use super::runtime::Runtime;
use crate::value::{Object, ObjectId, Value};

/// Reserved introspection key. A wrapper answers `true` to it without
/// tracking the read.
pub const IS_REACTIVE: &str = "__v_isReactive";

pub(crate) struct ReactiveInner {
    runtime: Runtime,
    target: Object,
}

/// A tracked view of a keyed object.
///
/// # Example
///
/// ```rust
/// use tether_core::{Object, Runtime};
///
/// let rt = Runtime::new();
/// let state = rt.reactive_object(Object::from_iter([("count", 0)]));
///
/// let reader = state.clone();
/// let runner = rt.effect(move || reader.get("count"));
///
/// state.set("count", 1);
/// assert_eq!(runner.effect().run_count(), 2);
/// ```
#[derive(Clone)]
pub struct Reactive {
    inner: Arc<ReactiveInner>,
}

impl Reactive {
    /// Read a property, tracking the read.
    pub fn get(&self, key: &str) -> Option<Value> {
        if key == IS_REACTIVE {
            return Some(Value::Bool(true));
        }
        self.inner.runtime.track(&self.inner.target, key);
        self.inner.target.get(key)
    }

    /// Check whether a property is present, tracking the read.
    pub fn has(&self, key: &str) -> bool {
        if key == IS_REACTIVE {
            return true;
        }
        self.inner.runtime.track(&self.inner.target, key);
        self.inner.target.contains_key(key)
    }

    /// Read a nested object as a wrapper, tracking the read.
    ///
    /// Returns `None` if the property is missing or not an object.
    pub fn child(&self, key: &str) -> Option<Reactive> {
        match self.get(key)? {
            Value::Object(object) => Some(self.inner.runtime.reactive_object(object)),
            Value::Reactive(reactive) => Some(reactive),
            _ => None,
        }
    }

    /// Write a property, returning the value it replaced.
    ///
    /// Readers are notified only if the new value differs from the old one.
    /// Writing an equal value is silent.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();

        let prior = self.inner.target.set(key.clone(), value.clone());
        if prior.as_ref() != Some(&value) {
            self.inner.runtime.trigger(&self.inner.target, &key);
        }
        prior
    }

    /// Remove a property. Readers are notified if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        let prior = self.inner.target.remove(key);
        if prior.is_some() {
            self.inner.runtime.trigger(&self.inner.target, key);
        }
        prior
    }

    /// The wrapped object. Access through it is untracked.
    pub fn to_raw(&self) -> Object {
        self.inner.target.clone()
    }

    /// ID of the wrapped object.
    pub fn id(&self) -> ObjectId {
        self.inner.target.id()
    }

    /// The runtime this wrapper reports to.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    /// Whether two handles are the same wrapper.
    pub fn ptr_eq(&self, other: &Reactive) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Reactive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reactive").field(&self.inner.target).finish()
    }
}

/// Whether `value` is a reactive wrapper.
pub fn is_reactive(value: &Value) -> bool {
    value.is_reactive()
}

struct Wrappers {
    entries: HashMap<ObjectId, Weak<ReactiveInner>>,
    next_prune: usize,
}

/// Object ID to wrapper map, weak on both sides.
pub(crate) struct IdentityCache {
    wrappers: Mutex<Wrappers>,
    prune_threshold: usize,
}

impl IdentityCache {
    pub(crate) fn new(prune_threshold: usize) -> Self {
        let prune_threshold = prune_threshold.max(1);
        Self {
            wrappers: Mutex::new(Wrappers {
                entries: HashMap::new(),
                next_prune: prune_threshold,
            }),
            prune_threshold,
        }
    }

    /// The cached wrapper for `target`, or a new one.
    pub(crate) fn get_or_wrap(&self, runtime: &Runtime, target: Object) -> Reactive {
        let mut wrappers = self.wrappers.lock();
        let id = target.id();

        if let Some(inner) = wrappers.entries.get(&id).and_then(Weak::upgrade) {
            return Reactive { inner };
        }

        if wrappers.entries.len() >= wrappers.next_prune {
            wrappers.entries.retain(|_, wrapper| wrapper.strong_count() > 0);
            wrappers.next_prune = (wrappers.entries.len() * 2).max(self.prune_threshold);
        }

        let inner = Arc::new(ReactiveInner {
            runtime: runtime.clone(),
            target,
        });
        wrappers.entries.insert(id, Arc::downgrade(&inner));
        Reactive { inner }
    }

    /// Drop entries whose wrapper is gone.
    pub(crate) fn prune(&self) -> usize {
        let mut wrappers = self.wrappers.lock();
        let before = wrappers.entries.len();
        wrappers.entries.retain(|_, wrapper| wrapper.strong_count() > 0);
        wrappers.next_prune = (wrappers.entries.len() * 2).max(self.prune_threshold);
        before - wrappers.entries.len()
    }

    /// Number of live wrappers.
    pub(crate) fn len(&self) -> usize {
        self.wrappers
            .lock()
            .entries
            .values()
            .filter(|wrapper| wrapper.strong_count() > 0)
            .count()
    }
}
