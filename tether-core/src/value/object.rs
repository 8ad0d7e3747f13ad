//! Keyed Objects
//!
//! An `Object` is the plain, untracked state container that reactive
//! wrappers intercept. It is a shared handle: cloning an `Object` yields
//! another handle to the same storage, and two handles are "the same object"
//! exactly when they point at the same allocation.
//!
//! Every object carries a process-unique [`ObjectId`]. The dependency
//! registry and the identity cache key their entries by this id and keep only
//! a [`WeakObject`], so neither extends the object's lifetime. Ids are never
//! reused, which means an entry left behind by a dropped object can never be
//! mistaken for a live one.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::Value;

/// Unique identifier for an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

struct ObjectInner {
    id: ObjectId,
    props: RwLock<IndexMap<String, Value>>,
}

/// A shared, insertion-ordered map from string keys to values.
///
/// Reads and writes through an `Object` are never tracked. Wrap it with
/// [`Runtime::reactive_object`](crate::Runtime::reactive_object) to get a
/// tracked view.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    /// Create an empty object.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                id: ObjectId::next(),
                props: RwLock::new(IndexMap::new()),
            }),
        }
    }

    /// Get the object's unique ID.
    pub fn id(&self) -> ObjectId {
        self.inner.id
    }

    /// Read a property.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.props.read().get(key).cloned()
    }

    /// Check whether a property is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.props.read().contains_key(key)
    }

    /// Write a property, returning the value it replaced.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.props.write().insert(key.into(), value.into())
    }

    /// Remove a property, returning its value. Remaining keys keep their order.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.props.write().shift_remove(key)
    }

    /// The keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.props.read().keys().cloned().collect()
    }

    /// A snapshot of every entry, in insertion order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .props
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.inner.props.read().len()
    }

    /// Whether the object has no properties.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether two handles refer to the same object.
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Create a weak handle that does not keep the object alive.
    pub fn downgrade(&self) -> WeakObject {
        WeakObject {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Object
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        {
            let mut props = object.inner.props.write();
            for (key, value) in iter {
                props.insert(key.into(), value.into());
            }
        }
        object
    }
}

impl fmt::Debug for Object {
    // Keys only: objects may contain themselves.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("id", &self.inner.id)
            .field("keys", &self.keys())
            .finish()
    }
}

/// A weak handle to an [`Object`].
#[derive(Clone)]
pub struct WeakObject {
    inner: Weak<ObjectInner>,
}

impl WeakObject {
    /// Get a strong handle if the object is still alive.
    pub fn upgrade(&self) -> Option<Object> {
        self.inner.upgrade().map(|inner| Object { inner })
    }

    /// Whether the object is still alive.
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

impl fmt::Debug for WeakObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakObject")
            .field("alive", &self.is_alive())
            .finish()
    }
}
