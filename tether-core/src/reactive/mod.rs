//! Reactive Primitives
//!
//! This module implements the core reactive system: reactive objects, refs
//! and effects, all coordinated by a [`Runtime`].
//!
//! # Concepts
//!
//! ## Reactive objects
//!
//! A [`Reactive`] wraps a keyed [`Object`](crate::Object). Reading a
//! property within a running effect registers the effect as a dependent of
//! that `(object, key)` location; writing a different value re-runs every
//! dependent.
//!
//! ## Refs
//!
//! A [`Ref`] is a boxed value with a single dependency set, for state that is
//! not naturally a keyed object.
//!
//! ## Effects
//!
//! A [`ReactiveEffect`] is a computation that re-runs whenever its
//! dependencies change, either inline or through a scheduler override.
//!
//! # Implementation Notes
//!
//! Each runtime keeps a stack of running computations. When a tracked
//! location is read, the computation on top of the stack is recorded as a
//! dependent, and the dependency set is recorded on the computation so it
//! can later unlink itself.

mod context;
mod effect;
mod refs;
mod runtime;
mod subscriber;
mod wrapper;

pub use effect::{ReactiveEffect, Runner};
pub use refs::Ref;
pub use runtime::Runtime;
pub(crate) use subscriber::Subscriber;
pub use subscriber::{Job, SubscriberId};
pub use wrapper::{is_reactive, Reactive, IS_REACTIVE};
