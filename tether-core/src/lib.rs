//! Tether Core
//!
//! This crate provides a fine-grained reactive dependency-tracking engine.
//! It lets mutable state notify exactly the computations that read it, with
//! no manual subscription bookkeeping. It implements:
//!
//! - Reactive objects: tracked views over keyed objects
//! - Refs: boxed reactive values
//! - Effects: computations that re-run when what they read changes
//! - A deferred update queue for hosts that batch re-runs
//!
//! The crate is designed to be used both as a native Rust library and,
//! with the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: the runtime, effects, reactive wrappers and refs
//! - `graph`: dependency sets, the dependency registry and the update queue
//! - `value`: dynamic values and keyed objects
//! - `config`: runtime configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicI64, Ordering};
//! use std::sync::Arc;
//!
//! use tether_core::{Object, Runtime};
//!
//! let rt = Runtime::new();
//! let state = rt.reactive_object(Object::from_iter([("count", 0)]));
//! let seen = Arc::new(AtomicI64::new(-1));
//!
//! let reader = state.clone();
//! let seen_clone = seen.clone();
//! let _runner = rt.effect(move || {
//!     let count = reader.get("count").and_then(|v| v.as_int()).unwrap_or_default();
//!     seen_clone.store(count, Ordering::SeqCst);
//! });
//!
//! state.set("count", 5);
//! // The effect re-ran automatically.
//! assert_eq!(seen.load(Ordering::SeqCst), 5);
//! ```

pub mod config;
pub mod error;
pub mod graph;
pub mod reactive;
pub mod value;

#[cfg(feature = "python")]
mod python;

pub use config::{NotifyPolicy, RuntimeConfig};
pub use error::{Result, TetherError};
pub use graph::{Dep, UpdateQueue};
pub use reactive::{
    is_reactive, Job, Reactive, ReactiveEffect, Ref, Runner, Runtime, SubscriberId, IS_REACTIVE,
};
pub use value::{Object, ObjectId, Value, WeakObject};
