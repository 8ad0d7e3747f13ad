//! Dependency Graph
//!
//! This module holds the graph between state locations and the
//! computations that read them.
//!
//! # Overview
//!
//! The graph is bipartite:
//!
//! - A [`Dep`] is the set of computations subscribed to one state location,
//!   either an `(object, key)` pair or the single slot of a boxed value.
//! - Each computation keeps the list of `Dep`s it belongs to (its reverse
//!   edges), so it can unlink itself without searching the registry.
//!
//! Edges are always created in both directions in the same step.
//!
//! The [`TargetMap`] maps objects to their per-key `Dep`s. It never keeps
//! an object alive. The [`UpdateQueue`] is a ready-made scheduler override
//! that defers re-runs until the host flushes it.

mod dep;
mod registry;
mod scheduler;

pub use dep::Dep;
pub(crate) use dep::WeakDep;
pub(crate) use registry::TargetMap;
pub use scheduler::UpdateQueue;
