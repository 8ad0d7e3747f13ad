//! Reactive Runtime
//!
//! The runtime is the central coordinator that connects reactive objects,
//! refs and effects. It owns the dependency registry, the identity cache and
//! the execution context, and implements the two graph operations everything
//! else is built on: record-on-read and notify-on-write.
//!
//! # How It Works
//!
//! 1. An effect runs and becomes the active computation.
//!
//! 2. Reads through a reactive wrapper or a ref call `track`, which records a
//!    two-way edge between the active computation and the location's
//!    dependency set.
//!
//! 3. A write that changes a value calls `trigger`, which snapshots the
//!    location's subscribers and, in insertion order, schedules or re-runs
//!    each of them, skipping the computation that is currently running.
//!
//! # Isolation
//!
//! Runtimes share nothing. Two runtimes can track the same object without
//! seeing each other's edges. Registered effects hold their runtime, so a
//! runtime's graph is torn down once its last handle is dropped and every
//! effect that still reads through it has been deactivated. A single runtime is meant to be driven from one thread
//! at a time; its handles are `Send + Sync` so that they can be moved to the
//! thread that owns them.

use std::fmt;
use std::sync::Arc;

use super::context::ExecutionContext;
use super::effect::{ReactiveEffect, Runner};
use super::refs::Ref;
use super::subscriber::{Job, SubscriberId};
use super::wrapper::{IdentityCache, Reactive};
use crate::config::{NotifyPolicy, RuntimeConfig};
use crate::graph::{Dep, TargetMap};
use crate::value::{Object, Value};

struct RuntimeInner {
    config: RuntimeConfig,
    context: ExecutionContext,
    targets: TargetMap,
    wrappers: IdentityCache,
}

/// Handle to a reactive runtime.
///
/// Cloning the handle is cheap; every clone refers to the same runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Create a runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: RuntimeConfig) -> Self {
        tracing::debug!(?config, "creating reactive runtime");
        Self {
            inner: Arc::new(RuntimeInner {
                context: ExecutionContext::new(),
                targets: TargetMap::new(config.registry_prune_threshold),
                wrappers: IdentityCache::new(config.registry_prune_threshold),
                config,
            }),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    pub(crate) fn context(&self) -> &ExecutionContext {
        &self.inner.context
    }

    /// Check if a computation is currently running.
    ///
    /// Callers building their own tracked containers consult this before
    /// paying for dependency bookkeeping.
    pub fn is_tracking(&self) -> bool {
        self.inner.context.is_active()
    }

    /// Get the currently running computation, if any.
    pub fn active_subscriber(&self) -> Option<SubscriberId> {
        self.inner.context.active_id()
    }

    /// Record that the active computation read `key` on `target`.
    ///
    /// Does nothing when no computation is running.
    pub fn track(&self, target: &Object, key: &str) {
        if !self.is_tracking() {
            return;
        }
        let dep = self.inner.targets.dep_for(target, key);
        self.track_dep(&dep);
    }

    /// Notify the computations that read `key` on `target`.
    ///
    /// Does nothing if no computation ever read that location.
    pub fn trigger(&self, target: &Object, key: &str) {
        if let Some(dep) = self.inner.targets.get(target.id(), key) {
            self.trigger_dep(&dep);
        }
    }

    /// Record that the active computation depends on `dep`.
    ///
    /// Idempotent: reading the same location twice in one run creates one
    /// edge.
    pub fn track_dep(&self, dep: &Dep) {
        let Some(active) = self.inner.context.active() else {
            return;
        };
        let id = active.subscriber_id();
        if dep.insert(id, Arc::clone(&active)) {
            active.link(dep.downgrade());
            tracing::trace!(subscriber = ?id, "tracked dependency");
        }
    }

    /// Notify every computation in `dep`.
    ///
    /// The subscriber list is snapshotted before anything runs, so
    /// computations that deactivate themselves or write further state
    /// cannot make the batch skip or repeat a subscriber. A subscriber
    /// deactivated earlier in the batch still gets its call, which for an
    /// inert computation is a plain untracked run. The running computation
    /// is never re-triggered by its own writes.
    pub fn trigger_dep(&self, dep: &Dep) {
        let subscribers = dep.snapshot();
        if subscribers.is_empty() {
            return;
        }
        tracing::trace!(subscribers = subscribers.len(), "triggering dependency set");

        for subscriber in subscribers {
            if self.active_subscriber() == Some(subscriber.subscriber_id()) {
                continue;
            }

            if subscriber.has_scheduler() {
                subscriber.schedule();
                if self.inner.config.notify_policy == NotifyPolicy::StopAtFirstScheduled {
                    break;
                }
            } else {
                subscriber.rerun();
            }
        }
    }

    /// Wrap a keyed object for tracking.
    ///
    /// Non-object values and values that already are reactive wrappers are
    /// returned unchanged. Wrapping the same object twice yields the same
    /// wrapper.
    pub fn reactive(&self, value: Value) -> Value {
        match value {
            Value::Object(object) => Value::Reactive(self.reactive_object(object)),
            other => other,
        }
    }

    /// Wrap a keyed object for tracking, returning the wrapper directly.
    pub fn reactive_object(&self, target: Object) -> Reactive {
        self.inner.wrappers.get_or_wrap(self, target)
    }

    /// Create a boxed reactive value.
    pub fn ref_value(&self, value: impl Into<Value>) -> Ref {
        Ref::new(self.clone(), value.into())
    }

    /// Register a computation and run it once.
    ///
    /// The first run observes the initial state and establishes the initial
    /// edges. The returned runner re-runs the computation on demand and
    /// exposes it for deactivation.
    pub fn effect<T, F>(&self, work: F) -> Runner<T>
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let effect = ReactiveEffect::new(self, work);
        effect.run();
        Runner::new(effect)
    }

    /// Like [`Runtime::effect`], with a scheduler override that takes over
    /// re-execution whenever a dependency changes.
    pub fn effect_with_scheduler<T, F, S>(&self, work: F, scheduler: S) -> Runner<T>
    where
        T: 'static,
        F: Fn() -> T + Send + Sync + 'static,
        S: Fn(Job) + Send + Sync + 'static,
    {
        let effect = ReactiveEffect::with_scheduler(self, work, scheduler);
        effect.run();
        Runner::new(effect)
    }

    /// Drop registry and cache entries whose object or wrapper is gone.
    ///
    /// This also happens lazily as the registry grows; calling it is only
    /// useful for deterministic teardown. Returns the number of entries
    /// removed.
    pub fn collect_garbage(&self) -> usize {
        let targets = self.inner.targets.prune();
        let wrappers = self.inner.wrappers.prune();
        tracing::debug!(targets, wrappers, "collected dead reactive entries");
        targets + wrappers
    }

    /// Number of objects with at least one tracked key.
    pub fn tracked_target_count(&self) -> usize {
        self.inner.targets.target_count()
    }

    /// Number of tracked keys on `target`.
    pub fn tracked_key_count(&self, target: &Object) -> usize {
        self.inner.targets.key_count(target.id())
    }

    /// Number of live entries in the identity cache.
    pub fn wrapper_count(&self) -> usize {
        self.inner.wrappers.len()
    }

    /// Whether two handles refer to the same runtime.
    pub fn ptr_eq(&self, other: &Runtime) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.inner.config)
            .field("depth", &self.inner.context.depth())
            .field("targets", &self.tracked_target_count())
            .field("wrappers", &self.wrapper_count())
            .finish()
    }
}
