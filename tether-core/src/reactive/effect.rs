//! Effect Implementation
//!
//! A `ReactiveEffect` is a computation that re-runs whenever a location it
//! read during its last run changes.
//!
//! # How Effects Work
//!
//! 1. Running an effect pushes it onto the runtime's execution stack, making
//!    it the active computation, and invokes its work function.
//!
//! 2. Every reactive read performed while it is active records a two-way
//!    edge: the effect joins the location's dependency set, and the set is
//!    appended to the effect's reverse-edge list.
//!
//! 3. A write to one of those locations re-runs the effect inline, or hands
//!    it to its scheduler override if it has one.
//!
//! 4. With `cleanup_before_run` enabled (the default) the effect leaves every
//!    set before each tracked run, so locations it stopped reading no longer
//!    notify it.
//!
//! # Re-entrancy
//!
//! An effect that is already on the execution stack refuses to run again:
//! `run` returns `None`. Together with the trigger loop skipping the active
//! computation, this keeps a work function that writes what it reads from
//! looping.
//!
//! # Deactivation
//!
//! `deactivate` unlinks the effect from every dependency set and turns it
//! inert: later calls to `run` invoke the work function directly, with no
//! tracking.
//!
//! # Lifetime
//!
//! The dependency sets an effect joined own it, so dropping its handles does
//! not stop it. An effect registered and then forgotten keeps re-running
//! until it is deactivated or everything it read is gone.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use smallvec::SmallVec;

use super::runtime::Runtime;
use super::subscriber::{Job, Subscriber, SubscriberId};
use crate::graph::WeakDep;

type WorkFn<T> = Box<dyn Fn() -> T + Send + Sync>;
type SchedulerFn = Box<dyn Fn(Job) + Send + Sync>;

struct EffectInner<T> {
    id: SubscriberId,

    runtime: Runtime,

    /// The work function.
    work: WorkFn<T>,

    /// Optional override invoked instead of re-running on notification.
    scheduler: Option<SchedulerFn>,

    /// Cleared by `deactivate`; an inactive effect is an untracked call.
    active: AtomicBool,

    /// Dependency sets this effect currently belongs to.
    deps: Mutex<SmallVec<[WeakDep; 4]>>,

    /// Number of tracked runs.
    run_count: AtomicUsize,
}

impl<T> EffectInner<T> {
    /// Leave every dependency set. Returns how many edges were removed.
    fn unlink_all(&self) -> usize {
        let deps = std::mem::take(&mut *self.deps.lock());
        deps.iter()
            .filter_map(WeakDep::upgrade)
            .filter(|dep| dep.remove(self.id))
            .count()
    }
}

impl<T: 'static> EffectInner<T> {
    fn run(self: &Arc<Self>) -> Option<T> {
        if !self.active.load(Ordering::SeqCst) {
            return Some((self.work)());
        }

        let subscriber: Arc<dyn Subscriber> = self.clone();
        let Some(_guard) = self.runtime.context().try_enter(subscriber) else {
            tracing::trace!(subscriber = ?self.id, "skipped re-entrant run");
            return None;
        };

        if self.runtime.config().cleanup_before_run {
            self.unlink_all();
        }
        self.run_count.fetch_add(1, Ordering::SeqCst);

        Some((self.work)())
    }

    fn deactivate(&self) {
        if self.active.swap(false, Ordering::SeqCst) {
            let unlinked = self.unlink_all();
            tracing::debug!(subscriber = ?self.id, unlinked, "deactivated effect");
        }
    }
}

impl<T: 'static> Subscriber for EffectInner<T> {
    fn subscriber_id(&self) -> SubscriberId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    fn schedule(self: Arc<Self>) {
        if let Some(scheduler) = &self.scheduler {
            let weak = Arc::downgrade(&self);
            let weak: Weak<dyn Subscriber> = weak;
            scheduler(Job::new(self.id, weak));
        }
    }

    fn rerun(self: Arc<Self>) {
        let _ = self.run();
    }

    fn link(&self, dep: WeakDep) {
        self.deps.lock().push(dep);
    }
}

/// A tracked computation.
///
/// # Example
///
/// ```rust
/// use tether_core::{ReactiveEffect, Runtime};
///
/// let rt = Runtime::new();
/// let count = rt.ref_value(1);
///
/// let reader = count.clone();
/// let effect = ReactiveEffect::new(&rt, move || reader.get().as_int());
///
/// // Nothing has run yet; the first run establishes the edges.
/// assert_eq!(effect.run(), Some(Some(1)));
/// assert_eq!(effect.dependency_count(), 1);
/// ```
pub struct ReactiveEffect<T: 'static> {
    inner: Arc<EffectInner<T>>,
}

impl<T: 'static> ReactiveEffect<T> {
    /// Create an effect without running it.
    pub fn new<F>(runtime: &Runtime, work: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::build(runtime, Box::new(work), None)
    }

    /// Create an effect with a scheduler override, without running it.
    ///
    /// When a dependency changes the scheduler receives a [`Job`] for this
    /// effect instead of the effect being re-run inline.
    pub fn with_scheduler<F, S>(runtime: &Runtime, work: F, scheduler: S) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
        S: Fn(Job) + Send + Sync + 'static,
    {
        Self::build(runtime, Box::new(work), Some(Box::new(scheduler)))
    }

    fn build(runtime: &Runtime, work: WorkFn<T>, scheduler: Option<SchedulerFn>) -> Self {
        Self {
            inner: Arc::new(EffectInner {
                id: SubscriberId::new(),
                runtime: runtime.clone(),
                work,
                scheduler,
                active: AtomicBool::new(true),
                deps: Mutex::new(SmallVec::new()),
                run_count: AtomicUsize::new(0),
            }),
        }
    }

    /// Run the work function, tracking its reads.
    ///
    /// Returns `None` if this effect is already running further up the
    /// stack. A deactivated effect runs untracked and always returns
    /// `Some`.
    pub fn run(&self) -> Option<T> {
        self.inner.run()
    }

    /// Unlink from every dependency set and become inert. Idempotent.
    pub fn deactivate(&self) {
        self.inner.deactivate();
    }

    pub fn is_active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Get the effect's subscriber ID.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Get the number of tracked runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Get the number of dependency sets this effect belongs to.
    pub fn dependency_count(&self) -> usize {
        self.inner
            .deps
            .lock()
            .iter()
            .filter(|dep| dep.is_alive())
            .count()
    }

    /// A job that re-runs this effect, as a scheduler would receive it.
    pub fn job(&self) -> Job {
        let weak = Arc::downgrade(&self.inner);
        let weak: Weak<dyn Subscriber> = weak;
        Job::new(self.inner.id, weak)
    }
}

impl<T: 'static> Clone for ReactiveEffect<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> fmt::Debug for ReactiveEffect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.inner.id)
            .field("active", &self.is_active())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

/// Handle returned by [`Runtime::effect`]: re-runs the effect on demand and
/// gives access to it for deactivation.
///
/// Dropping the runner does not stop the effect; call
/// [`ReactiveEffect::deactivate`] through [`Runner::effect`] for that.
pub struct Runner<T: 'static> {
    effect: ReactiveEffect<T>,
}

impl<T: 'static> Runner<T> {
    pub(crate) fn new(effect: ReactiveEffect<T>) -> Self {
        Self { effect }
    }

    /// Re-run the effect. See [`ReactiveEffect::run`].
    pub fn run(&self) -> Option<T> {
        self.effect.run()
    }

    /// The effect this runner drives.
    pub fn effect(&self) -> &ReactiveEffect<T> {
        &self.effect
    }
}

impl<T: 'static> Clone for Runner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Runner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Runner").field(&self.effect).finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
