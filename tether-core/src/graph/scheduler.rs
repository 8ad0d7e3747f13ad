//! Update Queue
//!
//! The queue is a scheduler override that defers re-runs instead of running
//! them inline. A host (for example a render loop) installs
//! [`UpdateQueue::scheduler`] on its computations and calls
//! [`UpdateQueue::flush`] when it is ready to process updates.
//!
//! # Algorithm
//!
//! 1. A triggered computation is enqueued as a [`Job`], at most once: a
//!    computation already waiting keeps its original position.
//! 2. `flush` drains the queue in insertion order and runs each job.
//! 3. Jobs enqueued while flushing (a re-run that writes state read by
//!    another queued computation) are picked up by the same flush.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::reactive::{Job, SubscriberId};

/// FIFO of deduplicated jobs.
#[derive(Clone, Default)]
pub struct UpdateQueue {
    jobs: Arc<Mutex<IndexMap<SubscriberId, Job>>>,
}

impl UpdateQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue a job. Returns `false` if its computation is already queued.
    pub fn push(&self, job: Job) -> bool {
        let mut jobs = self.jobs.lock();
        if jobs.contains_key(&job.id()) {
            return false;
        }
        jobs.insert(job.id(), job);
        true
    }

    /// A scheduler override that enqueues into this queue.
    pub fn scheduler(&self) -> impl Fn(Job) + Send + Sync + 'static {
        let queue = self.clone();
        move |job| {
            queue.push(job);
        }
    }

    /// Run every queued job, including jobs queued along the way.
    ///
    /// Returns the number of jobs that actually ran; jobs whose computation
    /// was dropped or deactivated are discarded.
    pub fn flush(&self) -> usize {
        let mut ran = 0;
        loop {
            // Release the lock before running anything: jobs may enqueue.
            let batch: Vec<Job> = self.jobs.lock().drain(..).map(|(_, job)| job).collect();
            if batch.is_empty() {
                break;
            }
            for job in batch {
                if job.run() {
                    ran += 1;
                }
            }
        }

        if ran > 0 {
            tracing::debug!(ran, "flushed update queue");
        }
        ran
    }

    /// Number of queued jobs.
    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.lock().is_empty()
    }

    /// Discard every queued job without running it.
    pub fn clear(&self) {
        self.jobs.lock().clear();
    }
}

impl fmt::Debug for UpdateQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue").field("len", &self.len()).finish()
    }
}
