//! Dependency Registry
//!
//! Maps a target object to its per-key dependency sets. Sets are created
//! lazily, on the first tracked read of an `(object, key)` pair; a location
//! nobody ever read has no entry, and writing to it is a cheap miss.
//!
//! Entries are keyed by [`ObjectId`] and hold only a [`WeakObject`]. When an
//! object is dropped elsewhere its entry becomes dead and is pruned the next
//! time the registry grows past its high-water mark, or on an explicit
//! [`TargetMap::prune`].

use std::collections::HashMap;

use parking_lot::Mutex;

use super::Dep;
use crate::value::{Object, ObjectId, WeakObject};

struct TargetEntry {
    target: WeakObject,
    keys: HashMap<String, Dep>,
}

struct Targets {
    entries: HashMap<ObjectId, TargetEntry>,
    /// Size at which the next lazy prune runs.
    next_prune: usize,
}

/// Registry of dependency sets, keyed by object and then by property.
pub(crate) struct TargetMap {
    targets: Mutex<Targets>,
    prune_threshold: usize,
}

impl TargetMap {
    pub(crate) fn new(prune_threshold: usize) -> Self {
        let prune_threshold = prune_threshold.max(1);
        Self {
            targets: Mutex::new(Targets {
                entries: HashMap::new(),
                next_prune: prune_threshold,
            }),
            prune_threshold,
        }
    }

    /// Find or lazily create the dependency set for `(target, key)`.
    pub(crate) fn dep_for(&self, target: &Object, key: &str) -> Dep {
        let mut targets = self.targets.lock();

        if !targets.entries.contains_key(&target.id()) && targets.entries.len() >= targets.next_prune {
            let pruned = prune_dead(&mut targets.entries);
            targets.next_prune = (targets.entries.len() * 2).max(self.prune_threshold);
            tracing::debug!(pruned, live = targets.entries.len(), "pruned dependency registry");
        }

        let entry = targets
            .entries
            .entry(target.id())
            .or_insert_with(|| TargetEntry {
                target: target.downgrade(),
                keys: HashMap::new(),
            });

        entry.keys.entry(key.to_string()).or_default().clone()
    }

    /// The dependency set for `(target, key)`, if anything ever read it.
    pub(crate) fn get(&self, target: ObjectId, key: &str) -> Option<Dep> {
        self.targets
            .lock()
            .entries
            .get(&target)
            .and_then(|entry| entry.keys.get(key))
            .cloned()
    }

    /// Drop every entry whose object is gone. Returns how many were removed.
    pub(crate) fn prune(&self) -> usize {
        let mut targets = self.targets.lock();
        let pruned = prune_dead(&mut targets.entries);
        targets.next_prune = (targets.entries.len() * 2).max(self.prune_threshold);
        pruned
    }

    /// Number of objects with at least one tracked key.
    pub(crate) fn target_count(&self) -> usize {
        self.targets.lock().entries.len()
    }

    /// Number of tracked keys on one object.
    pub(crate) fn key_count(&self, target: ObjectId) -> usize {
        self.targets
            .lock()
            .entries
            .get(&target)
            .map_or(0, |entry| entry.keys.len())
    }
}

fn prune_dead(entries: &mut HashMap<ObjectId, TargetEntry>) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| entry.target.is_alive());
    before - entries.len()
}
