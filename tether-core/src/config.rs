//! Runtime Configuration
//!
//! A `RuntimeConfig` is fixed when a [`Runtime`](crate::Runtime) is built.
//! It settles the two behaviors that reactive engines tend to disagree on:
//!
//! - whether a computation drops its old dependency edges before re-running,
//! - whether a notification stops at the first subscriber that carries a
//!   scheduler override.
//!
//! Both defaults pick the stricter behavior. The permissive variants exist so
//! that hosts relying on them can opt back in.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TetherError};

/// How a write notifies the subscribers of one dependency set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Every subscriber is handled independently: scheduled if it carries a
    /// scheduler override, run inline otherwise.
    #[default]
    All,

    /// The first subscriber with a scheduler override is scheduled and the
    /// rest of the batch is dropped.
    StopAtFirstScheduled,
}

/// Configuration for a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Unlink a computation from every dependency set before each tracked
    /// run, so that locations it stopped reading no longer notify it.
    pub cleanup_before_run: bool,

    /// Notification policy applied to every trigger.
    pub notify_policy: NotifyPolicy,

    /// Minimum number of registry targets (and cached wrappers) before the
    /// runtime starts pruning entries whose object has been dropped.
    pub registry_prune_threshold: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            cleanup_before_run: true,
            notify_policy: NotifyPolicy::All,
            registry_prune_threshold: 64,
        }
    }
}

impl RuntimeConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether stale edges are dropped before each run.
    pub fn with_cleanup_before_run(mut self, enabled: bool) -> Self {
        self.cleanup_before_run = enabled;
        self
    }

    /// Set the notification policy.
    pub fn with_notify_policy(mut self, policy: NotifyPolicy) -> Self {
        self.notify_policy = policy;
        self
    }

    /// Set the lazy pruning threshold.
    pub fn with_registry_prune_threshold(mut self, threshold: usize) -> Self {
        self.registry_prune_threshold = threshold;
        self
    }

    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.registry_prune_threshold == 0 {
            return Err(TetherError::Config(
                "registry_prune_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
