use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::playback::controller::ForkPolicy;
use crate::timeline::log::DEFAULT_NOTIFY_CAPACITY;

const ENV_FORK_POLICY: &str = "PLAYHEAD_FORK_POLICY";

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// What the cursor does when an edit lands at the tip while paused
    pub fork_policy: ForkPolicy,
    /// Capacity of the log's append-notification channel
    pub notify_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fork_policy: ForkPolicy::default(),
            notify_capacity: DEFAULT_NOTIFY_CAPACITY,
        }
    }
}

/// TOML shape: every field optional, missing values fall back to defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlEngineConfig {
    pub fork_policy: Option<ForkPolicy>,
    pub notify_capacity: Option<usize>,
}

impl EngineConfig {
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let parsed: TomlEngineConfig = toml::from_str(raw)?;
        Ok(Self::from_parsed(parsed))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    fn from_parsed(parsed: TomlEngineConfig) -> Self {
        let defaults = Self::default();
        Self {
            fork_policy: parsed.fork_policy.unwrap_or(defaults.fork_policy),
            notify_capacity: parsed
                .notify_capacity
                .unwrap_or(defaults.notify_capacity)
                .max(1),
        }
    }

    /// Apply the `PLAYHEAD_FORK_POLICY` env override (`auto-resume` or
    /// `flag-fork`); unrecognized values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(raw) = std::env::var(ENV_FORK_POLICY) {
            match raw.trim().to_ascii_lowercase().as_str() {
                "auto-resume" => self.fork_policy = ForkPolicy::AutoResume,
                "flag-fork" => self.fork_policy = ForkPolicy::FlagFork,
                other => {
                    tracing::warn!(value = other, "ignoring unknown {ENV_FORK_POLICY}");
                }
            }
        }
        self
    }
}
