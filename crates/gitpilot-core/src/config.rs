//! Pipeline configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::supervisor::BackoffPolicy;

/// Tunables for one pipeline instance.
///
/// Every field has a default; a config deserialized from an empty document
/// is fully usable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// How many catalog entries retrieval returns
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Budget for one external call (the model provider)
    #[serde(default = "default_external_timeout_ms")]
    pub external_timeout_ms: u64,
    /// Budget for one internal stage ask
    #[serde(default = "default_stage_timeout_ms")]
    pub stage_timeout_ms: u64,
    /// Restart backoff for the generation stage
    #[serde(default = "default_generation_backoff")]
    pub generation_backoff: BackoffPolicy,
    /// Restart backoff for the retrieval stage
    #[serde(default = "default_retrieval_backoff")]
    pub retrieval_backoff: BackoffPolicy,
}

fn default_top_k() -> usize {
    3
}

fn default_external_timeout_ms() -> u64 {
    30_000
}

fn default_stage_timeout_ms() -> u64 {
    10_000
}

fn default_generation_backoff() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(30), 0.2)
}

fn default_retrieval_backoff() -> BackoffPolicy {
    BackoffPolicy::new(Duration::from_millis(500), Duration::from_secs(10), 0.1)
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            external_timeout_ms: default_external_timeout_ms(),
            stage_timeout_ms: default_stage_timeout_ms(),
            generation_backoff: default_generation_backoff(),
            retrieval_backoff: default_retrieval_backoff(),
        }
    }
}

impl PipelineConfig {
    /// Stage ask budget as a [`Duration`].
    #[must_use]
    pub fn stage_timeout(&self) -> Duration {
        Duration::from_millis(self.stage_timeout_ms)
    }

    /// External call budget as a [`Duration`].
    #[must_use]
    pub fn external_timeout(&self) -> Duration {
        Duration::from_millis(self.external_timeout_ms)
    }
}
