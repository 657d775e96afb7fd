//! Command store trait and entry type

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// One entry in the git command catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEntry {
    /// The command itself, with `<placeholders>` where arguments go
    pub command: String,
    /// What the command does
    pub description: String,
    /// When you would reach for it
    pub usage_scenario: String,
    /// A concrete invocation
    pub example: String,
    /// Coarse risk label (SAFE / CAUTION / DANGEROUS)
    pub risk_level: String,
    /// Catalog grouping (basic, branching, undo, ...)
    pub category: String,
}

/// Trait for retrieval backends.
#[async_trait::async_trait]
pub trait CommandStore: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Return up to `top_k` entries most similar to `query`, best first.
    async fn find_similar(&self, query: &str, top_k: usize) -> Result<Vec<CommandEntry>>;
}
