//! In-memory command store
//!
//! Token-overlap ranking over a fixed catalog. Good enough for tests and
//! single-node use; production deployments put a real vector store behind
//! the same `CommandStore` trait.

use crate::catalog;
use crate::error::Result;
use crate::store::{CommandEntry, CommandStore};
use std::collections::HashSet;
use tracing::debug;

/// In-memory token-overlap store.
pub struct MemoryStore {
    entries: Vec<CommandEntry>,
}

impl MemoryStore {
    /// Create a store over the given entries. Ranking ties preserve entry order.
    #[must_use]
    pub fn new(entries: Vec<CommandEntry>) -> Self {
        Self { entries }
    }

    /// Create a store preloaded with the built-in git command catalog.
    #[must_use]
    pub fn with_builtin_catalog() -> Self {
        Self::new(catalog::builtin())
    }

    /// Number of catalog entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn score(query_tokens: &HashSet<String>, entry: &CommandEntry) -> usize {
        let text = format!(
            "{} {} {}",
            entry.command, entry.description, entry.usage_scenario
        );
        tokenize(&text)
            .filter(|t| query_tokens.contains(t.as_str()))
            .collect::<HashSet<_>>()
            .len()
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
}

#[async_trait::async_trait]
impl CommandStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn find_similar(&self, query: &str, top_k: usize) -> Result<Vec<CommandEntry>> {
        let query_tokens: HashSet<String> = tokenize(query).collect();

        let mut scored: Vec<(usize, &CommandEntry)> = self
            .entries
            .iter()
            .map(|e| (Self::score(&query_tokens, e), e))
            .filter(|(s, _)| *s > 0)
            .collect();

        // Stable sort keeps catalog order among equal scores
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        scored.truncate(top_k);

        debug!(query, matched = scored.len(), "catalog lookup");
        Ok(scored.into_iter().map(|(_, e)| e.clone()).collect())
    }
}

/// A store that always fails; used to exercise degradation paths in tests.
pub struct FailingStore;

#[async_trait::async_trait]
impl CommandStore for FailingStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn find_similar(&self, _query: &str, _top_k: usize) -> Result<Vec<CommandEntry>> {
        Err(crate::error::Error::Unavailable(
            "store is down".to_string(),
        ))
    }
}
