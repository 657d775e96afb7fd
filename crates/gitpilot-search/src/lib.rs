//! GitPilot Search - Similarity-Search Collaborator Boundary
//!
//! This crate defines the seam between GitPilot and whatever similarity store
//! backs retrieval:
//! - `CommandStore`: the trait every retrieval backend implements
//! - `CommandEntry`: one catalog entry (command, description, usage, example,
//!   risk level)
//! - `MemoryStore`: a token-overlap in-memory store preloaded with a built-in
//!   git command catalog, used by tests and small deployments
//!
//! Backends rank results internally however they like; the contract
//! deliberately exposes no similarity score, so callers must not compare
//! result orderings across calls.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod catalog;
pub mod error;
pub mod memory;
pub mod store;

pub use error::{Error, Result};
pub use memory::{FailingStore, MemoryStore};
pub use store::{CommandEntry, CommandStore};
