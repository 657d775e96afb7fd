//! Message-passing orchestration for git command recommendations
//!
//! Turns a natural-language request into a vetted git command. Five
//! supervised workers cooperate over mailboxes: retrieval finds similar
//! catalog commands, generation asks a completion backend for a structured
//! recommendation, the risk classifier vets the command against fixed
//! pattern tables, the audit worker keeps the trail, and the session
//! orchestrator drives each request through the stages and assembles the
//! final [`Recommendation`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use gitpilot_core::{Pipeline, PipelineConfig};
//! use gitpilot_llm::ScriptedClient;
//! use gitpilot_search::MemoryStore;
//!
//! # async fn run() -> gitpilot_core::Result<()> {
//! let pipeline = Pipeline::start(
//!     PipelineConfig::default(),
//!     Arc::new(ScriptedClient::new()),
//!     Arc::new(MemoryStore::with_builtin_catalog()),
//! );
//! let rec = pipeline.recommend("undo my last commit").await?;
//! println!("{:?} {:?}", rec.command, rec.verdict);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod config;
pub mod error;
pub mod generation;
pub mod mailbox;
pub mod messages;
pub mod pipeline;
pub mod retrieval;
pub mod safety;
pub mod session;
pub mod supervisor;

pub use audit::{AuditEvent, AuditLog};
pub use config::PipelineConfig;
pub use error::{Error, Result};
pub use mailbox::Handle;
pub use messages::{Recommendation, SafetyCheckResponse, SearchResponse};
pub use pipeline::Pipeline;
pub use safety::{Classification, RiskClassifier};
pub use supervisor::{spawn_supervised, BackoffPolicy, RecoveryPolicy, Worker};

pub use gitpilot_llm::Verdict;
