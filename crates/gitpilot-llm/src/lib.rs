//! GitPilot LLM - Language-Model Collaborator Boundary
//!
//! This crate defines the seam between GitPilot and whatever language model
//! backs it:
//! - `CompletionClient`: the trait every model backend implements
//! - `CompletionRequest` / `CompletionResponse`: prompt in, free text out
//! - `protocol`: parser for the structured `COMMAND:/SAFETY:/EXPLANATION:`
//!   reply contract
//! - `ScriptedClient`: a queued mock backend for tests
//!
//! The generation stage in `gitpilot-core` is the only consumer; it never
//! sees a transport error type, only this crate's `Error`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod mock;
pub mod protocol;

pub use client::{CompletionClient, CompletionRequest, CompletionResponse};
pub use error::{Error, Result};
pub use mock::ScriptedClient;
pub use protocol::{ParseError, ReplyParser, StructuredReply, Verdict};
