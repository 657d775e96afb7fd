//! Error types for gitpilot-core
//!
//! These cover the messaging layer only. Stage-level failures (a model call
//! that errors, a store that is down) are not errors at this level; they are
//! carried as data inside the stage response types.

use thiserror::Error;

/// Core messaging error type
#[derive(Debug, Error)]
pub enum Error {
    /// The target worker's mailbox has been closed
    #[error("{worker} mailbox is closed")]
    MailboxClosed {
        /// Worker name
        worker: &'static str,
    },

    /// An ask did not receive a reply before its deadline
    #[error("{worker} did not reply within {timeout_ms}ms")]
    AskTimeout {
        /// Worker name
        worker: &'static str,
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// The callee dropped the reply slot without answering
    #[error("{worker} dropped the reply")]
    ReplyDropped {
        /// Worker name
        worker: &'static str,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
