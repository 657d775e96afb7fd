//! Audit trail
//!
//! The audit worker is the only writer of the trail; every other component
//! tells events into its mailbox and never waits. Entries are kept in memory
//! and mirrored to the tracing subscriber as they arrive.

use chrono::{DateTime, Utc};
use gitpilot_llm::Verdict;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::supervisor::Worker;

/// One audit trail entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AuditEvent {
    /// Informational note
    Info {
        /// Arrival time
        at: DateTime<Utc>,
        /// Component that emitted the event
        source: String,
        /// Free-form text
        message: String,
    },
    /// Something degraded but the session continued
    Warning {
        /// Arrival time
        at: DateTime<Utc>,
        /// Component that emitted the event
        source: String,
        /// Free-form text
        message: String,
    },
    /// A stage failed
    Error {
        /// Arrival time
        at: DateTime<Utc>,
        /// Component that emitted the event
        source: String,
        /// Free-form text
        message: String,
        /// Underlying cause
        detail: String,
    },
    /// Per-session record written exactly once when the session completes
    QuerySummary {
        /// Completion time
        at: DateTime<Utc>,
        /// Session id
        session_id: Uuid,
        /// The original query
        query: String,
        /// The recommended command, if one was produced
        command: Option<String>,
        /// Final verdict
        verdict: Verdict,
        /// End-to-end wall time
        elapsed_ms: u64,
    },
}

impl AuditEvent {
    /// Informational entry stamped now.
    #[must_use]
    pub fn info(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Info {
            at: Utc::now(),
            source: source.into(),
            message: message.into(),
        }
    }

    /// Warning entry stamped now.
    #[must_use]
    pub fn warning(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Warning {
            at: Utc::now(),
            source: source.into(),
            message: message.into(),
        }
    }

    /// Error entry stamped now.
    #[must_use]
    pub fn error(
        source: impl Into<String>,
        message: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Error {
            at: Utc::now(),
            source: source.into(),
            message: message.into(),
            detail: detail.into(),
        }
    }

    /// Session summary stamped now.
    #[must_use]
    pub fn query_summary(
        session_id: Uuid,
        query: impl Into<String>,
        command: Option<String>,
        verdict: Verdict,
        elapsed_ms: u64,
    ) -> Self {
        Self::QuerySummary {
            at: Utc::now(),
            session_id,
            query: query.into(),
            command,
            verdict,
            elapsed_ms,
        }
    }
}

/// In-memory audit trail, grouped by entry kind.
#[derive(Debug, Default)]
pub struct AuditLog {
    infos: Vec<AuditEvent>,
    warnings: Vec<AuditEvent>,
    errors: Vec<AuditEvent>,
    summaries: Vec<AuditEvent>,
}

impl AuditLog {
    /// Append one entry.
    pub fn record(&mut self, event: AuditEvent) {
        match &event {
            AuditEvent::Info { .. } => self.infos.push(event),
            AuditEvent::Warning { .. } => self.warnings.push(event),
            AuditEvent::Error { .. } => self.errors.push(event),
            AuditEvent::QuerySummary { .. } => self.summaries.push(event),
        }
    }

    /// Entry counts as (infos, warnings, errors, summaries).
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.infos.len(),
            self.warnings.len(),
            self.errors.len(),
            self.summaries.len(),
        )
    }

    /// All session summaries, oldest first.
    #[must_use]
    pub fn summaries(&self) -> &[AuditEvent] {
        &self.summaries
    }
}

/// The audit worker. Never faults: a malformed entry is still an entry.
#[derive(Debug, Default)]
pub struct AuditWorker {
    log: AuditLog,
}

impl AuditWorker {
    /// Fresh worker with an empty trail.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Worker for AuditWorker {
    type Msg = AuditEvent;

    async fn handle(&mut self, event: AuditEvent) -> Result<()> {
        match &event {
            AuditEvent::Info {
                source, message, ..
            } => info!(target: "audit", source = %source, "{message}"),
            AuditEvent::Warning {
                source, message, ..
            } => warn!(target: "audit", source = %source, "{message}"),
            AuditEvent::Error {
                source,
                message,
                detail,
                ..
            } => error!(target: "audit", source = %source, detail = %detail, "{message}"),
            AuditEvent::QuerySummary {
                session_id,
                query,
                command,
                verdict,
                elapsed_ms,
                ..
            } => info!(
                target: "audit",
                session_id = %session_id,
                query = %query,
                command = command.as_deref().unwrap_or("<none>"),
                verdict = %verdict,
                elapsed_ms,
                "session complete"
            ),
        }
        self.log.record(event);
        Ok(())
    }
}
