//! Pipeline assembly
//!
//! [`Pipeline::start`] spawns the five supervised workers and wires their
//! mailboxes together. Recovery policies are fixed per stage: the audit
//! worker resumes (its trail must survive faults), the two stages with
//! external collaborators restart with backoff, and the classifier and
//! orchestrator restart immediately.

use std::sync::Arc;
use std::time::Duration;

use gitpilot_llm::CompletionClient;
use gitpilot_search::CommandStore;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditEvent, AuditWorker};
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::generation::GenerationStage;
use crate::mailbox::Handle;
use crate::messages::Recommendation;
use crate::retrieval::RetrievalStage;
use crate::safety::SafetyStage;
use crate::session::{SessionMsg, SessionOrchestrator};
use crate::supervisor::{spawn_supervised, RecoveryPolicy};

/// A running recommendation pipeline.
pub struct Pipeline {
    session: Handle<SessionMsg>,
    audit: Handle<AuditEvent>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Spawn all workers and return a handle to the running pipeline.
    #[must_use]
    pub fn start(
        config: PipelineConfig,
        client: Arc<dyn CompletionClient>,
        store: Arc<dyn CommandStore>,
    ) -> Self {
        let audit = spawn_supervised("audit", RecoveryPolicy::Resume, |_| AuditWorker::new());

        let retrieval = spawn_supervised(
            "retrieval",
            RecoveryPolicy::RestartWithBackoff(config.retrieval_backoff),
            move |_| RetrievalStage::new(Arc::clone(&store)),
        );

        let generation = spawn_supervised(
            "generation",
            RecoveryPolicy::RestartWithBackoff(config.generation_backoff),
            move |_| GenerationStage::new(Arc::clone(&client)),
        );

        let safety = spawn_supervised("safety", RecoveryPolicy::Restart, |_| SafetyStage::new());

        let session = {
            let audit = audit.clone();
            let config = config.clone();
            spawn_supervised("session", RecoveryPolicy::Restart, move |self_handle| {
                SessionOrchestrator::new(
                    self_handle,
                    retrieval.clone(),
                    generation.clone(),
                    safety.clone(),
                    audit.clone(),
                    config.clone(),
                )
            })
        };

        info!(top_k = config.top_k, "pipeline started");
        Self {
            session,
            audit,
            config,
        }
    }

    /// Run one session with a fresh id.
    pub async fn recommend(&self, query: impl Into<String>) -> Result<Recommendation> {
        self.recommend_with_id(Uuid::new_v4(), query).await
    }

    /// Run one session under a caller-chosen id.
    pub async fn recommend_with_id(
        &self,
        session_id: Uuid,
        query: impl Into<String>,
    ) -> Result<Recommendation> {
        let query = query.into();
        self.session
            .ask(self.overall_timeout(), |tx| SessionMsg::Recommend {
                session_id,
                query,
                reply: tx,
            })
            .await
    }

    /// Mailbox of the orchestrator, for callers that manage their own asks.
    #[must_use]
    pub fn session_handle(&self) -> Handle<SessionMsg> {
        self.session.clone()
    }

    /// Mailbox of the audit worker.
    #[must_use]
    pub fn audit_handle(&self) -> Handle<AuditEvent> {
        self.audit.clone()
    }

    /// Worst-case budget for one session: the external call plus both
    /// internal stage asks.
    fn overall_timeout(&self) -> Duration {
        self.config.external_timeout() + 2 * self.config.stage_timeout()
    }
}
