//! Session orchestration
//!
//! One worker drives every in-flight session through retrieval, generation,
//! and classification. Stage asks run in spawned forward tasks that redirect
//! their outcome back into the orchestrator's own mailbox, so the worker
//! never blocks on a stage and sessions interleave freely. Correlation is by
//! session id; a stage reply for an id with no pending session is logged and
//! dropped.

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::AuditEvent;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::generation::GenerationMsg;
use crate::mailbox::Handle;
use crate::messages::{
    GenerateRequest, GenerateResponse, Recommendation, SafetyCheckRequest, SafetyCheckResponse,
    SearchRequest, SearchResponse,
};
use crate::retrieval::RetrievalMsg;
use crate::safety::SafetyMsg;
use crate::supervisor::Worker;
use gitpilot_llm::Verdict;

/// Messages accepted by the orchestrator.
pub enum SessionMsg {
    /// Start a new session.
    Recommend {
        /// Caller-chosen session id
        session_id: Uuid,
        /// The user's request
        query: String,
        /// Reply address for the final recommendation
        reply: oneshot::Sender<Recommendation>,
    },
    /// Redirected retrieval outcome
    RetrievalDone(SearchResponse),
    /// Redirected generation outcome
    GenerationDone(GenerateResponse),
    /// Redirected classification outcome
    SafetyDone(SafetyCheckResponse),
}

struct PendingSession {
    query: String,
    reply: oneshot::Sender<Recommendation>,
    started_at: Instant,
    generation: Option<GenerateResponse>,
}

/// The session orchestrator worker.
pub struct SessionOrchestrator {
    self_handle: Handle<SessionMsg>,
    retrieval: Handle<RetrievalMsg>,
    generation: Handle<GenerationMsg>,
    safety: Handle<SafetyMsg>,
    audit: Handle<AuditEvent>,
    config: PipelineConfig,
    pending: HashMap<Uuid, PendingSession>,
}

impl SessionOrchestrator {
    /// Orchestrator wired to the four stage mailboxes.
    #[must_use]
    pub fn new(
        self_handle: Handle<SessionMsg>,
        retrieval: Handle<RetrievalMsg>,
        generation: Handle<GenerationMsg>,
        safety: Handle<SafetyMsg>,
        audit: Handle<AuditEvent>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            self_handle,
            retrieval,
            generation,
            safety,
            audit,
            config,
            pending: HashMap::new(),
        }
    }

    fn start_session(&mut self, session_id: Uuid, query: String, reply: oneshot::Sender<Recommendation>) {
        if self.pending.contains_key(&session_id) {
            warn!(session_id = %session_id, "duplicate session id rejected");
            let _ = reply.send(Recommendation::failure(
                session_id,
                query,
                "a session with this id is already in flight",
                0,
            ));
            return;
        }

        self.audit.tell(AuditEvent::info(
            "session",
            format!("session {session_id} started: {query}"),
        ));
        self.pending.insert(
            session_id,
            PendingSession {
                query: query.clone(),
                reply,
                started_at: Instant::now(),
                generation: None,
            },
        );

        let retrieval = self.retrieval.clone();
        let back = self.self_handle.clone();
        let timeout = self.config.stage_timeout();
        let top_k = self.config.top_k;
        tokio::spawn(async move {
            let outcome = retrieval
                .ask(timeout, |tx| RetrievalMsg::Search {
                    request: SearchRequest {
                        session_id,
                        query,
                        top_k,
                    },
                    reply: tx,
                })
                .await
                .unwrap_or_else(|e| SearchResponse::failure(session_id, e.to_string()));
            back.tell(SessionMsg::RetrievalDone(outcome));
        });
    }

    fn on_retrieval(&mut self, response: SearchResponse) {
        let session_id = response.session_id;
        let Some(session) = self.pending.get(&session_id) else {
            warn!(session_id = %session_id, "retrieval reply for unknown session dropped");
            return;
        };

        let context = if response.success {
            format_context(&response)
        } else {
            self.audit.tell(AuditEvent::warning(
                "retrieval",
                format!(
                    "session {session_id}: retrieval unavailable, continuing without context ({})",
                    response.error.as_deref().unwrap_or("unknown error")
                ),
            ));
            String::new()
        };

        let generation = self.generation.clone();
        let back = self.self_handle.clone();
        let timeout = self.config.external_timeout();
        let user_query = session.query.clone();
        tokio::spawn(async move {
            let outcome = generation
                .ask(timeout, |tx| GenerationMsg::Generate {
                    request: GenerateRequest {
                        session_id,
                        user_query,
                        context,
                    },
                    reply: tx,
                })
                .await
                .unwrap_or_else(|e| GenerateResponse::failure(session_id, e.to_string()));
            back.tell(SessionMsg::GenerationDone(outcome));
        });
    }

    fn on_generation(&mut self, response: GenerateResponse) {
        let session_id = response.session_id;
        if !self.pending.contains_key(&session_id) {
            warn!(session_id = %session_id, "generation reply for unknown session dropped");
            return;
        }

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| "generation produced no command".to_owned());
            self.audit.tell(AuditEvent::error(
                "generation",
                format!("session {session_id}: generation failed"),
                error.clone(),
            ));
            self.complete_failure(session_id, error);
            return;
        }

        let command = response.command.clone().unwrap_or_default();
        if let Some(session) = self.pending.get_mut(&session_id) {
            session.generation = Some(response);
        }

        let safety = self.safety.clone();
        let back = self.self_handle.clone();
        let timeout = self.config.stage_timeout();
        tokio::spawn(async move {
            match safety
                .ask(timeout, |tx| SafetyMsg::Check {
                    request: SafetyCheckRequest {
                        session_id,
                        command: command.clone(),
                    },
                    reply: tx,
                })
                .await
            {
                Ok(outcome) => back.tell(SessionMsg::SafetyDone(outcome)),
                // vetting was unavailable; fall back to the generation verdict
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "safety check unavailable");
                    back.tell(SessionMsg::SafetyDone(SafetyCheckResponse {
                        session_id,
                        command,
                        verdict: Verdict::Unknown,
                        warnings: vec!["Automatic safety vetting was unavailable.".to_owned()],
                        alternatives: Vec::new(),
                        approved: true,
                    }));
                }
            }
        });
    }

    fn on_safety(&mut self, response: SafetyCheckResponse) {
        let session_id = response.session_id;
        let Some(session) = self.pending.remove(&session_id) else {
            warn!(session_id = %session_id, "safety reply for unknown session dropped");
            return;
        };

        let elapsed_ms = session.started_at.elapsed().as_millis() as u64;
        let generation = session.generation.unwrap_or_else(|| {
            GenerateResponse::failure(session_id, "internal: safety reply before generation")
        });

        let verdict = if response.verdict == Verdict::Unknown {
            generation.verdict
        } else {
            response.verdict
        };

        let recommendation = Recommendation {
            session_id,
            query: session.query.clone(),
            command: generation.command,
            explanation: generation.explanation,
            verdict,
            warnings: response.warnings,
            alternatives: response.alternatives,
            elapsed_ms,
            success: generation.success,
            error: generation.error,
        };

        debug!(session_id = %session_id, verdict = %verdict, elapsed_ms, "session complete");
        self.audit.tell(AuditEvent::query_summary(
            session_id,
            session.query,
            recommendation.command.clone(),
            verdict,
            elapsed_ms,
        ));
        // caller may have given up; a dead reply channel ends the session quietly
        let _ = session.reply.send(recommendation);
    }

    fn complete_failure(&mut self, session_id: Uuid, error: String) {
        let Some(session) = self.pending.remove(&session_id) else {
            return;
        };
        let elapsed_ms = session.started_at.elapsed().as_millis() as u64;
        self.audit.tell(AuditEvent::query_summary(
            session_id,
            session.query.clone(),
            None,
            Verdict::Unknown,
            elapsed_ms,
        ));
        let _ = session
            .reply
            .send(Recommendation::failure(session_id, session.query, error, elapsed_ms));
    }
}

fn format_context(response: &SearchResponse) -> String {
    let mut out = String::new();
    for (i, m) in response.results.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} - {} (Risk: {})\n",
            i + 1,
            m.command,
            m.description,
            m.risk_level
        ));
    }
    out
}

#[async_trait::async_trait]
impl Worker for SessionOrchestrator {
    type Msg = SessionMsg;

    async fn handle(&mut self, msg: SessionMsg) -> Result<()> {
        match msg {
            SessionMsg::Recommend {
                session_id,
                query,
                reply,
            } => self.start_session(session_id, query, reply),
            SessionMsg::RetrievalDone(response) => self.on_retrieval(response),
            SessionMsg::GenerationDone(response) => self.on_generation(response),
            SessionMsg::SafetyDone(response) => self.on_safety(response),
        }
        Ok(())
    }
}
