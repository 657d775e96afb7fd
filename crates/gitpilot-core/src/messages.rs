//! Stage request/response types and the public recommendation contract
//!
//! Every stage pair is a closed set: the request carries the correlation
//! session id (the reply address travels separately, embedded in the worker's
//! message enum), the response carries the session id, a success flag, and
//! either a payload or an error description. Responses never raise; failure
//! is always data.

use gitpilot_llm::Verdict;
use gitpilot_search::CommandEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Retrieval ──

/// Retrieval request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    /// Correlation id
    pub session_id: Uuid,
    /// The user's query text
    pub query: String,
    /// Maximum number of results
    pub top_k: usize,
}

/// One retrieved catalog entry. No similarity score is carried; orderings are
/// not comparable across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandMatch {
    /// The command itself
    pub command: String,
    /// What it does
    pub description: String,
    /// When to use it
    pub usage_scenario: String,
    /// A concrete invocation
    pub example: String,
    /// Coarse risk label from the catalog
    pub risk_level: String,
}

impl From<CommandEntry> for CommandMatch {
    fn from(e: CommandEntry) -> Self {
        Self {
            command: e.command,
            description: e.description,
            usage_scenario: e.usage_scenario,
            example: e.example,
            risk_level: e.risk_level,
        }
    }
}

/// Retrieval response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Correlation id
    pub session_id: Uuid,
    /// Whether the lookup succeeded
    pub success: bool,
    /// Ranked results, best first (empty on failure)
    pub results: Vec<CommandMatch>,
    /// Error description on failure
    pub error: Option<String>,
}

impl SearchResponse {
    /// Successful lookup.
    #[must_use]
    pub fn success(session_id: Uuid, results: Vec<CommandMatch>) -> Self {
        Self {
            session_id,
            success: true,
            results,
            error: None,
        }
    }

    /// Failed lookup.
    #[must_use]
    pub fn failure(session_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            session_id,
            success: false,
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}

// ── Generation ──

/// Generation request.
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Correlation id
    pub session_id: Uuid,
    /// The user's query text
    pub user_query: String,
    /// Retrieved context block; empty when retrieval found nothing or failed
    pub context: String,
}

/// Generation response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// Correlation id
    pub session_id: Uuid,
    /// Whether a command was produced
    pub success: bool,
    /// The generated command
    pub command: Option<String>,
    /// Beginner-level explanation
    pub explanation: Option<String>,
    /// Verdict parsed from the model's SAFETY field; the classifier's
    /// verdict takes precedence downstream
    pub verdict: Verdict,
    /// Error description on failure
    pub error: Option<String>,
}

impl GenerateResponse {
    /// Successful generation.
    #[must_use]
    pub fn success(
        session_id: Uuid,
        command: impl Into<String>,
        explanation: impl Into<String>,
        verdict: Verdict,
    ) -> Self {
        Self {
            session_id,
            success: true,
            command: Some(command.into()),
            explanation: Some(explanation.into()),
            verdict,
            error: None,
        }
    }

    /// Failed generation.
    #[must_use]
    pub fn failure(session_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            session_id,
            success: false,
            command: None,
            explanation: None,
            verdict: Verdict::Unknown,
            error: Some(error.into()),
        }
    }
}

// ── Classification ──

/// Classification request.
#[derive(Debug, Clone)]
pub struct SafetyCheckRequest {
    /// Correlation id
    pub session_id: Uuid,
    /// The command to vet
    pub command: String,
}

/// Classification response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyCheckResponse {
    /// Correlation id
    pub session_id: Uuid,
    /// The vetted command
    pub command: String,
    /// Final verdict (never `Unknown` from the classifier)
    pub verdict: Verdict,
    /// One warning per matching pattern, in table order
    pub warnings: Vec<String>,
    /// Suggested safer alternatives, in table order
    pub alternatives: Vec<String>,
    /// False only for `Dangerous`
    pub approved: bool,
}

// ── Orchestrator contract ──

/// The final reply for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Session id
    pub session_id: Uuid,
    /// The original query
    pub query: String,
    /// The recommended command (absent on failure)
    pub command: Option<String>,
    /// Explanation (absent on failure)
    pub explanation: Option<String>,
    /// Merged verdict: the classifier's when it ran, the generation
    /// fallback otherwise
    pub verdict: Verdict,
    /// Warnings from the classifier
    pub warnings: Vec<String>,
    /// Safer alternatives from the classifier
    pub alternatives: Vec<String>,
    /// Wall time from request arrival to this reply
    pub elapsed_ms: u64,
    /// Whether a command was produced
    pub success: bool,
    /// Human-readable error on failure
    pub error: Option<String>,
}

impl Recommendation {
    /// Failed session reply.
    #[must_use]
    pub fn failure(
        session_id: Uuid,
        query: impl Into<String>,
        error: impl Into<String>,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            session_id,
            query: query.into(),
            command: None,
            explanation: None,
            verdict: Verdict::Unknown,
            warnings: Vec::new(),
            alternatives: Vec::new(),
            elapsed_ms,
            success: false,
            error: Some(error.into()),
        }
    }
}
