//! Generation stage
//!
//! Builds the prompt from the query and retrieved context, calls the
//! completion client, and parses the structured reply. Two sentinel command
//! values short-circuit: `OUT_OF_SCOPE` (any case) for non-git requests and
//! `NONE` (exact case) when the model declines to produce a command. The
//! sentinels are checked on the parsed `COMMAND:` field; a bare sentinel
//! word without the field structure is accepted too.

use std::sync::Arc;

use gitpilot_llm::{CompletionClient, CompletionRequest, ReplyParser};
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::Result;
use crate::messages::{GenerateRequest, GenerateResponse};
use crate::supervisor::Worker;

const SYSTEM_PROMPT: &str = "You are a Git expert assistant. Given a user's request, recommend \
exactly one git command.\n\
Reply in this format, one field per line:\n\
COMMAND: the exact git command\n\
SAFETY: SAFE, CAUTION, or DANGEROUS\n\
EXPLANATION: a beginner-friendly explanation of what the command does\n\
If the request is not about Git or version control, reply with \
COMMAND: OUT_OF_SCOPE, SAFETY: SAFE, and an EXPLANATION saying you only \
help with Git.\n\
If the request is about Git but no single command answers it, reply with \
COMMAND: NONE and an EXPLANATION of why.";

/// Reply sent when the model flags a request as out of scope.
pub const OUT_OF_SCOPE_REPLY: &str = "I'm a Git assistant and can only help with Git-related \
questions. Please ask me about Git commands, branches, commits, or version control.";

/// Messages accepted by the generation stage.
pub enum GenerationMsg {
    /// Generate a command recommendation and reply with the result.
    Generate {
        /// The request
        request: GenerateRequest,
        /// Reply address
        reply: oneshot::Sender<GenerateResponse>,
    },
}

/// Generation stage worker.
pub struct GenerationStage {
    client: Arc<dyn CompletionClient>,
    parser: ReplyParser,
}

impl GenerationStage {
    /// Stage backed by the given completion client.
    #[must_use]
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self {
            client,
            parser: ReplyParser::new(),
        }
    }

    fn build_user_prompt(request: &GenerateRequest) -> String {
        if request.context.is_empty() {
            format!("USER REQUEST: {}", request.user_query)
        } else {
            format!(
                "CONTEXT FROM SIMILAR COMMANDS:\n{}\n\nUSER REQUEST: {}",
                request.context, request.user_query
            )
        }
    }

    fn interpret(&self, session_id: uuid::Uuid, content: &str) -> GenerateResponse {
        let trimmed = content.trim();
        match self.parser.parse(trimmed) {
            Ok(reply) => {
                if reply.command.eq_ignore_ascii_case("OUT_OF_SCOPE") {
                    return GenerateResponse::failure(session_id, OUT_OF_SCOPE_REPLY);
                }
                if reply.command == "NONE" {
                    return GenerateResponse::failure(
                        session_id,
                        non_empty_explanation(reply.explanation),
                    );
                }
                let explanation = if reply.explanation.is_empty() {
                    "No explanation provided.".to_owned()
                } else {
                    reply.explanation
                };
                GenerateResponse::success(session_id, reply.command, explanation, reply.verdict)
            }
            Err(e) => {
                // bare sentinel words without the field structure
                if trimmed.eq_ignore_ascii_case("OUT_OF_SCOPE") {
                    return GenerateResponse::failure(session_id, OUT_OF_SCOPE_REPLY);
                }
                if let Some(rest) = bare_none_sentinel(trimmed) {
                    return GenerateResponse::failure(
                        session_id,
                        non_empty_explanation(rest.to_owned()),
                    );
                }
                // an unstructured but non-empty reply is still worth
                // surfacing; the classifier will vet whatever command text
                // is in it
                warn!(session_id = %session_id, error = %e, "unstructured model reply");
                GenerateResponse::success(
                    session_id,
                    trimmed,
                    "Could not parse structured response",
                    gitpilot_llm::Verdict::Unknown,
                )
            }
        }
    }
}

fn non_empty_explanation(explanation: String) -> String {
    if explanation.trim().is_empty() {
        "No single git command answers this request.".to_owned()
    } else {
        explanation
    }
}

/// `NONE` as a standalone leading word, optionally followed by the reason.
/// Exact case; `NONEXISTENT ...` is not a sentinel.
fn bare_none_sentinel(text: &str) -> Option<&str> {
    let rest = text.strip_prefix("NONE")?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

#[async_trait::async_trait]
impl Worker for GenerationStage {
    type Msg = GenerationMsg;

    async fn handle(&mut self, msg: GenerationMsg) -> Result<()> {
        let GenerationMsg::Generate { request, reply } = msg;
        let completion = CompletionRequest::new(SYSTEM_PROMPT, Self::build_user_prompt(&request));
        let response = match self.client.complete(completion).await {
            Ok(r) => {
                debug!(
                    session_id = %request.session_id,
                    client = self.client.name(),
                    "generation done"
                );
                self.interpret(request.session_id, &r.content)
            }
            Err(e) => {
                warn!(
                    session_id = %request.session_id,
                    client = self.client.name(),
                    error = %e,
                    "generation failed"
                );
                GenerateResponse::failure(request.session_id, e.to_string())
            }
        };
        let _ = reply.send(response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpilot_llm::{ScriptedClient, Verdict};
    use uuid::Uuid;

    async fn generate(client: Arc<ScriptedClient>, context: &str) -> GenerateResponse {
        let mut stage = GenerationStage::new(client);
        let (tx, rx) = oneshot::channel();
        stage
            .handle(GenerationMsg::Generate {
                request: GenerateRequest {
                    session_id: Uuid::new_v4(),
                    user_query: "undo my last commit".into(),
                    context: context.into(),
                },
                reply: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_structured_reply_parsed() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply(
            "COMMAND: git reset --soft HEAD~1\nSAFETY: CAUTION\nEXPLANATION: Moves the branch back one commit.",
        );
        let response = generate(client, "").await;
        assert!(response.success);
        assert_eq!(response.command.as_deref(), Some("git reset --soft HEAD~1"));
        assert_eq!(response.verdict, Verdict::Caution);
    }

    #[tokio::test]
    async fn test_out_of_scope_command_field() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply(
            "COMMAND: OUT_OF_SCOPE\nSAFETY: SAFE\nEXPLANATION: I only help with Git.",
        );
        let response = generate(client, "").await;
        assert!(!response.success);
        assert!(response.command.is_none());
        assert_eq!(response.error.as_deref(), Some(OUT_OF_SCOPE_REPLY));
    }

    #[tokio::test]
    async fn test_none_command_field_fails_with_explanation() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply(
            "COMMAND: NONE\nSAFETY: SAFE\nEXPLANATION: That needs several commands.",
        );
        let response = generate(client, "").await;
        assert!(!response.success);
        assert!(response.command.is_none());
        assert_eq!(
            response.error.as_deref(),
            Some("That needs several commands.")
        );
    }

    #[tokio::test]
    async fn test_out_of_scope_bare_word_any_case() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("out_of_scope");
        let response = generate(client, "").await;
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some(OUT_OF_SCOPE_REPLY));
    }

    #[tokio::test]
    async fn test_none_is_case_sensitive() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("NONE There is no single command for that.");
        let response = generate(client, "").await;
        assert!(!response.success);
        assert_eq!(
            response.error.as_deref(),
            Some("There is no single command for that.")
        );

        // lowercase "none" is not the sentinel; it falls through to parsing
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("none of the above");
        let response = generate(client, "").await;
        assert!(response.success);
        assert_eq!(response.verdict, Verdict::Unknown);
    }

    #[tokio::test]
    async fn test_none_requires_a_word_boundary() {
        // a reply that merely starts with the letters NONE is not the sentinel
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("NONEXISTENT commands cannot be recommended");
        let response = generate(client, "").await;
        assert!(response.success);
        assert_eq!(
            response.command.as_deref(),
            Some("NONEXISTENT commands cannot be recommended")
        );
        assert_eq!(response.verdict, Verdict::Unknown);
    }

    #[tokio::test]
    async fn test_unparseable_reply_surfaces_raw_content() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("just use git reset, trust me");
        let response = generate(client, "").await;
        assert!(response.success);
        assert_eq!(
            response.command.as_deref(),
            Some("just use git reset, trust me")
        );
        assert_eq!(
            response.explanation.as_deref(),
            Some("Could not parse structured response")
        );
        assert_eq!(response.verdict, Verdict::Unknown);
    }

    #[tokio::test]
    async fn test_client_error_is_failure() {
        let client = Arc::new(ScriptedClient::new());
        client.push_error(gitpilot_llm::Error::Timeout(30_000));
        let response = generate(client, "").await;
        assert!(!response.success);
        assert!(response.error.is_some());
    }

    #[tokio::test]
    async fn test_context_included_in_prompt() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("COMMAND: git status\nSAFETY: SAFE\nEXPLANATION: Shows status.");
        let _ = generate(Arc::clone(&client), "1. git reset - moves HEAD (Risk: caution)\n").await;
        let seen = client.requests();
        assert!(seen[0].user.starts_with("CONTEXT FROM SIMILAR COMMANDS:\n"));
        assert!(seen[0].user.contains("USER REQUEST: undo my last commit"));
        assert_eq!(seen[0].system, SYSTEM_PROMPT);
    }

    #[tokio::test]
    async fn test_empty_context_omits_block() {
        let client = Arc::new(ScriptedClient::new());
        client.push_reply("COMMAND: git status\nSAFETY: SAFE\nEXPLANATION: Shows status.");
        let _ = generate(Arc::clone(&client), "").await;
        let seen = client.requests();
        assert!(seen[0].user.starts_with("USER REQUEST:"));
    }
}
