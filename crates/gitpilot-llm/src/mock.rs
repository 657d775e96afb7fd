//! Scripted completion client for testing
//!
//! Returns queued replies (or errors) in order, and records every request it
//! receives so tests can assert on prompt contents.

use crate::client::{CompletionClient, CompletionRequest, CompletionResponse};
use crate::error::{Error, Result};

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

enum Scripted {
    Reply(String),
    Error(Error),
}

/// A mock model backend that plays back scripted replies.
pub struct ScriptedClient {
    script: Arc<Mutex<VecDeque<Scripted>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedClient {
    /// Create a new scripted client with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a reply to return for the next request.
    pub fn push_reply(&self, content: impl Into<String>) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Reply(content.into()));
    }

    /// Queue an error to return for the next request.
    pub fn push_error(&self, error: Error) {
        self.script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(Scripted::Error(error));
    }

    /// Requests received so far, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait::async_trait]
impl CompletionClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let next = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();

        match next {
            Some(Scripted::Reply(content)) => Ok(CompletionResponse {
                content,
                model: Some("scripted".to_string()),
            }),
            Some(Scripted::Error(e)) => Err(e),
            // Default behavior if the script is exhausted
            None => Ok(CompletionResponse {
                content: "COMMAND: git status\nSAFETY: SAFE\nEXPLANATION: Shows where you are."
                    .to_string(),
                model: Some("scripted".to_string()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = ScriptedClient::new();
        client.push_reply("first");
        client.push_error(Error::Api("boom".to_string()));

        let r1 = client
            .complete(CompletionRequest::new("sys", "one"))
            .await
            .unwrap();
        assert_eq!(r1.content, "first");

        let r2 = client.complete(CompletionRequest::new("sys", "two")).await;
        assert!(r2.is_err());

        let requests = client.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user, "one");
        assert_eq!(requests[1].user, "two");
    }

    #[tokio::test]
    async fn test_exhausted_script_returns_default() {
        let client = ScriptedClient::new();
        let r = client
            .complete(CompletionRequest::new("sys", "anything"))
            .await
            .unwrap();
        assert!(r.content.contains("COMMAND:"));
    }
}
