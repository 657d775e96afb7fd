//! Retrieval stage
//!
//! Thin worker in front of a [`CommandStore`]. A store error becomes a
//! failure response, never a worker fault: the session degrades to an empty
//! context instead of taking the stage down.

use std::sync::Arc;

use gitpilot_search::CommandStore;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::error::Result;
use crate::messages::{SearchRequest, SearchResponse};
use crate::supervisor::Worker;

/// Messages accepted by the retrieval stage.
pub enum RetrievalMsg {
    /// Look up similar commands and reply with the matches.
    Search {
        /// The request
        request: SearchRequest,
        /// Reply address
        reply: oneshot::Sender<SearchResponse>,
    },
}

/// Retrieval stage worker.
pub struct RetrievalStage {
    store: Arc<dyn CommandStore>,
}

impl RetrievalStage {
    /// Stage backed by the given store.
    #[must_use]
    pub fn new(store: Arc<dyn CommandStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Worker for RetrievalStage {
    type Msg = RetrievalMsg;

    async fn handle(&mut self, msg: RetrievalMsg) -> Result<()> {
        let RetrievalMsg::Search { request, reply } = msg;
        let response = match self
            .store
            .find_similar(&request.query, request.top_k)
            .await
        {
            Ok(entries) => {
                debug!(
                    session_id = %request.session_id,
                    hits = entries.len(),
                    store = self.store.name(),
                    "retrieval done"
                );
                SearchResponse::success(
                    request.session_id,
                    entries.into_iter().map(Into::into).collect(),
                )
            }
            Err(e) => {
                warn!(
                    session_id = %request.session_id,
                    store = self.store.name(),
                    error = %e,
                    "retrieval failed"
                );
                SearchResponse::failure(request.session_id, e.to_string())
            }
        };
        let _ = reply.send(response);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gitpilot_search::{FailingStore, MemoryStore};
    use uuid::Uuid;

    async fn search(stage: &mut RetrievalStage, query: &str) -> SearchResponse {
        let (tx, rx) = oneshot::channel();
        stage
            .handle(RetrievalMsg::Search {
                request: SearchRequest {
                    session_id: Uuid::new_v4(),
                    query: query.into(),
                    top_k: 3,
                },
                reply: tx,
            })
            .await
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_matches() {
        let mut stage = RetrievalStage::new(Arc::new(MemoryStore::with_builtin_catalog()));
        let response = search(&mut stage, "undo my last commit").await;
        assert!(response.success);
        assert!(!response.results.is_empty());
        assert!(response.results.len() <= 3);
    }

    #[tokio::test]
    async fn test_store_error_is_failure_response_not_fault() {
        let mut stage = RetrievalStage::new(Arc::new(FailingStore));
        let response = search(&mut stage, "anything").await;
        assert!(!response.success);
        assert!(response.results.is_empty());
        assert!(response.error.is_some());
    }
}
