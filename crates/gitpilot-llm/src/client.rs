//! Completion client trait and request/response types
//!
//! This module defines the trait that all model backends must implement,
//! together with the prompt-in/text-out types the generation stage uses.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// A single completion request: fixed system instruction plus user prompt.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// System instruction (the behavioral contract)
    pub system: String,
    /// User prompt (query plus optional retrieved context)
    pub user: String,
    /// Temperature (0.0 - 2.0)
    pub temperature: Option<f32>,
    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// Create a new completion request
    #[must_use]
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            ..Default::default()
        }
    }

    /// Set temperature
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set max tokens
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

/// Free-text completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Generated content
    pub content: String,
    /// Model that produced it, if the backend reports one
    pub model: Option<String>,
}

/// Trait for model backends
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Get the backend name
    fn name(&self) -> &str;

    /// Complete a prompt
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;
}
