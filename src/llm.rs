//! Generative text backend abstraction
//!
//! The quiz generator only needs "prompt in, text out"; this module hides the
//! provider wire format behind `LlmService`.

mod error;
mod gemini;
mod types;

pub use error::{LlmError, LlmErrorKind};
pub use gemini::GeminiService;
pub use types::*;

use async_trait::async_trait;
use std::time::Instant;

/// A text generation backend
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Model name, for logs
    fn model_id(&self) -> &str;
}

/// Wraps a backend and records one log line per call
pub struct LoggingService<S> {
    inner: S,
}

impl<S: LlmService> LoggingService<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<S: LlmService> LlmService for LoggingService<S> {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        let prompt_chars: usize = request.messages.iter().map(|m| m.text.chars().count()).sum();
        let started = Instant::now();
        let result = self.inner.complete(request).await;
        let duration_ms = started.elapsed().as_millis();

        match &result {
            Ok(response) => tracing::info!(
                model = self.inner.model_id(),
                duration_ms = %duration_ms,
                prompt_chars,
                json_output = request.json_output,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                end_turn = response.end_turn,
                "Generation completed"
            ),
            Err(e) => tracing::warn!(
                model = self.inner.model_id(),
                duration_ms = %duration_ms,
                prompt_chars,
                kind = ?e.kind,
                retryable = e.kind.is_retryable(),
                error = %e.message,
                "Generation failed"
            ),
        }

        result
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
