//! Mediator adapter
//!
//! Stateless wrapper around the external text-generation backend:
//! one role-framed prompt in, one generated reply out. No retries, no
//! streaming; failures propagate to the turn coordinator untouched.

mod chat_completion;
mod error;
#[cfg(test)]
pub mod testing;

pub use chat_completion::{ChatCompletionMediator, MediatorConfig};
pub use error::{MediatorError, MediatorErrorKind};

use crate::store::{Party, PartyNames};
use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for mediator backends
#[async_trait]
pub trait MediatorService: Send + Sync {
    /// Generate the relay reply for a message sent by `speaker`.
    async fn generate_reply(
        &self,
        message: &str,
        speaker: Party,
        names: &PartyNames,
    ) -> Result<String, MediatorError>;

    /// Get the model ID
    fn model_id(&self) -> &str;
}

/// Logging wrapper for mediator backends
pub struct LoggingMediator {
    inner: Arc<dyn MediatorService>,
    model_id: String,
}

impl LoggingMediator {
    pub fn new(inner: Arc<dyn MediatorService>) -> Self {
        let model_id = inner.model_id().to_string();
        Self { inner, model_id }
    }
}

#[async_trait]
impl MediatorService for LoggingMediator {
    async fn generate_reply(
        &self,
        message: &str,
        speaker: Party,
        names: &PartyNames,
    ) -> Result<String, MediatorError> {
        let start = std::time::Instant::now();
        let result = self.inner.generate_reply(message, speaker, names).await;
        let duration = start.elapsed();

        match &result {
            Ok(reply) => {
                tracing::info!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    speaker = %speaker,
                    reply_chars = reply.len(),
                    "Mediator reply generated"
                );
            }
            Err(e) => {
                tracing::error!(
                    model = %self.model_id,
                    duration_ms = %duration.as_millis(),
                    speaker = %speaker,
                    error = %e.message,
                    transient = e.kind.is_transient(),
                    "Mediator request failed"
                );
            }
        }

        result
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
