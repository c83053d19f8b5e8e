pub mod claude;

pub use claude::{ClaudeClient, ARTIFACT_INSTRUCTION};

use async_trait::async_trait;

use crate::credential::Credential;
use crate::error::CompletionError;
use crate::state::Turn;

/// One request per user turn against a chat-completion endpoint.
///
/// `history` is the transcript as it stood before `user_text` was submitted.
/// Implementations must not retain or mutate it; the caller owns the transcript.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn submit(
        &self,
        history: &[Turn],
        user_text: &str,
        credential: &Credential,
    ) -> Result<String, CompletionError>;
}
