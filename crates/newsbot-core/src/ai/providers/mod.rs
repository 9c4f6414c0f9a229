mod openai;

pub use openai::OpenAiProvider;

use crate::Result;

/// Opaque text-to-text completion backend
#[async_trait::async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Complete `user_text` under the given system prompt
    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String>;
}
