use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use super::providers::{AiProvider, OpenAiProvider};
use crate::config::AppConfig;
use crate::shutdown::or_cancelled;
use crate::{Error, Result};

/// AI summarizer that owns the configured provider behind a single-slot lock
///
/// At most one completion is in flight per summarizer. The provider is moved
/// in on construction, so there is no other handle to call it through.
pub struct Summarizer {
    provider: Mutex<Box<dyn AiProvider>>,
    prompt: String,
}

impl Summarizer {
    /// Create a new summarizer based on configuration
    pub fn new(config: &AppConfig) -> Result<Self> {
        let provider = OpenAiProvider::new(&config.ai)?;
        Ok(Self::with_provider(Box::new(provider), &config.ai.prompt))
    }

    pub fn with_provider(provider: Box<dyn AiProvider>, prompt: &str) -> Self {
        Self {
            provider: Mutex::new(provider),
            prompt: prompt.to_string(),
        }
    }

    /// Summarize extracted article text
    pub async fn summarize(&self, text: &str, cancel: &CancellationToken) -> Result<String> {
        let raw = or_cancelled(cancel, self.complete_exclusive(text)).await?;

        normalize_summary(&raw)
    }

    async fn complete_exclusive(&self, text: &str) -> Result<String> {
        let provider = self.provider.lock().await;
        tracing::debug!(provider = provider.name(), chars = text.len(), "Requesting summary");
        provider.complete(&self.prompt, text).await
    }
}

/// Trim the completion and drop any trailing sentence fragment
///
/// Text ending in `.` is returned as-is. Otherwise everything after the last
/// `.` is cut. Text without any `.` gets one appended.
pub fn normalize_summary(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(Error::AiProvider("empty completion".to_string()));
    }

    if trimmed.ends_with('.') {
        return Ok(trimmed.to_string());
    }

    match trimmed.rfind('.') {
        Some(idx) => Ok(trimmed[..=idx].to_string()),
        None => Ok(format!("{}.", trimmed)),
    }
}
