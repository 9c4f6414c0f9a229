use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};

use super::AiProvider;
use crate::config::AiConfig;
use crate::{Error, Result};

const AI_REQUEST_TIMEOUT_SECS: u64 = 600;

/// OpenAI chat completion provider
pub struct OpenAiProvider {
    client: Client<OpenAIConfig>,
    model: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(config: &AiConfig) -> Result<Self> {
        let api_key = config.openai_api_key.as_deref()
            .ok_or_else(|| Error::Config("OpenAI API key not configured".to_string()))?;

        let mut openai_config = OpenAIConfig::new().with_api_key(api_key);
        if let Some(ref base) = config.openai_api_base {
            openai_config = openai_config.with_api_base(base);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(AI_REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.openai_model.clone(),
            max_tokens: config.max_tokens.max(1),
        })
    }
}

#[async_trait::async_trait]
impl AiProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, system_prompt: &str, user_text: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| Error::AiProvider(e.to_string()))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_text)
                    .build()
                    .map_err(|e| Error::AiProvider(e.to_string()))?
                    .into(),
            ])
            .max_tokens(self.max_tokens)
            .temperature(1.0)
            .top_p(1.0)
            .build()
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| Error::AiProvider(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("no choices in completion response".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}
