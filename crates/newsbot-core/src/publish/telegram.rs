use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::Publisher;
use crate::config::AppConfig;
use crate::{Error, Result};

const PUBLISH_TIMEOUT_SECS: u64 = 30;

#[derive(Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
}

#[derive(Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

/// Publishes to a Telegram channel through the Bot API
pub struct TelegramPublisher {
    client: Client,
    endpoint: String,
    channel_id: i64,
}

impl TelegramPublisher {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let token = config.telegram.bot_token.as_deref()
            .ok_or_else(|| Error::Config("Telegram bot token not configured".to_string()))?;
        let channel_id = config.telegram.channel_id
            .ok_or_else(|| Error::Config("Telegram channel ID not configured".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(PUBLISH_TIMEOUT_SECS))
            .build()?;

        Ok(Self::with_client(client, &config.telegram.api_base, token, channel_id))
    }

    pub fn with_client(client: Client, api_base: &str, token: &str, channel_id: i64) -> Self {
        Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
            channel_id,
        }
    }
}

#[async_trait::async_trait]
impl Publisher for TelegramPublisher {
    async fn publish(&self, message: &str) -> Result<()> {
        let request = SendMessageRequest {
            chat_id: self.channel_id,
            text: message,
            parse_mode: "MarkdownV2",
        };

        let response = self.client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: Option<TelegramResponse> = response.json().await.ok();

        match body {
            Some(body) if status.is_success() && body.ok => Ok(()),
            Some(body) => Err(Error::Publish(format!(
                "Telegram rejected message (HTTP {}): {}",
                status,
                body.description.unwrap_or_else(|| "no description".to_string())
            ))),
            None => Err(Error::Publish(format!(
                "Unexpected Telegram response (HTTP {})",
                status
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn publisher(server: &MockServer) -> TelegramPublisher {
        TelegramPublisher::with_client(Client::new(), &server.uri(), "123:abc", -100)
    }

    #[tokio::test]
    async fn test_publish_sends_markdown_message() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_json(serde_json::json!({
                "chat_id": -100,
                "text": "*Title*",
                "parse_mode": "MarkdownV2",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 1 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        publisher(&mock_server).publish("*Title*").await.unwrap();
    }

    #[tokio::test]
    async fn test_publish_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "description": "Bad Request: can't parse entities"
            })))
            .mount(&mock_server)
            .await;

        let err = publisher(&mock_server).publish("*broken").await.unwrap_err();
        match err {
            Error::Publish(message) => assert!(message.contains("can't parse entities")),
            other => panic!("unexpected error: {}", other),
        }
    }
}
