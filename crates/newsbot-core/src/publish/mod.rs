mod markup;
mod telegram;

pub use markup::{escape_markdown, format_article_message};
pub use telegram::TelegramPublisher;

use crate::Result;

/// Broadcast destination for finished messages
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Deliver one MarkdownV2-formatted message
    async fn publish(&self, message: &str) -> Result<()>;
}
