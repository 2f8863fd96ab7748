use crate::markup::ReplyMarkup;
use anyhow::Result;
use async_trait::async_trait;

/// Outbound Bot API calls the handler needs. Responses carry no information
/// the handler acts on, so every method resolves to `Result<()>`.
#[async_trait]
pub trait BotApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()>;

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn send_typing(&self, chat_id: i64) -> Result<()>;
}
