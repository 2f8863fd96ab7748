use crate::markup::ReplyMarkup;
use crate::traits::BotApi;
use anyhow::Result;
use reqwest::Url;
use serde_json::json;
use std::time::Duration;

#[derive(Clone)]
pub struct TelegramApi {
    http: reqwest::Client,
    bot_token: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            bot_token: bot_token.to_string(),
        })
    }

    fn api_url(&self, method: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "https://api.telegram.org/bot{}/{}",
            self.bot_token, method
        ))?)
    }

    async fn call(&self, method: &str, body: serde_json::Value) -> Result<()> {
        tracing::debug!(method, "telegram api call");
        let url = self.api_url(method)?;
        let resp = self.http.post(url).json(&body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await?;
            return Err(anyhow::anyhow!(
                "telegram {method} failed: status={status} body={text}"
            ));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl BotApi for TelegramApi {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup)?;
        }
        self.call("sendMessage", body).await
    }

    async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<()> {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup)?;
        }
        self.call("editMessageText", body).await
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            body["text"] = json!(text);
        }
        self.call("answerCallbackQuery", body).await
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.call(
            "sendChatAction",
            json!({ "chat_id": chat_id, "action": "typing" }),
        )
        .await
    }
}
