//! Webhook handler: envelope decoding, command routing, and the agent
//! selection / free-form chat branches.
//!
//! One invocation handles one delivery. All continuity comes from the
//! session store; the only mutable state here is per-call locals. Errors
//! never escape `handle`: malformed input is a 200 no-op, everything else
//! unexpected becomes a 500 envelope.

use crate::menus::{
    AGENT_CALLBACK_PREFIX, LABEL_AGENTS, LABEL_HELP, LABEL_NEW_DIALOG, LABEL_STATUS, agents_keyboard,
    main_menu,
};
use crate::session::SessionManager;
use ag_llm::{AgentSelector, CompletionApi, CompletionRequest};
use ag_telegram::{BotApi, CallbackQuery, Update};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

const NO_AGENT_SELECTED: &str = "❌ No agent selected. Use /agents to pick one.";

/// Invocation envelope: `body` is the webhook payload, either as a JSON
/// string still to be parsed or as an already-structured object.
#[derive(Debug, Clone, Deserialize)]
pub struct FunctionEvent {
    #[serde(default)]
    pub body: Value,
}

impl FunctionEvent {
    pub fn from_raw_body(raw: String) -> Self {
        Self {
            body: Value::String(raw),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    NewDialog,
    Agents,
    Status,
    Help,
}

fn parse_command(text: &str) -> Option<Command> {
    match text.trim() {
        "/start" => Some(Command::Start),
        "/new" | LABEL_NEW_DIALOG => Some(Command::NewDialog),
        "/agents" | LABEL_AGENTS => Some(Command::Agents),
        "/status" | LABEL_STATUS => Some(Command::Status),
        "/help" | LABEL_HELP => Some(Command::Help),
        _ => None,
    }
}

pub struct Handler {
    sessions: SessionManager,
    bot: Arc<dyn BotApi>,
    completions: Arc<dyn CompletionApi>,
    /// Inline `{model, instructions}` selector for agent-less deployments;
    /// consulted only when the registry is empty.
    inline_prompt: Option<AgentSelector>,
}

impl Handler {
    pub fn new(
        sessions: SessionManager,
        bot: Arc<dyn BotApi>,
        completions: Arc<dyn CompletionApi>,
        inline_prompt: Option<AgentSelector>,
    ) -> Self {
        Self {
            sessions,
            bot,
            completions,
            inline_prompt,
        }
    }

    /// The outermost boundary: exactly one response envelope per invocation,
    /// never a propagated error.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn handle(&self, event: FunctionEvent) -> FunctionResponse {
        match self.process(&event).await {
            Ok(body) => FunctionResponse {
                status_code: 200,
                body,
            },
            Err(error) => {
                tracing::error!(%error, "webhook handling failed");
                FunctionResponse {
                    status_code: 500,
                    body: json!({ "ok": false, "error": error.to_string() }),
                }
            }
        }
    }

    async fn process(&self, event: &FunctionEvent) -> Result<Value> {
        let Some(update) = decode_update(&event.body) else {
            return Ok(json!({ "ok": true, "message": "ignored" }));
        };

        if let Some(callback) = update.callback_query {
            return self.on_callback(callback).await;
        }

        let Some(message) = update.message else {
            return Ok(json!({ "ok": true, "message": "no message to process" }));
        };
        let chat_id = message.chat.as_ref().map(|chat| chat.id);
        let text = message.text.as_deref().map(str::trim).unwrap_or_default();
        let (Some(chat_id), false) = (chat_id, text.is_empty()) else {
            return Ok(json!({ "ok": true, "message": "no message to process" }));
        };

        match parse_command(text) {
            // The agents list is a command only when agents exist.
            Some(Command::Agents) if self.sessions.registry().is_empty() => {
                self.on_chat(chat_id, text).await
            }
            Some(command) => self.on_command(chat_id, command).await,
            None => self.on_chat(chat_id, text).await,
        }
    }

    async fn on_command(&self, chat_id: i64, command: Command) -> Result<Value> {
        let registry = self.sessions.registry();
        match command {
            Command::Start => {
                let prior = self.sessions.load(chat_id).await;
                let agent_id = prior
                    .agent_id
                    .or_else(|| registry.first_id().map(ToOwned::to_owned));
                let state = self.sessions.reset(chat_id, agent_id).await;
                let agent_name = state
                    .agent_id
                    .as_deref()
                    .and_then(|id| registry.display_name(id))
                    .unwrap_or("Not selected");
                let text = format!(
                    "👋 *Hi!* I'm an AI assistant with conversation memory.\n\n\
                     🤖 *Current agent:* {agent_name}\n\n\
                     *Commands:*\n\
                     🆕 *New dialog* — clear the context\n\
                     🤖 *Agents* — pick an agent\n\
                     📊 *Status* — dialog info\n\
                     ❓ *Help* — reference\n\n\
                     Just send me a message! 💬"
                );
                self.bot
                    .send_message(chat_id, &text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "action": "start" }))
            }
            Command::NewDialog => {
                let prior = self.sessions.load(chat_id).await;
                self.sessions.reset(chat_id, prior.agent_id).await;
                let text = "🆕 *Dialog reset!*\n\nContext cleared. Starting a new conversation.";
                self.bot
                    .send_message(chat_id, text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "action": "new" }))
            }
            Command::Agents => {
                let state = self.sessions.load(chat_id).await;
                let text = "🤖 *Pick an agent:*\n\nEach agent has its own prompt and tools.";
                let keyboard = agents_keyboard(registry, state.agent_id.as_deref());
                self.bot
                    .send_message(chat_id, text, Some(keyboard))
                    .await?;
                Ok(json!({ "ok": true, "action": "agents" }))
            }
            Command::Status => {
                let state = self.sessions.load(chat_id).await;
                let agent_name = state
                    .agent_id
                    .as_deref()
                    .and_then(|id| registry.display_name(id))
                    .unwrap_or("Not selected");
                let has_context = if state.previous_response_id.is_some() {
                    "✅ Yes"
                } else {
                    "❌ No"
                };
                let text = format!(
                    "📊 *Dialog status*\n\n\
                     🤖 Agent: {agent_name}\n\
                     💬 Messages: {}\n\
                     🧠 Context kept: {has_context}",
                    state.message_count
                );
                self.bot
                    .send_message(chat_id, &text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "action": "status" }))
            }
            Command::Help => {
                let text = "❓ *Reference*\n\n\
                            I'm an AI assistant with memory: I keep the context of our\n\
                            conversation between messages.\n\n\
                            *Commands:*\n\
                            • /new — start a new dialog\n\
                            • /agents — pick an agent\n\
                            • /status — dialog status\n\
                            • /help — this reference\n\n\
                            Switching agents always starts a fresh conversation.";
                self.bot
                    .send_message(chat_id, text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "action": "help" }))
            }
        }
    }

    async fn on_callback(&self, callback: CallbackQuery) -> Result<Value> {
        let chat_id = callback
            .message
            .as_ref()
            .and_then(|message| message.chat.as_ref())
            .map(|chat| chat.id);
        let message_id = callback
            .message
            .as_ref()
            .and_then(|message| message.message_id);
        let data = callback.data.as_deref().unwrap_or_default();
        let (Some(chat_id), Some(message_id), false) = (chat_id, message_id, data.is_empty())
        else {
            return Ok(json!({ "ok": true, "message": "invalid callback" }));
        };

        let Some(agent_id) = data.strip_prefix(AGENT_CALLBACK_PREFIX) else {
            self.bot.answer_callback(&callback.id, None).await?;
            return Ok(json!({ "ok": true, "message": "unknown callback" }));
        };

        let registry = self.sessions.registry();
        if !registry.contains(agent_id) {
            self.bot
                .answer_callback(&callback.id, Some("❌ Agent not found"))
                .await?;
            return Ok(json!({ "ok": false, "message": "agent not found" }));
        }

        let state = self.sessions.load(chat_id).await;
        if state.agent_id.as_deref() != Some(agent_id) {
            // Switching agents always drops the continuation token.
            self.sessions
                .reset(chat_id, Some(agent_id.to_string()))
                .await;
            self.bot
                .answer_callback(&callback.id, Some("✅ Agent changed. Context cleared."))
                .await?;
        } else {
            self.bot
                .answer_callback(&callback.id, Some("ℹ️ This agent is already selected"))
                .await?;
        }

        let agent_name = registry.display_name(agent_id).unwrap_or(agent_id);
        let text = format!("🤖 *Selected agent:* {agent_name}\n\nYou can start chatting now!");
        self.bot
            .edit_message_text(
                chat_id,
                message_id,
                &text,
                Some(agents_keyboard(registry, Some(agent_id))),
            )
            .await?;

        Ok(json!({ "ok": true, "action": "agent_selected", "agent_id": agent_id }))
    }

    async fn on_chat(&self, chat_id: i64, text: &str) -> Result<Value> {
        let state = self.sessions.load(chat_id).await;

        let selector = match state.agent_id.as_deref() {
            Some(id) => AgentSelector::Prompt { id: id.to_string() },
            None => {
                let inline = self
                    .inline_prompt
                    .clone()
                    .filter(|_| self.sessions.registry().is_empty());
                match inline {
                    Some(selector) => selector,
                    None => {
                        self.bot
                            .send_message(chat_id, NO_AGENT_SELECTED, Some(main_menu()))
                            .await?;
                        return Ok(json!({ "ok": true, "message": "no agent selected" }));
                    }
                }
            }
        };

        if let Err(error) = self.bot.send_typing(chat_id).await {
            tracing::debug!(%error, chat_id, "typing indicator failed");
        }

        let request = CompletionRequest {
            selector,
            input: text.to_string(),
            previous_response_id: state.previous_response_id.clone(),
        };
        match self.completions.create(&request).await {
            Ok(completion) => {
                self.sessions.advance(chat_id, &state, &completion.id).await;
                self.bot
                    .send_message(chat_id, &completion.output_text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "message": "response sent" }))
            }
            Err(error) => {
                // Terminal for this turn: no state mutation, no retry.
                tracing::warn!(%error, chat_id, "completion call failed");
                let text = format!("❌ Error: {error}");
                self.bot
                    .send_message(chat_id, &text, Some(main_menu()))
                    .await?;
                Ok(json!({ "ok": true, "message": "completion failed" }))
            }
        }
    }
}

fn decode_update(body: &Value) -> Option<Update> {
    match body {
        Value::String(raw) => serde_json::from_str(raw).ok(),
        Value::Object(_) => serde_json::from_value(body.clone()).ok(),
        _ => None,
    }
}
