//! Environment-sourced configuration.
//!
//! One explicit struct built per process start and passed into the wiring —
//! no module-level globals, no cross-invocation mutable state.

use anyhow::Result;

pub const DEFAULT_RESPONSES_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram_bot_token: String,
    pub responses_api_key: String,
    pub responses_base_url: String,
    /// Project/folder id for gateways that scope API keys to a project.
    pub responses_project: Option<String>,
    /// Base URL of the session object store; in-memory fallback when unset.
    pub store_base_url: Option<String>,
    pub store_auth_token: Option<String>,
    /// JSON mapping of agent id to display name (object or array form).
    pub agents_json: Option<String>,
    /// Inline-prompt mode for agent-less deployments.
    pub default_model: Option<String>,
    pub system_prompt: String,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            telegram_bot_token: env_string("TELEGRAM_BOT_TOKEN").unwrap_or_default(),
            responses_api_key: env_string("RESPONSES_API_KEY").unwrap_or_default(),
            responses_base_url: env_string("RESPONSES_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RESPONSES_BASE_URL.to_string()),
            responses_project: env_string("RESPONSES_PROJECT"),
            store_base_url: env_string("SESSION_STORE_URL"),
            store_auth_token: env_string("SESSION_STORE_TOKEN"),
            agents_json: env_string("AGENTS_JSON"),
            default_model: env_string("DEFAULT_MODEL"),
            system_prompt: env_string("SYSTEM_PROMPT")
                .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            bind_addr: env_string("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.telegram_bot_token.is_empty() {
            return Err(anyhow::anyhow!("TELEGRAM_BOT_TOKEN is required"));
        }
        if self.responses_api_key.is_empty() {
            return Err(anyhow::anyhow!("RESPONSES_API_KEY is required"));
        }
        if self.bind_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(anyhow::anyhow!(
                "BIND_ADDR {:?} is not a socket address",
                self.bind_addr
            ));
        }
        Ok(())
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
