//! Per-conversation session state machine.
//!
//! A conversation is Fresh (`previous_response_id = None`) or Active. The
//! manager is the sole writer of the stored blob: `load` recovers from any
//! retrieval failure, `reset` and `advance` persist best-effort and keep the
//! turn going on write failure (availability over durability for one turn).

use crate::agents::AgentRegistry;
use crate::store::{SessionStore, dialog_key};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogState {
    #[serde(default)]
    pub previous_response_id: Option<String>,
    #[serde(default)]
    pub message_count: u32,
    #[serde(default)]
    pub agent_id: Option<String>,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    registry: AgentRegistry,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, registry: AgentRegistry) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    fn fresh(&self) -> DialogState {
        DialogState {
            previous_response_id: None,
            message_count: 0,
            agent_id: self.registry.first_id().map(ToOwned::to_owned),
        }
    }

    /// Missing key, malformed payload, and store failure all recover to a
    /// freshly defaulted state; the caller never sees a load error.
    pub async fn load(&self, chat_id: i64) -> DialogState {
        let key = dialog_key(chat_id);
        match self.store.get(&key).await {
            Ok(Some(bytes)) => match serde_json::from_slice(&bytes) {
                Ok(state) => state,
                Err(error) => {
                    tracing::warn!(%error, chat_id, "stored session is malformed; starting fresh");
                    self.fresh()
                }
            },
            Ok(None) => self.fresh(),
            Err(error) => {
                tracing::warn!(%error, chat_id, "session load failed; starting fresh");
                self.fresh()
            }
        }
    }

    /// Zero the continuation and turn count, keeping or replacing the agent.
    /// Used for `/start`, `/new`, and agent switches.
    pub async fn reset(&self, chat_id: i64, agent_id: Option<String>) -> DialogState {
        let state = DialogState {
            previous_response_id: None,
            message_count: 0,
            agent_id,
        };
        self.save(chat_id, &state).await;
        state
    }

    /// Record one completed turn. Called only after a successful completion.
    pub async fn advance(&self, chat_id: i64, prior: &DialogState, turn_id: &str) -> DialogState {
        let state = DialogState {
            previous_response_id: Some(turn_id.to_string()),
            message_count: prior.message_count.saturating_add(1),
            agent_id: prior.agent_id.clone(),
        };
        self.save(chat_id, &state).await;
        state
    }

    async fn save(&self, chat_id: i64, state: &DialogState) {
        let key = dialog_key(chat_id);
        let bytes = match serde_json::to_vec(state) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, chat_id, "session serialize failed; state not persisted");
                return;
            }
        };
        if let Err(error) = self.store.put(&key, bytes).await {
            tracing::warn!(%error, chat_id, "session save failed; continuing with in-memory state");
        }
    }
}
