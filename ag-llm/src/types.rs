use serde::{Deserialize, Serialize};

/// How the completion backend picks its prompt: a server-side agent prompt
/// referenced by id, or an inline model + system instructions pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentSelector {
    Prompt { id: String },
    Inline { model: String, instructions: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub selector: AgentSelector,
    pub input: String,
    /// Continuation id of the prior turn; `None` starts a fresh conversation.
    #[serde(default)]
    pub previous_response_id: Option<String>,
}

/// One completed turn: the new continuation id plus the generated text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Completion {
    pub id: String,
    pub output_text: String,
}
