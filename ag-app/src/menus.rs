//! Keyboard layouts and the button captions that double as commands.

use crate::agents::AgentRegistry;
use ag_telegram::{InlineKeyboardButton, KeyboardButton, ReplyMarkup};

pub const LABEL_NEW_DIALOG: &str = "🆕 New dialog";
pub const LABEL_AGENTS: &str = "🤖 Agents";
pub const LABEL_STATUS: &str = "📊 Status";
pub const LABEL_HELP: &str = "❓ Help";

pub const AGENT_CALLBACK_PREFIX: &str = "agent:";

/// Persistent main menu, attached to every user-facing text reply.
pub fn main_menu() -> ReplyMarkup {
    ReplyMarkup::keyboard(vec![
        vec![
            KeyboardButton::new(LABEL_NEW_DIALOG),
            KeyboardButton::new(LABEL_AGENTS),
        ],
        vec![
            KeyboardButton::new(LABEL_STATUS),
            KeyboardButton::new(LABEL_HELP),
        ],
    ])
}

/// One inline button per registry entry, check-marking the current agent.
pub fn agents_keyboard(registry: &AgentRegistry, current: Option<&str>) -> ReplyMarkup {
    let rows = registry
        .iter()
        .map(|entry| {
            let text = if current == Some(entry.id.as_str()) {
                format!("✅ {}", entry.name)
            } else {
                entry.name.clone()
            };
            vec![InlineKeyboardButton::new(
                text,
                format!("{AGENT_CALLBACK_PREFIX}{}", entry.id),
            )]
        })
        .collect();
    ReplyMarkup::inline(rows)
}
