use serde::Serialize;

/// `reply_markup` payloads: a persistent reply keyboard or an inline
/// keyboard. Serialized untagged so the wire shape matches the Bot API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Keyboard {
        keyboard: Vec<Vec<KeyboardButton>>,
        resize_keyboard: bool,
        one_time_keyboard: bool,
    },
    Inline {
        inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
    },
}

impl ReplyMarkup {
    pub fn keyboard(rows: Vec<Vec<KeyboardButton>>) -> Self {
        Self::Keyboard {
            keyboard: rows,
            resize_keyboard: true,
            one_time_keyboard: false,
        }
    }

    pub fn inline(rows: Vec<Vec<InlineKeyboardButton>>) -> Self {
        Self::Inline {
            inline_keyboard: rows,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl KeyboardButton {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineKeyboardButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}
