//! Telegram Bot API surface for agentgram.
//!
//! Pure I/O: outbound calls (`BotApi` + `TelegramApi`) and the permissive
//! decoding of inbound webhook updates. No session or routing logic here.

mod api;
mod markup;
mod traits;
mod update;

pub use api::TelegramApi;
pub use markup::{InlineKeyboardButton, KeyboardButton, ReplyMarkup};
pub use traits::BotApi;
pub use update::{CallbackQuery, Chat, IncomingMessage, Update};
