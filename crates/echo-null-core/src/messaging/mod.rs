//! Cross-messenger abstractions (Telegram is the only adapter).

pub mod port;
pub mod types;
