//! Telegram update handlers.
//!
//! New and edited messages both go through `handle_message`, which converts the
//! Telegram message into a core `IncomingUpdate` and lets the core dispatcher pick
//! and send the reply.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use echo_null_core::{
    dispatch::classify,
    domain::{ChatId, UserId},
    messaging::types::Sender,
};

use crate::router::AppState;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Stickers, photos, etc. carry no text and get no reply.
    let Some(text) = msg.text() else {
        return Ok(());
    };

    let sender = Sender {
        user_id: msg.from().map(|u| UserId(u.id.0 as i64)),
        username: msg.from().and_then(|u| u.username.clone()),
    };
    let Some(update) = classify(
        ChatId(msg.chat.id.0),
        sender,
        text,
        state.bot_username.as_deref(),
    ) else {
        tracing::debug!(chat_id = msg.chat.id.0, "ignoring command addressed to another bot");
        return Ok(());
    };

    if let Err(e) = state
        .dispatcher
        .handle(state.messenger.as_ref(), &update)
        .await
    {
        tracing::warn!(chat_id = msg.chat.id.0, error = %e, "failed to send reply");
    }

    Ok(())
}
