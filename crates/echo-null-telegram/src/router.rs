use std::sync::Arc;

use teloxide::{dispatching::Dispatcher as TgDispatcher, dptree, prelude::*};
use tracing::{info, warn};

use echo_null_core::{config::Config, dispatch::Dispatcher, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub messenger: Arc<dyn MessagingPort>,
    /// Own username from `getMe`, used to drop commands meant for other bots.
    pub bot_username: Option<String>,
}

pub async fn run_polling(cfg: Config) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    // Basic startup info.
    let bot_username = match bot.get_me().await {
        Ok(me) => {
            info!(username = %me.username(), "connected to telegram");
            Some(me.username().to_string())
        }
        Err(e) => {
            warn!(error = %e, "getMe failed; continuing with polling");
            None
        }
    };

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        dispatcher: Arc::new(Dispatcher::new()),
        messenger,
        bot_username,
    });

    info!("ECHO NULL bot starting");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_edited_message().endpoint(handlers::handle_message));

    TgDispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
