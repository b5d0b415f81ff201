use crate::album::AlbumService;
use crate::bot;
use crate::bot::handlers::Command;
use crate::i18n::Localizer;
use std::sync::Arc;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{debug, error, info, warn};

/// Run the Telegram transport runtime until Ctrl+C.
pub async fn run_bot(bot: Bot, service: Arc<AlbumService>, localizer: Arc<Localizer>) {
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Failed to register bot commands: {}", e);
    }

    let handler = setup_handler();

    info!("Bot is running...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![service, localizer])
        // Plain chatter that is neither media nor a keyword
        .default_handler(|upd| async move {
            debug!("Ignoring update {:?}", upd.id);
        })
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

/// Text equal to the translation of `key` in any locale
fn keyword(
    key: &'static str,
) -> impl Fn(Message, Arc<Localizer>) -> bool + Send + Sync + 'static {
    move |msg: Message, localizer: Arc<Localizer>| {
        msg.text().is_some_and(|text| localizer.matches(key, text))
    }
}

fn setup_handler() -> UpdateHandler<teloxide::RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(
            dptree::filter(|msg: Message| msg.photo().is_some() || msg.video().is_some())
                .endpoint(handle_media),
        )
        .branch(dptree::filter(keyword("keyboard_done")).endpoint(handle_done))
        .branch(dptree::filter(keyword("keyboard_clear")).endpoint(handle_clear))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    localizer: Arc<Localizer>,
) -> Result<(), teloxide::RequestError> {
    let res = match cmd {
        Command::Start => bot::handlers::start(bot, msg, localizer).await,
        Command::Help => bot::handlers::help(bot, msg, localizer).await,
        Command::Settings => bot::handlers::settings(bot, msg, localizer).await,
    };
    if let Err(e) = res {
        error!("Command error: {}", e);
    }
    respond(())
}

async fn handle_media(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_media(msg, service, localizer).await {
        error!("Media handler error: {}", e);
    }
    respond(())
}

async fn handle_done(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_done(msg, service, localizer).await {
        error!("Done handler error: {}", e);
    }
    respond(())
}

async fn handle_clear(
    msg: Message,
    service: Arc<AlbumService>,
    localizer: Arc<Localizer>,
) -> Result<(), teloxide::RequestError> {
    if let Err(e) = bot::handlers::handle_clear(msg, service, localizer).await {
        error!("Clear handler error: {}", e);
    }
    respond(())
}
