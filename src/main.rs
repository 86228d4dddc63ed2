mod bot;
mod config;
mod quiz;

use std::sync::Arc;

use dotenv::dotenv;
use log::{info, warn};
use quiz::generator::{ChatGptClient, QuestionGenerator};
use teloxide::{
    dispatching::dialogue::{ErasedStorage, InMemStorage, Storage},
    prelude::*,
    utils::command::BotCommands,
};

use bot::{Command, State};
use config::Config;

type QuizStorage = Arc<ErasedStorage<State>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    dotenv().ok();

    pretty_env_logger::init();
    info!("Starting quiz bot...");

    let config = Config::from_env()?;
    if config.api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, every quiz request will fail");
    }
    info!(
        "Using model {} with a {}s timeout",
        config.model,
        config.timeout.as_secs()
    );

    let client = ChatGptClient::new(config.api_key.as_deref(), &config.model, config.timeout)?;
    let generator = Arc::new(QuestionGenerator::new(Arc::new(client)));

    let bot = Bot::from_env();
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("Could not register bot commands: {}", err);
    }

    let storage: QuizStorage = InMemStorage::<State>::new().erase();

    Dispatcher::builder(bot, bot::schema())
        .dependencies(dptree::deps![storage, generator])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
