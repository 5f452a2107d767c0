use teloxide::prelude::*;
use std::env;

use plant_care_bot::bot_state::BotState;
use plant_care_bot::database::Database;
use plant_care_bot::handlers::{
    self, callback_handler, command_handler, message_handler, Command,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Загружаем .env и инициализируем логирование
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting plant care bot...");

    // DATABASE_URL задан: клиент-серверный Postgres, иначе локальный SQLite
    let database_url = env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://plants.db?mode=rwc".to_string());

    let db = Database::new(&database_url).await?;
    db.init().await?;
    log::info!("✅ Database initialized");

    let state = BotState::new(db);
    let bot = Bot::from_env();

    // Фоновая задача напоминаний о поливе
    let state_clone = state.clone();
    let bot_clone = bot.clone();
    tokio::spawn(async move {
        handlers::watering_reminder_task(bot_clone, state_clone).await;
    });

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
