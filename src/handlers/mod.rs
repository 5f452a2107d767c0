pub mod callbacks;
pub mod commands;
pub mod messages;
pub mod reminders;
pub mod utils;

pub use callbacks::callback_handler;
pub use commands::{command_handler, Command};
pub use messages::message_handler;

use std::env;

use teloxide::Bot;
use tokio::time;

use crate::bot_state::BotState;

const DEFAULT_CHECK_INTERVAL_SECS: u64 = 300;

/// Фоновая задача напоминаний о поливе.
///
/// Каждый тик выполняет один скан до конца, поэтому сканы никогда
/// не перекрываются. Флага "напоминание отправлено" в базе нет:
/// выборка пересчитывается с нуля на каждом скане, и после рестарта
/// недосланные напоминания просто уходят на следующем тике.
pub async fn watering_reminder_task(bot: Bot, state: BotState) {
    let period = env::var("REMINDER_CHECK_INTERVAL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_CHECK_INTERVAL_SECS);

    log::info!("Watering reminder task started, period {}s", period);

    let mut interval = time::interval(time::Duration::from_secs(period));

    loop {
        interval.tick().await;

        match reminders::run_reminder_scan(&bot, &state).await {
            Ok((sent, failed)) => {
                if sent + failed > 0 {
                    log::info!("💧 Watering scan: {} reminders sent, {} failed", sent, failed);
                }
            }
            Err(e) => {
                log::error!("Error scanning plants needing watering: {}", e);
            }
        }
    }
}
