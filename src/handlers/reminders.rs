use std::error::Error;

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};

use crate::bot_state::BotState;
use crate::database::StoreError;
use crate::handlers::utils::escape_markdown_v2;

/// Напоминание о поливе с кнопкой подтверждения.
/// plant_id зашит в callback-данные кнопки, по нему обрабатывается
/// подтверждение "полил(а)".
pub async fn send_watering_reminder(
    bot: &Bot,
    chat_id: ChatId,
    plant_name: &str,
    plant_id: i64,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let text = format!(
        "💧 *Пора полить растение\\!*\n\n\
        Растение *{}* ждет полива\\.\n\n\
        После полива нажмите кнопку ниже 👇",
        escape_markdown_v2(plant_name)
    );

    let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
        "✅ Полил(а)",
        format!("watered_{}", plant_id),
    )]]);

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Один скан: выборка "пора поливать" и рассылка напоминаний владельцам.
///
/// Ошибка отправки по одному растению логируется и не прерывает остальные.
/// Дедупликации между сканами нет: пока полив не подтверждён, растение
/// остаётся в выборке и будет напоминать о себе на каждом скане.
pub async fn run_reminder_scan(bot: &Bot, state: &BotState) -> Result<(usize, usize), StoreError> {
    let due = state.db.get_plants_needing_watering().await?;

    let mut sent = 0;
    let mut failed = 0;

    for plant in due {
        match send_watering_reminder(bot, plant.chat_id, &plant.name, plant.plant_id).await {
            Ok(()) => sent += 1,
            Err(e) => {
                failed += 1;
                log::error!(
                    "❌ Failed to send watering reminder for plant {} ({}): {}",
                    plant.plant_id,
                    plant.name,
                    e
                );
            }
        }
    }

    Ok((sent, failed))
}
