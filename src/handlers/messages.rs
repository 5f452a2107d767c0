use teloxide::prelude::*;
use teloxide::types::ParseMode;
use std::error::Error;

use crate::bot_state::BotState;
use crate::handlers::reminders;
use crate::handlers::utils::{
    basic_care_info, escape_markdown_v2, main_menu_keyboard, show_user_plants, upsert_tg_user,
};
use crate::models::{parse_custom_interval, DialogState};

pub async fn message_handler(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let Some(text) = msg.text() else {
        bot.send_message(msg.chat.id, "👋 Используйте меню или команду /myplants.")
            .reply_markup(main_menu_keyboard())
            .await?;
        return Ok(());
    };

    // Команды уже обработаны в command_handler
    if text.starts_with('/') {
        return Ok(());
    }

    // Незавершённый диалог имеет приоритет над кнопками меню
    match state.dialog(msg.chat.id).await {
        Some(DialogState::AwaitingPlantName) => {
            return handle_plant_name(&bot, &msg, &state, text).await;
        }
        Some(DialogState::AwaitingIntervalChoice { .. }) => {
            return handle_custom_interval(&bot, &msg, &state, text).await;
        }
        None => {}
    }

    match text {
        "🌿 Мои растения" => {
            show_user_plants(&bot, msg.chat.id, msg.from.as_ref(), &state).await?;
        }
        "➕ Добавить растение" => {
            state
                .set_dialog(msg.chat.id, DialogState::AwaitingPlantName)
                .await;

            bot.send_message(
                msg.chat.id,
                "🌱 *Добавление растения*\n\nВведите название растения:\n\n\
                *Примеры:*\n• Фикус\n• Монстера\n• Орхидея\n• Кактус",
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }
        "💧 Проверить полив" => {
            let (sent, failed) = reminders::run_reminder_scan(&bot, &state).await?;
            if sent + failed == 0 {
                bot.send_message(msg.chat.id, "✅ Все растения политы вовремя!")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, format!("📨 Отправлено {} напоминаний", sent))
                    .await?;
            }
        }
        "ℹ️ О боте" => {
            bot.send_message(
                msg.chat.id,
                "🌿 *О боте*\n\n\
                Это бот для ухода за домашними растениями\\.\n\n\
                *Возможности:*\n\
                • Список ваших растений\n\
                • Напоминания о поливе по расписанию\n\
                • История ухода за каждым растением\n\n\
                Используйте меню для навигации\\.",
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "🌿 Используйте меню или команду /myplants.")
                .reply_markup(main_menu_keyboard())
                .await?;
        }
    }

    Ok(())
}

/// Сохраняем растение только по названию, остальные поля заполняются позже
async fn handle_plant_name(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    text: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let name = text.trim();
    if name.is_empty() {
        bot.send_message(msg.chat.id, "❌ Название не может быть пустым. Введите название растения:")
            .await?;
        return Ok(());
    }

    let user_id = upsert_tg_user(state, msg.chat.id, msg.from.as_ref()).await?;

    if let Err(e) = state.db.add_plant(user_id, name, None, None).await {
        log::error!("Error adding plant for user {}: {}", msg.chat.id, e);
        bot.send_message(msg.chat.id, "⚠️ Не удалось сохранить растение. Попробуйте еще раз.")
            .await?;
        return Ok(());
    }

    state.clear_dialog(msg.chat.id).await;

    let text = format!(
        "🌿 *Растение добавлено\\!*\n\n*Название:* {}\n\n{}",
        escape_markdown_v2(name),
        basic_care_info(name)
    );

    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    Ok(())
}

/// Свободный ввод интервала. При ошибке валидации состояние диалога
/// не меняется: растение остаётся привязанным, пользователь пробует снова.
async fn handle_custom_interval(
    bot: &Bot,
    msg: &Message,
    state: &BotState,
    text: &str,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let interval = match parse_custom_interval(text) {
        Ok(interval) => interval,
        Err(e) => {
            bot.send_message(msg.chat.id, format!("❌ {}", e)).await?;
            return Ok(());
        }
    };

    match state.commit_interval(msg.chat.id, interval).await {
        Ok(Some(plant)) => {
            bot.send_message(
                msg.chat.id,
                format!(
                    "✅ *Напоминания настроены\\!*\n\n\
                    Растение *{}* будет напоминать о поливе каждые {} дней\\.\n\n\
                    Бот пришлёт уведомление, когда придёт время полить растение\\.",
                    escape_markdown_v2(&plant.name),
                    interval
                ),
            )
            .parse_mode(ParseMode::MarkdownV2)
            .await?;
        }
        // Сессия не привязана или растение уже удалено: тихий no-op
        Ok(None) => {}
        Err(e) => {
            log::error!("Error committing interval for chat {}: {}", msg.chat.id, e);
            bot.send_message(msg.chat.id, "⚠️ Не удалось сохранить настройки. Попробуйте еще раз.")
                .await?;
        }
    }

    Ok(())
}
