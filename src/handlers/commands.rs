use teloxide::types::ParseMode;
use teloxide::{prelude::*, utils::command::BotCommands};
use std::error::Error;

use crate::bot_state::BotState;
use crate::handlers::reminders;
use crate::handlers::utils::{main_menu_keyboard, show_user_plants, upsert_tg_user};

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "начать работу с ботом")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "мои растения")]
    MyPlants,
    #[command(rename = "check_reminders", description = "проверить напоминания о поливе")]
    CheckReminders,
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    // Любая команда сбрасывает незавершённый диалог в этом чате
    state.clear_dialog(msg.chat.id).await;

    match cmd {
        Command::Start => handle_start(bot, msg, state).await?,
        Command::Help => handle_help(bot, msg).await?,
        Command::MyPlants => show_user_plants(&bot, msg.chat.id, msg.from.as_ref(), &state).await?,
        Command::CheckReminders => handle_check_reminders(bot, msg, state).await?,
    }
    Ok(())
}

async fn handle_start(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    upsert_tg_user(&state, msg.chat.id, msg.from.as_ref()).await?;

    let start_text = "🌿 *Добро пожаловать в бот по уходу за растениями\\!*\n\n\
        Я помогу вам:\n\
        • 🌱 Вести список ваших растений\n\
        • 💧 Вовремя напоминать о поливе\n\
        • 📖 Хранить историю ухода\n\n\
        *Команды:*\n\
        /start – начать работу\n\
        /myplants – мои растения\n\
        /check\\_reminders – проверить полив\n\
        /help – помощь\n\n\
        Добавьте первое растение через меню ниже 👇";

    bot.send_message(msg.chat.id, start_text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(main_menu_keyboard())
        .await?;

    Ok(())
}

async fn handle_help(bot: Bot, msg: Message) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.send_message(
        msg.chat.id,
        "🌿 *Помощь по боту*\n\n\
        /start - начать работу\n\
        /myplants - мои растения\n\
        /check\\_reminders - проверить полив\n\
        /help - помощь\n\n\
        *Как это работает:*\n\
        1\\. Добавьте растение \\(достаточно названия\\)\n\
        2\\. Настройте интервал полива кнопкой 💧 Напоминания\n\
        3\\. Бот напомнит, когда придёт время полить\n\
        4\\. После полива нажмите ✅ Полил\\(а\\) — отсчёт начнётся заново",
    )
    .parse_mode(ParseMode::MarkdownV2)
    .await?;

    Ok(())
}

/// Ручная проверка напоминаний: тот же скан, что и у фоновой задачи,
/// плюс отчёт о количестве отправленных сообщений.
async fn handle_check_reminders(
    bot: Bot,
    msg: Message,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let (sent, failed) = reminders::run_reminder_scan(&bot, &state).await?;

    if sent + failed == 0 {
        bot.send_message(msg.chat.id, "✅ Все растения политы вовремя!")
            .await?;
    } else {
        bot.send_message(msg.chat.id, format!("📨 Отправлено {} напоминаний", sent))
            .await?;
    }

    Ok(())
}
