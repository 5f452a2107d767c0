use teloxide::prelude::*;
use teloxide::types::ParseMode;
use std::error::Error;

use crate::bot_state::BotState;
use crate::handlers::utils::{
    escape_markdown_v2, format_plant_card, make_interval_keyboard, make_plant_card_keyboard,
    show_user_plants,
};
use crate::models::{parse_custom_interval, DialogState};

pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    state: BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    bot.answer_callback_query(q.id.clone()).await?;

    if let Some(data) = q.data.as_deref() {
        if let Some(ref message) = q.message {
            let chat_id = message.chat().id;
            let message_id = message.id();

            match data {
                "add_plant" => {
                    state.set_dialog(chat_id, DialogState::AwaitingPlantName).await;

                    bot.send_message(
                        chat_id,
                        "🌱 *Добавление растения*\n\nВведите название растения:\n\n\
                        *Примеры:*\n• Фикус\n• Монстера\n• Орхидея\n• Кактус",
                    )
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
                }

                "my_plants" => {
                    show_user_plants(&bot, chat_id, Some(&q.from), &state).await?;
                }

                data if data.starts_with("reminders_") => {
                    let plant_id = data
                        .strip_prefix("reminders_")
                        .unwrap()
                        .parse::<i64>()
                        .unwrap_or(0);

                    // Привязываем растение к сессии чата и предлагаем интервалы.
                    // Несуществующий id молча игнорируется.
                    if let Some(plant) = state.db.get_plant(plant_id).await? {
                        state
                            .set_dialog(chat_id, DialogState::AwaitingIntervalChoice { plant_id })
                            .await;

                        bot.send_message(
                            chat_id,
                            format!(
                                "🛎 *Настройка напоминаний для {}*\n\n\
                                Как часто нужно поливать это растение?\n\
                                Выберите интервал или введите своё значение:",
                                escape_markdown_v2(&plant.name)
                            ),
                        )
                        .parse_mode(ParseMode::MarkdownV2)
                        .reply_markup(make_interval_keyboard())
                        .await?;
                    }
                }

                data if data.starts_with("interval_") => {
                    let interval = data.strip_prefix("interval_").unwrap();

                    // Кнопки генерируют только пресеты, но данные callback
                    // проходят ту же валидацию, что и свободный ввод
                    if let Ok(interval) = parse_custom_interval(interval) {
                        match state.commit_interval(chat_id, interval).await {
                            Ok(Some(plant)) => {
                                bot.send_message(
                                    chat_id,
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
                            // Просроченная сессия или удалённое растение: тихий no-op
                            Ok(None) => {}
                            Err(e) => {
                                log::error!("Error committing interval for chat {}: {}", chat_id, e);
                                bot.send_message(
                                    chat_id,
                                    "⚠️ Не удалось сохранить настройки. Попробуйте еще раз.",
                                )
                                .await?;
                            }
                        }
                    }
                }

                "custom_interval" => {
                    bot.send_message(
                        chat_id,
                        "📝 Введите интервал полива в днях:\n\n\
                        *Пример:* 5 \\(полив каждые 5 дней\\)",
                    )
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
                }

                data if data.starts_with("watered_") => {
                    let plant_id = data
                        .strip_prefix("watered_")
                        .unwrap()
                        .parse::<i64>()
                        .unwrap_or(0);

                    // Подтверждение прощающее: повторное нажатие или уже
                    // удалённое растение всё равно выглядят как успех
                    state.db.mark_watered(plant_id).await?;

                    bot.edit_message_text(
                        chat_id,
                        message_id,
                        "✅ *Отлично\\! Растение полито\\.*\n\nНапоминание сброшено\\.",
                    )
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
                }

                data if data.starts_with("delete_") => {
                    let plant_id = data
                        .strip_prefix("delete_")
                        .unwrap()
                        .parse::<i64>()
                        .unwrap_or(0);

                    state.db.delete_plant(plant_id).await?;

                    bot.edit_message_text(
                        chat_id,
                        message_id,
                        "✅ *Растение удалено*\n\nОбновите список командой /myplants",
                    )
                    .parse_mode(ParseMode::MarkdownV2)
                    .await?;
                }

                data if data.starts_with("plant_") => {
                    let plant_id = data
                        .strip_prefix("plant_")
                        .unwrap()
                        .parse::<i64>()
                        .unwrap_or(0);

                    if let Some(plant) = state.db.get_plant(plant_id).await? {
                        let history = state.db.list_care_history(plant_id, 5).await?;

                        bot.send_message(chat_id, format_plant_card(&plant, &history))
                            .parse_mode(ParseMode::MarkdownV2)
                            .reply_markup(make_plant_card_keyboard(plant_id))
                            .await?;
                    }
                }

                _ => {}
            }
        }
    }

    Ok(())
}
