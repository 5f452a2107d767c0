use teloxide::prelude::*;
use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup, ParseMode,
    ReplyMarkup, User,
};
use std::error::Error;
use chrono::{DateTime, Utc};

use crate::bot_state::BotState;
use crate::database::StoreError;
use crate::models::{CareEntry, Plant, INTERVAL_PRESETS};

/// Экранирование MarkdownV2
pub fn escape_markdown_v2(text: &str) -> String {
    let specials = ['_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!'];
    let mut out = String::with_capacity(text.len() * 2);

    for ch in text.chars() {
        if specials.contains(&ch) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%d.%m.%Y %H:%M").to_string()
}

/// Главное меню
pub fn main_menu_keyboard() -> ReplyMarkup {
    ReplyMarkup::Keyboard(
        KeyboardMarkup::new(vec![
            vec![
                KeyboardButton::new("🌿 Мои растения"),
                KeyboardButton::new("➕ Добавить растение"),
            ],
            vec![
                KeyboardButton::new("💧 Проверить полив"),
                KeyboardButton::new("ℹ️ О боте"),
            ],
        ])
        .resize_keyboard(),
    )
}

/// Клавиатура выбора интервала полива
pub fn make_interval_keyboard() -> InlineKeyboardMarkup {
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = INTERVAL_PRESETS
        .iter()
        .map(|&days| {
            vec![InlineKeyboardButton::callback(
                preset_label(days),
                format!("interval_{}", days),
            )]
        })
        .collect();

    keyboard.push(vec![InlineKeyboardButton::callback(
        "📝 Ввести свой интервал",
        "custom_interval",
    )]);

    InlineKeyboardMarkup::new(keyboard)
}

fn preset_label(days: i64) -> String {
    match days {
        1 => "💧 Каждый день".to_string(),
        3 => "💧 Каждые 3 дня".to_string(),
        7 => "💧 Раз в неделю".to_string(),
        14 => "💧 Раз в 2 недели".to_string(),
        _ => format!("💧 Каждые {} дней", days),
    }
}

pub fn make_plant_card_keyboard(plant_id: i64) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![InlineKeyboardButton::callback(
            "💧 Настроить напоминания",
            format!("reminders_{}", plant_id),
        )],
        vec![InlineKeyboardButton::callback(
            "✅ Полил(а)",
            format!("watered_{}", plant_id),
        )],
        vec![InlineKeyboardButton::callback("◀️ К списку", "my_plants")],
    ])
}

/// Регистрация/обновление пользователя по данным Telegram.
/// Вызывается на каждом взаимодействии, идемпотентна.
pub async fn upsert_tg_user(
    state: &BotState,
    chat_id: ChatId,
    from: Option<&User>,
) -> Result<i64, StoreError> {
    let (username, first_name, last_name) = match from {
        Some(user) => (
            user.username.as_deref(),
            Some(user.first_name.as_str()),
            user.last_name.as_deref(),
        ),
        None => (None, None, None),
    };

    state
        .db
        .upsert_user(chat_id, username, first_name, last_name)
        .await
}

pub async fn show_user_plants(
    bot: &Bot,
    chat_id: ChatId,
    from: Option<&User>,
    state: &BotState,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    let user_id = upsert_tg_user(state, chat_id, from).await?;
    let plants = state.db.list_plants(user_id).await?;

    if plants.is_empty() {
        let keyboard = InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::callback(
            "➕ Добавить растение",
            "add_plant",
        )]]);

        bot.send_message(
            chat_id,
            "🌱 *У вас пока нет растений*\n\nДобавьте первое растение с помощью кнопки ниже 👇",
        )
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(keyboard)
        .await?;

        return Ok(());
    }

    let mut text = String::from("🌿 *Мои растения:*\n\n");
    let mut keyboard: Vec<Vec<InlineKeyboardButton>> = Vec::new();

    for plant in &plants {
        text.push_str(&format!("• *{}*", escape_markdown_v2(&plant.name)));
        if let Some(days) = plant.watering_every_days {
            text.push_str(&format!(" 💧 каждые {} дней", days));
        }
        text.push('\n');

        keyboard.push(vec![
            InlineKeyboardButton::callback(
                format!("🌱 {}", plant.name),
                format!("plant_{}", plant.id),
            ),
            InlineKeyboardButton::callback("💧 Напоминания", format!("reminders_{}", plant.id)),
            InlineKeyboardButton::callback("🗑️ Удалить", format!("delete_{}", plant.id)),
        ]);
    }

    keyboard.push(vec![InlineKeyboardButton::callback(
        "➕ Добавить растение",
        "add_plant",
    )]);

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::MarkdownV2)
        .reply_markup(InlineKeyboardMarkup::new(keyboard))
        .await?;

    Ok(())
}

/// Карточка растения с хвостом истории ухода
pub fn format_plant_card(plant: &Plant, history: &[CareEntry]) -> String {
    let mut text = format!("🌱 *{}*\n", escape_markdown_v2(&plant.name));

    if let Some(plant_type) = &plant.plant_type {
        text.push_str(&format!("🔬 *Тип:* {}\n", escape_markdown_v2(plant_type)));
    }

    match plant.watering_every_days {
        Some(days) => text.push_str(&format!("💧 *Полив:* каждые {} дней\n", days)),
        None => text.push_str("💧 *Полив:* не настроен\n"),
    }

    if let Some(last) = plant.last_watered_at {
        text.push_str(&format!(
            "🕒 *Последний полив:* {}\n",
            escape_markdown_v2(&format_date(last))
        ));
    }

    text.push_str(&format!(
        "📅 *Добавлено:* {}\n",
        escape_markdown_v2(&format_date(plant.created_at))
    ));

    text.push_str("\n📖 *История ухода:*\n");
    if history.is_empty() {
        text.push_str("пока пусто");
    }
    for entry in history {
        text.push_str(&format!(
            "• {} — {}",
            escape_markdown_v2(&format_date(entry.created_at)),
            escape_markdown_v2(entry.action_label())
        ));
        if let Some(note) = &entry.note {
            text.push_str(&format!(" \\({}\\)", escape_markdown_v2(note)));
        }
        text.push('\n');
    }

    text
}

/// Базовая информация по уходу за популярными растениями
pub fn basic_care_info(plant_name: &str) -> &'static str {
    let name = plant_name.to_lowercase();

    let care_info: [(&str, &str); 6] = [
        (
            "фикус",
            "💧 *Полив:* умеренный, когда верхний слой почвы подсохнет\n☀️ *Свет:* яркий рассеянный\n🌡️ *Температура:* 18\\-25°C\n🌿 *Уход:* регулярное опрыскивание",
        ),
        (
            "монстера",
            "💧 *Полив:* обильный, но давайте почве просыхать\n☀️ *Свет:* полутень или рассеянный свет\n🌡️ *Температура:* 20\\-25°C\n🌿 *Уход:* опрыскивание, поддержка для роста",
        ),
        (
            "орхидея",
            "💧 *Полив:* умеренный, методом погружения\n☀️ *Свет:* яркий рассеянный, без прямого солнца\n🌡️ *Температура:* 18\\-25°C\n🌿 *Уход:* специальный субстрат для орхидей",
        ),
        (
            "кактус",
            "💧 *Полив:* редкий, зимой почти не поливать\n☀️ *Свет:* максимально яркий\n🌡️ *Температура:* 20\\-30°C летом, 10\\-15°C зимой\n🌿 *Уход:* хорошо дренированная почва",
        ),
        (
            "суккулент",
            "💧 *Полив:* умеренный, давайте почве полностью просохнуть\n☀️ *Свет:* яркий прямой\n🌡️ *Температура:* 18\\-25°C\n🌿 *Уход:* песчаная почва, хороший дренаж",
        ),
        (
            "алое",
            "💧 *Полив:* умеренный, зимой реже\n☀️ *Свет:* яркий рассеянный\n🌡️ *Температура:* 18\\-25°C\n🌿 *Уход:* не требует частого ухода",
        ),
    ];

    for (key, info) in care_info {
        if name.contains(key) {
            return info;
        }
    }

    "💡 *Общие рекомендации:*\n• Полив: когда верхний слой почвы подсох\n• Свет: яркий рассеянный\n• Температура: 18\\-25°C\n• Удобрения: весной и летом"
}
