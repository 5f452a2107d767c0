use serde::{Deserialize, Serialize};
use teloxide::types::ChatId;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plant {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub plant_type: Option<String>,
    pub photo_file_id: Option<String>,
    pub watering_every_days: Option<i64>,
    pub last_watered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Plant {
    /// Расписание настроено: есть и интервал, и отметка о последнем поливе.
    pub fn is_schedulable(&self) -> bool {
        self.watering_every_days.is_some() && self.last_watered_at.is_some()
    }
}

/// Строка выборки "пора поливать": растение плюс chat_id владельца,
/// которому отправляется напоминание.
#[derive(Debug, Clone)]
pub struct DuePlant {
    pub plant_id: i64,
    pub name: String,
    pub watering_every_days: i64,
    pub last_watered_at: DateTime<Utc>,
    pub chat_id: ChatId,
}
