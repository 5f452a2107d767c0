use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// Запись истории ухода. Только для аудита, в логике расписания не участвует.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareEntry {
    pub id: i64,
    pub plant_id: i64,
    pub action: String,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CareEntry {
    pub fn action_label(&self) -> &str {
        match self.action.as_str() {
            "watered" => "💧 Полив",
            "schedule_set" => "🛎 Настройка напоминаний",
            _ => self.action.as_str(),
        }
    }
}
