use std::collections::HashMap;
use std::sync::Arc;

use teloxide::types::ChatId;
use tokio::sync::RwLock;

use crate::database::{Database, StoreError};
use crate::models::{DialogState, Plant};

type DialogMap = Arc<RwLock<HashMap<ChatId, DialogState>>>;

/// Общее состояние бота: хранилище плюс карта диалогов.
///
/// Диалоговое состояние ключуется по chat_id, поэтому параллельные
/// пользователи друг другу не мешают. В карте нет ничего, что дублировало
/// бы строки базы, только контекст незавершённого диалога.
#[derive(Clone)]
pub struct BotState {
    pub db: Database,
    dialogs: DialogMap,
}

impl BotState {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            dialogs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn dialog(&self, chat_id: ChatId) -> Option<DialogState> {
        self.dialogs.read().await.get(&chat_id).copied()
    }

    /// Повторный вход допустим: начало настройки другого растения просто
    /// перепривязывает сессию этого чата.
    pub async fn set_dialog(&self, chat_id: ChatId, state: DialogState) {
        self.dialogs.write().await.insert(chat_id, state);
    }

    pub async fn clear_dialog(&self, chat_id: ChatId) {
        self.dialogs.write().await.remove(&chat_id);
    }

    /// Фиксация выбранного интервала для растения, привязанного к сессии
    /// этого чата.
    ///
    /// Возвращает растение для текста подтверждения. Ok(None) означает
    /// защитный no-op: сессия не привязана к растению или растение уже
    /// удалено, база не меняется (кроме обновления нуля строк), и
    /// пользователю это не показывается как ошибка. При StoreError сессия
    /// остаётся привязанной, чтобы пользователь мог повторить попытку.
    pub async fn commit_interval(
        &self,
        chat_id: ChatId,
        interval_days: i64,
    ) -> Result<Option<Plant>, StoreError> {
        let plant_id = match self.dialog(chat_id).await {
            Some(DialogState::AwaitingIntervalChoice { plant_id }) => plant_id,
            _ => return Ok(None),
        };

        self.db.set_watering_schedule(plant_id, interval_days).await?;
        let plant = self.db.get_plant(plant_id).await?;
        self.clear_dialog(chat_id).await;

        Ok(plant)
    }
}
