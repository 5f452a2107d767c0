use teloxide::types::ChatId;
use tempfile::TempDir;

use plant_care_bot::bot_state::BotState;
use plant_care_bot::database::Database;
use plant_care_bot::models::{parse_custom_interval, DialogState};

async fn test_state(dir: &TempDir) -> BotState {
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("plants.db").display()
    );
    let db = Database::new(&url).await.expect("connect test db");
    db.init().await.expect("init schema");
    BotState::new(db)
}

async fn add_plant_for(state: &BotState, chat: i64, name: &str) -> i64 {
    let user_id = state
        .db
        .upsert_user(ChatId(chat), None, Some("Test"), None)
        .await
        .unwrap();
    state.db.add_plant(user_id, name, None, None).await.unwrap()
}

#[tokio::test]
async fn preset_choice_commits_and_clears_session() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let chat = ChatId(10);
    let plant_id = add_plant_for(&state, 10, "Фикус").await;

    state
        .set_dialog(chat, DialogState::AwaitingIntervalChoice { plant_id })
        .await;

    let plant = state
        .commit_interval(chat, 7)
        .await
        .unwrap()
        .expect("commit returns the configured plant");

    assert_eq!(plant.name, "Фикус");
    assert_eq!(plant.watering_every_days, Some(7));
    assert!(plant.last_watered_at.is_some());
    assert_eq!(state.dialog(chat).await, None, "session is cleared on commit");

    // Сразу после настройки не в выборке полива
    assert!(state.db.get_plants_needing_watering().await.unwrap().is_empty());
}

#[tokio::test]
async fn invalid_input_preserves_session_and_store() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let chat = ChatId(11);
    let plant_id = add_plant_for(&state, 11, "Монстера").await;

    state
        .set_dialog(chat, DialogState::AwaitingIntervalChoice { plant_id })
        .await;

    // Обработчик при ошибке валидации не трогает ни базу, ни сессию
    assert!(parse_custom_interval("abc").is_err());
    assert!(parse_custom_interval("45").is_err());

    let plant = state.db.get_plant(plant_id).await.unwrap().unwrap();
    assert_eq!(plant.watering_every_days, None, "no store mutation on rejection");
    assert_eq!(
        state.dialog(chat).await,
        Some(DialogState::AwaitingIntervalChoice { plant_id }),
        "plant stays bound for a retry"
    );

    // Повторная попытка с корректным значением проходит без перевыбора растения
    let interval = parse_custom_interval("5").unwrap();
    let plant = state.commit_interval(chat, interval).await.unwrap().unwrap();
    assert_eq!(plant.watering_every_days, Some(5));
    assert_eq!(state.dialog(chat).await, None);
}

#[tokio::test]
async fn stale_session_commit_is_noop() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let chat = ChatId(12);

    // Сессии нет вовсе
    assert!(state.commit_interval(chat, 3).await.unwrap().is_none());

    // Сессия привязана к уже удалённому растению
    let plant_id = add_plant_for(&state, 12, "Кактус").await;
    state
        .set_dialog(chat, DialogState::AwaitingIntervalChoice { plant_id })
        .await;
    state.db.delete_plant(plant_id).await.unwrap();

    assert!(state.commit_interval(chat, 3).await.unwrap().is_none());
    assert_eq!(state.dialog(chat).await, None);
}

#[tokio::test]
async fn sessions_are_isolated_per_chat() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let chat_a = ChatId(13);
    let chat_b = ChatId(14);
    let plant_a = add_plant_for(&state, 13, "Фикус").await;
    let plant_b = add_plant_for(&state, 14, "Алоэ").await;

    state
        .set_dialog(chat_a, DialogState::AwaitingIntervalChoice { plant_id: plant_a })
        .await;
    state
        .set_dialog(chat_b, DialogState::AwaitingIntervalChoice { plant_id: plant_b })
        .await;

    let plant = state.commit_interval(chat_a, 3).await.unwrap().unwrap();
    assert_eq!(plant.id, plant_a);
    assert_eq!(plant.watering_every_days, Some(3));

    // Коммит в одном чате не трогает сессию другого
    assert_eq!(
        state.dialog(chat_b).await,
        Some(DialogState::AwaitingIntervalChoice { plant_id: plant_b })
    );

    let plant = state.commit_interval(chat_b, 14).await.unwrap().unwrap();
    assert_eq!(plant.id, plant_b);
    assert_eq!(plant.watering_every_days, Some(14));

    let plant_a = state.db.get_plant(plant_a).await.unwrap().unwrap();
    assert_eq!(plant_a.watering_every_days, Some(3));
}

#[tokio::test]
async fn reentry_rebinds_the_session() {
    let dir = TempDir::new().unwrap();
    let state = test_state(&dir).await;
    let chat = ChatId(15);
    let first = add_plant_for(&state, 15, "Первое").await;
    let second = add_plant_for(&state, 15, "Второе").await;

    state
        .set_dialog(chat, DialogState::AwaitingIntervalChoice { plant_id: first })
        .await;
    // Пользователь начал настраивать другое растение, не завершив первое
    state
        .set_dialog(chat, DialogState::AwaitingIntervalChoice { plant_id: second })
        .await;

    let plant = state.commit_interval(chat, 4).await.unwrap().unwrap();
    assert_eq!(plant.id, second);

    let untouched = state.db.get_plant(first).await.unwrap().unwrap();
    assert_eq!(untouched.watering_every_days, None);
}
