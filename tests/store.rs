use chrono::{Duration, SecondsFormat, Utc};
use teloxide::types::ChatId;
use tempfile::TempDir;

use plant_care_bot::database::Database;

async fn test_db(dir: &TempDir) -> Database {
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.path().join("plants.db").display()
    );
    let db = Database::new(&url).await.expect("connect test db");
    db.init().await.expect("init schema");
    db
}

/// Сдвигает last_watered_at в прошлое напрямую, минуя mark_watered
async fn backdate_last_watered(db: &Database, plant_id: i64, days: i64) {
    let ts = (Utc::now() - Duration::days(days)).to_rfc3339_opts(SecondsFormat::Micros, true);
    sqlx::query("UPDATE plants SET last_watered_at = $1 WHERE id = $2")
        .bind(ts)
        .bind(plant_id)
        .execute(&db.pool)
        .await
        .expect("backdate last_watered_at");
}

#[tokio::test]
async fn upsert_user_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let first = db
        .upsert_user(ChatId(100), Some("ivan"), Some("Иван"), None)
        .await
        .unwrap();
    let second = db
        .upsert_user(ChatId(100), Some("ivan_new"), Some("Иван"), Some("Петров"))
        .await
        .unwrap();

    assert_eq!(first, second, "re-registration must keep the same user id");

    let other = db
        .upsert_user(ChatId(200), None, Some("Мария"), None)
        .await
        .unwrap();
    assert_ne!(first, other);
}

#[tokio::test]
async fn unarmed_plant_never_due() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(1), None, Some("Test"), None).await.unwrap();
    let plant_id = db.add_plant(user_id, "Кактус", None, None).await.unwrap();

    let plant = db.get_plant(plant_id).await.unwrap().unwrap();
    assert!(!plant.is_schedulable());
    assert!(db.get_plants_needing_watering().await.unwrap().is_empty());

    // Интервал без отметки о поливе: расписание всё ещё не взведено
    sqlx::query("UPDATE plants SET watering_every_days = 1 WHERE id = $1")
        .bind(plant_id)
        .execute(&db.pool)
        .await
        .unwrap();

    assert!(db.get_plants_needing_watering().await.unwrap().is_empty());
}

#[tokio::test]
async fn set_watering_schedule_arms_and_resets() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(2), None, Some("Test"), None).await.unwrap();
    let plant_id = db.add_plant(user_id, "Монстера", None, None).await.unwrap();

    let before = Utc::now();
    db.set_watering_schedule(plant_id, 7).await.unwrap();
    let after = Utc::now();

    let plant = db.get_plant(plant_id).await.unwrap().expect("plant exists");
    assert_eq!(plant.watering_every_days, Some(7));
    assert!(plant.is_schedulable());

    let last = plant.last_watered_at.expect("schedule is armed");
    assert!(last >= before - Duration::seconds(1) && last <= after + Duration::seconds(1));

    // Сразу после настройки растение не в выборке
    assert!(db.get_plants_needing_watering().await.unwrap().is_empty());
}

#[tokio::test]
async fn mark_watered_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(3), None, Some("Test"), None).await.unwrap();
    let plant_id = db.add_plant(user_id, "Фикус", None, None).await.unwrap();

    db.set_watering_schedule(plant_id, 1).await.unwrap();
    backdate_last_watered(&db, plant_id, 2).await;
    assert_eq!(db.get_plants_needing_watering().await.unwrap().len(), 1);

    db.mark_watered(plant_id).await.unwrap();
    let first = db
        .get_plant(plant_id)
        .await
        .unwrap()
        .unwrap()
        .last_watered_at
        .unwrap();

    db.mark_watered(plant_id).await.unwrap();
    let second = db
        .get_plant(plant_id)
        .await
        .unwrap()
        .unwrap()
        .last_watered_at
        .unwrap();

    assert!(second >= first, "repeated ack only moves the timestamp forward");
    assert!(db.get_plants_needing_watering().await.unwrap().is_empty());

    // Интервал подтверждение не трогает
    let plant = db.get_plant(plant_id).await.unwrap().unwrap();
    assert_eq!(plant.watering_every_days, Some(1));
}

#[tokio::test]
async fn mark_watered_on_missing_plant_is_silent() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    db.mark_watered(9999).await.unwrap();
}

#[tokio::test]
async fn due_plant_is_reported_until_acknowledged() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db
        .upsert_user(ChatId(111), Some("owner"), Some("Owner"), None)
        .await
        .unwrap();
    let plant_id = db.add_plant(user_id, "Фикус", None, None).await.unwrap();

    db.set_watering_schedule(plant_id, 1).await.unwrap();
    backdate_last_watered(&db, plant_id, 2).await;

    // Выборка стабильна от скана к скану, пока полив не подтверждён
    for _ in 0..2 {
        let due = db.get_plants_needing_watering().await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].plant_id, plant_id);
        assert_eq!(due[0].name, "Фикус");
        assert_eq!(due[0].watering_every_days, 1);
        assert_eq!(due[0].chat_id, ChatId(111));
    }

    db.mark_watered(plant_id).await.unwrap();
    assert!(db.get_plants_needing_watering().await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_cascades_and_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(4), None, Some("Test"), None).await.unwrap();
    let plant_id = db.add_plant(user_id, "Орхидея", None, None).await.unwrap();

    db.set_watering_schedule(plant_id, 3).await.unwrap();
    db.mark_watered(plant_id).await.unwrap();
    assert_eq!(db.list_care_history(plant_id, 10).await.unwrap().len(), 2);

    db.delete_plant(plant_id).await.unwrap();
    assert!(db.get_plant(plant_id).await.unwrap().is_none());
    assert!(db.list_care_history(plant_id, 10).await.unwrap().is_empty());

    // Повторное удаление того же id не считается ошибкой
    db.delete_plant(plant_id).await.unwrap();
}

#[tokio::test]
async fn list_plants_most_recent_first() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(5), None, Some("Test"), None).await.unwrap();
    db.add_plant(user_id, "Первое", None, None).await.unwrap();
    db.add_plant(user_id, "Второе", None, None).await.unwrap();
    db.add_plant(user_id, "Третье", None, None).await.unwrap();

    let names: Vec<String> = db
        .list_plants(user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.name)
        .collect();

    assert_eq!(names, vec!["Третье", "Второе", "Первое"]);
}

#[tokio::test]
async fn care_history_is_appended_most_recent_first() {
    let dir = TempDir::new().unwrap();
    let db = test_db(&dir).await;

    let user_id = db.upsert_user(ChatId(6), None, Some("Test"), None).await.unwrap();
    let plant_id = db.add_plant(user_id, "Алоэ", None, None).await.unwrap();

    db.set_watering_schedule(plant_id, 5).await.unwrap();
    db.mark_watered(plant_id).await.unwrap();

    let history = db.list_care_history(plant_id, 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].action, "watered");
    assert_eq!(history[1].action, "schedule_set");
    assert_eq!(history[1].note.as_deref(), Some("интервал 5 дн."));
}
