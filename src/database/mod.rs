use std::sync::Once;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use teloxide::types::ChatId;

use crate::models::{CareEntry, DuePlant, Plant};
use crate::schedule;

static INSTALL_DRIVERS: Once = Once::new();

/// Бэкенд выбирается один раз при старте по DATABASE_URL. Дальше вся логика
/// работает через общий AnyPool и от бэкенда не зависит, различается только
/// DDL в init().
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    Postgres,
    Sqlite,
}

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: AnyPool,
    backend: Backend,
}

#[derive(Debug)]
pub enum StoreError {
    Database(String),
    CorruptTimestamp(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Database(e) => write!(f, "Database error: {}", e),
            StoreError::CorruptTimestamp(e) => write!(f, "Corrupt timestamp: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Временные метки хранятся как RFC 3339 TEXT в обоих бэкендах, с фиксированной
/// точностью до микросекунд: строки одного формата сортируются
/// лексикографически так же, как хронологически.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptTimestamp(format!("{raw:?}: {e}")))
}

fn plant_from_row(row: &AnyRow) -> Result<Plant, StoreError> {
    let last_watered_at: Option<String> = row.get("last_watered_at");
    let created_at: String = row.get("created_at");

    Ok(Plant {
        id: row.get("id"),
        user_id: row.get("user_id"),
        name: row.get("name"),
        plant_type: row.get("type"),
        photo_file_id: row.get("photo_file_id"),
        watering_every_days: row.get("watering_every_days"),
        last_watered_at: last_watered_at.map(|raw| parse_ts(&raw)).transpose()?,
        created_at: parse_ts(&created_at)?,
    })
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        INSTALL_DRIVERS.call_once(sqlx::any::install_default_drivers);

        let backend = if database_url.starts_with("postgres") {
            Backend::Postgres
        } else {
            Backend::Sqlite
        };

        let pool = AnyPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await?;

        Ok(Database { pool, backend })
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        let id_pk = match self.backend {
            Backend::Postgres => "BIGSERIAL PRIMARY KEY",
            Backend::Sqlite => "INTEGER PRIMARY KEY AUTOINCREMENT",
        };

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id {id_pk},
                chat_id BIGINT UNIQUE NOT NULL,
                username TEXT,
                first_name TEXT,
                last_name TEXT,
                created_at TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS plants (
                id {id_pk},
                user_id BIGINT NOT NULL REFERENCES users(id),
                name TEXT NOT NULL,
                type TEXT,
                photo_file_id TEXT,
                watering_every_days BIGINT,
                last_watered_at TEXT,
                created_at TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS care_history (
                id {id_pk},
                plant_id BIGINT NOT NULL REFERENCES plants(id),
                action TEXT NOT NULL,
                note TEXT,
                created_at TEXT NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_plants_user_id ON plants (user_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_care_history_plant_id ON care_history (plant_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Создаёт пользователя при первом обращении, дальше только обновляет
    /// отображаемые поля. Безопасно вызывать на каждом взаимодействии.
    pub async fn upsert_user(
        &self,
        chat_id: ChatId,
        username: Option<&str>,
        first_name: Option<&str>,
        last_name: Option<&str>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (chat_id, username, first_name, last_name, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (chat_id) DO UPDATE SET
                username = EXCLUDED.username,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name
            RETURNING id
            "#,
        )
        .bind(chat_id.0)
        .bind(username)
        .bind(first_name)
        .bind(last_name)
        .bind(fmt_ts(Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn add_plant(
        &self,
        user_id: i64,
        name: &str,
        plant_type: Option<&str>,
        photo_file_id: Option<&str>,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO plants (user_id, name, type, photo_file_id, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(plant_type)
        .bind(photo_file_id)
        .bind(fmt_ts(Utc::now()))
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    pub async fn list_plants(&self, user_id: i64) -> Result<Vec<Plant>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, name, type, photo_file_id,
                   watering_every_days, last_watered_at, created_at
            FROM plants
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(plant_from_row).collect()
    }

    pub async fn get_plant(&self, plant_id: i64) -> Result<Option<Plant>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, name, type, photo_file_id,
                   watering_every_days, last_watered_at, created_at
            FROM plants
            WHERE id = $1
            "#,
        )
        .bind(plant_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(plant_from_row).transpose()
    }

    /// Удаляет растение вместе с историей ухода. Повторное удаление того же
    /// id не считается ошибкой.
    pub async fn delete_plant(&self, plant_id: i64) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // сначала история ухода, затем само растение
        sqlx::query("DELETE FROM care_history WHERE plant_id = $1")
            .bind(plant_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM plants WHERE id = $1")
            .bind(plant_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Ставит интервал и одновременно сбрасывает отсчёт от текущего момента:
    /// расписание взводится и обнуляется одним шагом. Несуществующий id:
    /// ноль затронутых строк, без записи в историю.
    pub async fn set_watering_schedule(
        &self,
        plant_id: i64,
        interval_days: i64,
    ) -> Result<(), StoreError> {
        let now = fmt_ts(Utc::now());
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE plants SET watering_every_days = $1, last_watered_at = $2 WHERE id = $3",
        )
        .bind(interval_days)
        .bind(&now)
        .bind(plant_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        if updated > 0 {
            sqlx::query(
                "INSERT INTO care_history (plant_id, action, note, created_at) VALUES ($1, $2, $3, $4)",
            )
            .bind(plant_id)
            .bind("schedule_set")
            .bind(format!("интервал {} дн.", interval_days))
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Отмечает полив: сдвигает last_watered_at на текущий момент, интервал
    /// не трогает. Несуществующий id: тихий no-op.
    pub async fn mark_watered(&self, plant_id: i64) -> Result<(), StoreError> {
        let now = fmt_ts(Utc::now());
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE plants SET last_watered_at = $1 WHERE id = $2")
            .bind(&now)
            .bind(plant_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if updated > 0 {
            sqlx::query(
                "INSERT INTO care_history (plant_id, action, created_at) VALUES ($1, $2, $3)",
            )
            .bind(plant_id)
            .bind("watered")
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Все растения с настроенным расписанием, у которых с последнего полива
    /// прошло строго больше интервала. Фильтрация по времени выполняется в
    /// Rust через schedule::is_due, SQL остаётся одинаковым для обоих
    /// бэкендов.
    pub async fn get_plants_needing_watering(&self) -> Result<Vec<DuePlant>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.id, p.name, p.watering_every_days, p.last_watered_at, u.chat_id
            FROM plants p
            JOIN users u ON u.id = p.user_id
            WHERE p.watering_every_days IS NOT NULL
              AND p.last_watered_at IS NOT NULL
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let now = Utc::now();
        let mut due = Vec::new();

        for row in rows {
            let interval_days: i64 = row.get("watering_every_days");
            let raw_last: String = row.get("last_watered_at");
            let last_watered_at = parse_ts(&raw_last)?;

            if schedule::is_due(now, Some(last_watered_at), Some(interval_days)) {
                due.push(DuePlant {
                    plant_id: row.get("id"),
                    name: row.get("name"),
                    watering_every_days: interval_days,
                    last_watered_at,
                    chat_id: ChatId(row.get("chat_id")),
                });
            }
        }

        Ok(due)
    }

    pub async fn list_care_history(
        &self,
        plant_id: i64,
        limit: i64,
    ) -> Result<Vec<CareEntry>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, plant_id, action, note, created_at
            FROM care_history
            WHERE plant_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(plant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let created_at: String = row.get("created_at");
                Ok(CareEntry {
                    id: row.get("id"),
                    plant_id: row.get("plant_id"),
                    action: row.get("action"),
                    note: row.get("note"),
                    created_at: parse_ts(&created_at)?,
                })
            })
            .collect()
    }
}
