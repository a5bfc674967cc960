use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Brings the schema up to date. Safe to call on every start.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    async fn is_applied(pool: &SqlitePool, version: i64) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT 1 FROM schema_migrations WHERE version = ?1")
            .bind(version)
            .fetch_optional(pool)
            .await?;
        Ok(row.is_some())
    }

    sqlx::query(
        r"
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );
            ",
    )
    .execute(pool)
    .await?;

    // Version 1: one row per ordered operand pair.
    if !is_applied(pool, 1).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                CREATE TABLE IF NOT EXISTS performances (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    number1 INTEGER NOT NULL CHECK (number1 > 0),
                    number2 INTEGER NOT NULL CHECK (number2 > 0),
                    best_time INTEGER CHECK (best_time >= 0),
                    previous_best_time INTEGER CHECK (previous_best_time >= 0),
                    attempts INTEGER NOT NULL CHECK (attempts > 0),
                    incorrect_attempts INTEGER NOT NULL
                        CHECK (incorrect_attempts >= 0 AND incorrect_attempts <= attempts),
                    updated_at TEXT NOT NULL,
                    UNIQUE (number1, number2)
                );
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 1).await?;
        tx.commit().await?;
    }

    // Version 2: whether the latest submission lowered the best time, so an
    // update can report it from the same statement.
    if !is_applied(pool, 2).await? {
        let mut tx = pool.begin().await?;

        sqlx::query(
            r"
                ALTER TABLE performances
                ADD COLUMN last_attempt_improved INTEGER NOT NULL DEFAULT 0
                    CHECK (last_attempt_improved IN (0, 1))
            ",
        )
        .execute(&mut *tx)
        .await?;

        mark_applied(&mut tx, 2).await?;
        tx.commit().await?;
    }

    Ok(())
}

async fn mark_applied(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    version: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
            INSERT INTO schema_migrations (version, applied_at)
            VALUES (?1, ?2)
            ON CONFLICT(version) DO NOTHING
        ",
    )
    .bind(version)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;
    Ok(())
}
