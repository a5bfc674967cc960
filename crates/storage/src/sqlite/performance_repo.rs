use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use drill_core::model::{PerformanceRecord, ProblemKey};

use super::SqlitePerformanceStore;
use super::mapping::{
    driver_error, map_improved_row, map_key_row, map_record_row, ms_to_i64, operand_to_i64,
};
use crate::repository::{PerformanceStore, StorageError, UpdatedRecord};

// Mirrors `PerformanceRecord::apply`: a NULL or zero best is unset, and
// only a strictly faster time moves the old best into previous_best_time.
// Assignments in an upsert all read the pre-update row, which is what lets
// last_attempt_improved be decided in the same statement.
const UPSERT_SQL: &str = r"
    INSERT INTO performances (
        number1, number2, best_time, previous_best_time,
        attempts, incorrect_attempts, last_attempt_improved, updated_at
    )
    VALUES (?1, ?2, ?3, NULL, 1, ?4, 1, ?5)
    ON CONFLICT(number1, number2) DO UPDATE SET
        previous_best_time = CASE
            WHEN performances.best_time IS NULL OR performances.best_time = 0
                THEN NULL
            WHEN excluded.best_time < performances.best_time
                THEN performances.best_time
            ELSE performances.previous_best_time
        END,
        best_time = CASE
            WHEN performances.best_time IS NULL
                OR performances.best_time = 0
                OR excluded.best_time < performances.best_time
                THEN excluded.best_time
            ELSE performances.best_time
        END,
        last_attempt_improved = CASE
            WHEN performances.best_time IS NULL
                OR performances.best_time = 0
                OR excluded.best_time < performances.best_time
                THEN 1
            ELSE 0
        END,
        attempts = performances.attempts + 1,
        incorrect_attempts = performances.incorrect_attempts + excluded.incorrect_attempts,
        updated_at = excluded.updated_at
    RETURNING best_time, previous_best_time, attempts, incorrect_attempts, last_attempt_improved
";

#[async_trait]
impl PerformanceStore for SqlitePerformanceStore {
    async fn get(&self, key: ProblemKey) -> Result<Option<PerformanceRecord>, StorageError> {
        let row = sqlx::query(
            r"
                SELECT best_time, previous_best_time, attempts, incorrect_attempts
                FROM performances
                WHERE number1 = ?1 AND number2 = ?2
            ",
        )
        .bind(operand_to_i64(key.lhs()))
        .bind(operand_to_i64(key.rhs()))
        .fetch_optional(&self.pool)
        .await
        .map_err(driver_error(self.timeout))?;

        row.as_ref().map(map_record_row).transpose()
    }

    async fn update(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        correct: bool,
    ) -> Result<UpdatedRecord, StorageError> {
        let map_err = driver_error(self.timeout);
        let mut tx = self.pool.begin().await.map_err(&map_err)?;

        let row = sqlx::query(UPSERT_SQL)
            .bind(operand_to_i64(key.lhs()))
            .bind(operand_to_i64(key.rhs()))
            .bind(ms_to_i64("best_time", elapsed_ms)?)
            .bind(i64::from(!correct))
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await
            .map_err(&map_err)?;
        let record = map_record_row(&row)?;
        let improved = map_improved_row(&row)?;

        tx.commit().await.map_err(&map_err)?;
        tracing::debug!(%key, elapsed_ms, correct, improved, "recorded attempt");
        Ok(UpdatedRecord { record, improved })
    }

    async fn get_all(&self) -> Result<HashMap<ProblemKey, PerformanceRecord>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT number1, number2, best_time, previous_best_time,
                       attempts, incorrect_attempts
                FROM performances
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(driver_error(self.timeout))?;

        let mut records = HashMap::with_capacity(rows.len());
        for row in &rows {
            records.insert(map_key_row(row)?, map_record_row(row)?);
        }
        Ok(records)
    }

    async fn reset(&self) -> Result<(), StorageError> {
        let deleted = sqlx::query("DELETE FROM performances")
            .execute(&self.pool)
            .await
            .map_err(driver_error(self.timeout))?
            .rows_affected();
        tracing::info!(deleted, "performance records reset");
        Ok(())
    }

    async fn close(&self) -> Result<(), StorageError> {
        self.pool.close().await;
        Ok(())
    }
}
