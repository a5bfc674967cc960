use std::time::Duration;

use drill_core::model::{PerformanceRecord, ProblemKey};
use sqlx::Row;

use crate::repository::StorageError;

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Maps driver errors onto the storage taxonomy. Pool exhaustion and
/// `SQLITE_BUSY` after the busy timeout both count as timeouts.
pub(crate) fn driver_error(timeout: Duration) -> impl Fn(sqlx::Error) -> StorageError {
    move |e| match &e {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(timeout),
        sqlx::Error::Database(db) if is_busy(db.code().as_deref()) => {
            StorageError::Timeout(timeout)
        }
        _ => StorageError::Unavailable(e.to_string()),
    }
}

fn is_busy(code: Option<&str>) -> bool {
    // extended result codes keep the primary code in the low byte
    code.and_then(|c| c.parse::<i32>().ok())
        .is_some_and(|c| c & 0xff == 5)
}

pub(crate) fn operand_to_i64(v: u32) -> i64 {
    i64::from(v)
}

pub(crate) fn ms_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn ms_from_i64(field: &'static str, v: Option<i64>) -> Result<Option<u64>, StorageError> {
    v.map(|v| {
        u64::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
    })
    .transpose()
}

pub(crate) fn map_key_row(row: &sqlx::sqlite::SqliteRow) -> Result<ProblemKey, StorageError> {
    let lhs = u32_from_i64("number1", row.try_get::<i64, _>("number1").map_err(ser)?)?;
    let rhs = u32_from_i64("number2", row.try_get::<i64, _>("number2").map_err(ser)?)?;
    ProblemKey::new(lhs, rhs).map_err(ser)
}

pub(crate) fn map_record_row(
    row: &sqlx::sqlite::SqliteRow,
) -> Result<PerformanceRecord, StorageError> {
    let best = ms_from_i64("best_time", row.try_get("best_time").map_err(ser)?)?;
    let previous = ms_from_i64(
        "previous_best_time",
        row.try_get("previous_best_time").map_err(ser)?,
    )?;
    let attempts = u32_from_i64("attempts", row.try_get::<i64, _>("attempts").map_err(ser)?)?;
    let incorrect = u32_from_i64(
        "incorrect_attempts",
        row.try_get::<i64, _>("incorrect_attempts").map_err(ser)?,
    )?;

    PerformanceRecord::from_persisted(best, previous, attempts, incorrect).map_err(ser)
}

pub(crate) fn map_improved_row(row: &sqlx::sqlite::SqliteRow) -> Result<bool, StorageError> {
    match row.try_get::<i64, _>("last_attempt_improved").map_err(ser)? {
        0 => Ok(false),
        1 => Ok(true),
        v => Err(StorageError::Serialization(format!(
            "invalid last_attempt_improved: {v}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_codes_are_recognized() {
        assert!(is_busy(Some("5")));
        assert!(is_busy(Some("517")));
        assert!(!is_busy(Some("19")));
        assert!(!is_busy(None));
    }

    #[test]
    fn pool_timeout_maps_to_timeout() {
        let map = driver_error(Duration::from_millis(250));
        assert!(matches!(
            map(sqlx::Error::PoolTimedOut),
            StorageError::Timeout(d) if d == Duration::from_millis(250)
        ));
        assert!(matches!(
            map(sqlx::Error::PoolClosed),
            StorageError::Unavailable(_)
        ));
    }
}
