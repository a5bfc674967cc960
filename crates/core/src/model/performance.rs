use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PerformanceRecordError {
    #[error("a stored record needs at least one attempt")]
    NoAttempts,

    #[error("incorrect attempts ({incorrect}) exceed attempts ({attempts})")]
    IncorrectExceedsAttempts { attempts: u32, incorrect: u32 },

    #[error("previous best ({previous} ms) is faster than best ({best} ms)")]
    PreviousFasterThanBest { best: u64, previous: u64 },
}

/// Per-problem performance statistics.
///
/// `best_time_ms` only ever moves down. A stored zero counts as "no time
/// yet" and is replaced by the next recorded time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceRecord {
    #[serde(rename = "bestTime")]
    best_time_ms: Option<u64>,
    #[serde(
        rename = "previousBestTime",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    previous_best_time_ms: Option<u64>,
    attempts: u32,
    incorrect_attempts: u32,
}

impl PerformanceRecord {
    /// Record for the first submission of a problem.
    #[must_use]
    pub fn first_attempt(elapsed_ms: u64, correct: bool) -> Self {
        Self {
            best_time_ms: Some(elapsed_ms),
            previous_best_time_ms: None,
            attempts: 1,
            incorrect_attempts: u32::from(!correct),
        }
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `PerformanceRecordError` if the counters or times are inconsistent.
    pub fn from_persisted(
        best_time_ms: Option<u64>,
        previous_best_time_ms: Option<u64>,
        attempts: u32,
        incorrect_attempts: u32,
    ) -> Result<Self, PerformanceRecordError> {
        if attempts == 0 {
            return Err(PerformanceRecordError::NoAttempts);
        }
        if incorrect_attempts > attempts {
            return Err(PerformanceRecordError::IncorrectExceedsAttempts {
                attempts,
                incorrect: incorrect_attempts,
            });
        }
        if let (Some(best), Some(previous)) = (best_time_ms, previous_best_time_ms) {
            if best > 0 && previous < best {
                return Err(PerformanceRecordError::PreviousFasterThanBest { best, previous });
            }
        }

        Ok(Self {
            best_time_ms,
            previous_best_time_ms,
            attempts,
            incorrect_attempts,
        })
    }

    /// Apply one submission to an optional existing record.
    ///
    /// This is the single update rule every store implements.
    #[must_use]
    pub fn record_attempt(existing: Option<Self>, elapsed_ms: u64, correct: bool) -> Self {
        Self::record_attempt_improving(existing, elapsed_ms, correct).0
    }

    /// `record_attempt`, also reporting whether the submission set a new best.
    /// The first submission for a problem always does.
    #[must_use]
    pub fn record_attempt_improving(
        existing: Option<Self>,
        elapsed_ms: u64,
        correct: bool,
    ) -> (Self, bool) {
        match existing {
            None => (Self::first_attempt(elapsed_ms, correct), true),
            Some(mut record) => {
                let improved = record.apply(elapsed_ms, correct);
                (record, improved)
            }
        }
    }

    /// Apply a further submission. Returns `true` when the best time improved.
    pub fn apply(&mut self, elapsed_ms: u64, correct: bool) -> bool {
        self.attempts = self.attempts.saturating_add(1);
        if !correct {
            self.incorrect_attempts = self.incorrect_attempts.saturating_add(1);
        }

        let improves = match self.best_time_ms {
            None | Some(0) => true,
            Some(best) => elapsed_ms < best,
        };
        if improves {
            self.previous_best_time_ms = self.best_time_ms.filter(|best| *best > 0);
            self.best_time_ms = Some(elapsed_ms);
        }
        improves
    }

    /// Best time, with a stored zero reported as unset.
    #[must_use]
    pub fn best_time_ms(&self) -> Option<u64> {
        self.best_time_ms.filter(|t| *t > 0)
    }

    /// Raw stored best time, zero included.
    #[must_use]
    pub fn stored_best_time_ms(&self) -> Option<u64> {
        self.best_time_ms
    }

    #[must_use]
    pub fn previous_best_time_ms(&self) -> Option<u64> {
        self.previous_best_time_ms
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn incorrect_attempts(&self) -> u32 {
        self.incorrect_attempts
    }

    #[must_use]
    pub fn correct_attempts(&self) -> u32 {
        self.attempts - self.incorrect_attempts
    }

    /// Share of correct submissions in `[0, 1]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        f64::from(self.correct_attempts()) / f64::from(self.attempts.max(1))
    }
}
