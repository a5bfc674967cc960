use drill_core::model::AnsweredQuestion;

use super::session::{QuizSession, SubmitOutcome};
use crate::error::QuizError;
use crate::performance_service::{PerformanceService, RecordedAttempt};

/// Result of answering a single question in a quiz.
#[derive(Debug)]
pub struct QuizAnswerResult {
    pub outcome: SubmitOutcome,
    /// Persistence outcome for this answer. A failure here never blocks the
    /// quiz; callers should tell the user the time may not have been saved.
    pub saved: Result<RecordedAttempt, QuizError>,
}

impl QuizAnswerResult {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.outcome.is_complete()
    }
}

/// Drives a `QuizSession` and persists every answered question.
#[derive(Clone)]
pub struct QuizLoopService {
    performance: PerformanceService,
}

impl QuizLoopService {
    #[must_use]
    pub fn new(performance: PerformanceService) -> Self {
        Self { performance }
    }

    #[must_use]
    pub fn performance(&self) -> &PerformanceService {
        &self.performance
    }

    /// Score `raw` in the session, then record the attempt.
    ///
    /// # Errors
    ///
    /// Returns the session's `QuizError` when the answer cannot be scored.
    /// Storage failures are reported in `QuizAnswerResult::saved` instead.
    pub async fn submit_answer(
        &self,
        session: &mut QuizSession,
        raw: &str,
    ) -> Result<QuizAnswerResult, QuizError> {
        let outcome = session.submit_answer(raw)?;
        let saved = self.record(&outcome.answered).await;
        if let Err(err) = &saved {
            tracing::warn!(
                problem = %outcome.answered.problem.key(),
                error = %err,
                "failed to save performance record"
            );
        }
        Ok(QuizAnswerResult { outcome, saved })
    }

    /// Persist an already scored question, e.g. to retry a failed save.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn record(&self, answered: &AnsweredQuestion) -> Result<RecordedAttempt, QuizError> {
        self.performance
            .record_attempt(answered.problem.key(), answered.elapsed_ms, answered.correct)
            .await
    }
}
