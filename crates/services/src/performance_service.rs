use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use drill_core::model::{
    AchievementProgress, PerformanceRecord, Problem, ProblemKey, ProblemStat, SortDirection,
    StatsSortKey, parse_answer, sorted_stats,
};
use drill_core::{GeneratorConfig, ProblemGenerator};
use rand::Rng;
use storage::repository::PerformanceStore;

use crate::error::QuizError;

/// Result of persisting one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordedAttempt {
    pub key: ProblemKey,
    pub record: PerformanceRecord,
    /// The submission set a new best time for its problem.
    pub new_best: bool,
}

/// Scored and persisted answer for a single stateless submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_value: u64,
    pub submitted: Option<i64>,
    pub attempt: RecordedAttempt,
}

/// Stateless operations over the performance store: recording attempts,
/// stats views and achievement levels.
#[derive(Clone)]
pub struct PerformanceService {
    store: Arc<dyn PerformanceStore>,
    generator: ProblemGenerator,
}

impl PerformanceService {
    #[must_use]
    pub fn new(store: Arc<dyn PerformanceStore>, generator: GeneratorConfig) -> Self {
        Self {
            store,
            generator: ProblemGenerator::new(generator),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn PerformanceStore> {
        &self.store
    }

    #[must_use]
    pub fn generator(&self) -> &ProblemGenerator {
        &self.generator
    }

    /// Draw a problem from the configured range.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::GenerationExhausted` if the generator gives up.
    pub fn next_problem<R: Rng>(&self, rng: &mut R) -> Result<Problem, QuizError> {
        Ok(self.generator.generate(rng, &HashSet::new())?)
    }

    /// Record one submission for `key`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn record_attempt(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        correct: bool,
    ) -> Result<RecordedAttempt, QuizError> {
        let updated = self.store.update(key, elapsed_ms, correct).await?;
        Ok(RecordedAttempt {
            key,
            record: updated.record,
            new_best: updated.improved,
        })
    }

    /// Score a raw answer for `key` and persist the attempt.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::UnknownProblem` for a key outside the configured
    /// range and `QuizError::StorageUnavailable` if the store fails.
    pub async fn check_answer(
        &self,
        key: ProblemKey,
        elapsed_ms: u64,
        raw_answer: &str,
    ) -> Result<AnswerFeedback, QuizError> {
        if !self.generator.config().contains(key) {
            return Err(QuizError::UnknownProblem { key });
        }
        let problem = Problem::from(key);
        let submitted = parse_answer(raw_answer);
        let correct = problem.is_correct(submitted);
        let attempt = self.record_attempt(key, elapsed_ms, correct).await?;
        tracing::debug!(%key, elapsed_ms, correct, new_best = attempt.new_best, "answer checked");

        Ok(AnswerFeedback {
            correct,
            correct_value: problem.answer(),
            submitted,
            attempt,
        })
    }

    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn stats(&self) -> Result<HashMap<ProblemKey, PerformanceRecord>, QuizError> {
        Ok(self.store.get_all().await?)
    }

    /// Stats as an ordered table.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn sorted_stats(
        &self,
        key: StatsSortKey,
        direction: SortDirection,
    ) -> Result<Vec<ProblemStat>, QuizError> {
        let records = self.store.get_all().await?;
        Ok(sorted_stats(&records, key, direction))
    }

    /// Current achievement level, `None` before any time is recorded.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn achievement(&self) -> Result<Option<AchievementProgress>, QuizError> {
        let records = self.store.get_all().await?;
        Ok(AchievementProgress::from_records(&records))
    }

    /// Delete every record.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::StorageUnavailable` if the store fails.
    pub async fn reset(&self) -> Result<(), QuizError> {
        self.store.reset().await?;
        tracing::info!("performance history cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::model::AchievementLevel;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::InMemoryPerformanceStore;

    fn service() -> PerformanceService {
        PerformanceService::new(
            Arc::new(InMemoryPerformanceStore::new()),
            GeneratorConfig::standard(),
        )
    }

    fn key(lhs: u32, rhs: u32) -> ProblemKey {
        ProblemKey::new(lhs, rhs).unwrap()
    }

    #[tokio::test]
    async fn check_answer_scores_and_flags_new_best() {
        let svc = service();
        let first = svc.check_answer(key(7, 8), 5_000, "56").await.unwrap();
        assert!(first.correct);
        assert_eq!(first.correct_value, 56);
        assert!(first.attempt.new_best);

        let slower = svc.check_answer(key(7, 8), 6_000, " 56 ").await.unwrap();
        assert!(!slower.attempt.new_best);

        let equal = svc.check_answer(key(7, 8), 5_000, "56").await.unwrap();
        assert!(!equal.attempt.new_best);

        let faster = svc.check_answer(key(7, 8), 3_000, "nope").await.unwrap();
        assert!(!faster.correct);
        assert_eq!(faster.submitted, None);
        assert!(faster.attempt.new_best);
        assert_eq!(faster.attempt.record.previous_best_time_ms(), Some(5_000));
        assert_eq!(faster.attempt.record.attempts(), 4);
        assert_eq!(faster.attempt.record.incorrect_attempts(), 1);
    }

    #[tokio::test]
    async fn keys_outside_range_are_rejected() {
        let svc = service();
        let err = svc.check_answer(key(13, 2), 1_000, "26").await.unwrap_err();
        assert!(matches!(err, QuizError::UnknownProblem { .. }));
        assert!(svc.stats().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn sorted_stats_default_to_most_attempted() {
        let svc = service();
        for _ in 0..3 {
            svc.record_attempt(key(6, 7), 2_000, true).await.unwrap();
        }
        svc.record_attempt(key(2, 2), 900, true).await.unwrap();

        let rows = svc
            .sorted_stats(StatsSortKey::default(), SortDirection::default())
            .await
            .unwrap();
        assert_eq!(rows[0].key, key(6, 7));
        assert_eq!(rows[1].key, key(2, 2));
    }

    #[tokio::test]
    async fn achievement_and_reset() {
        let svc = service();
        assert!(svc.achievement().await.unwrap().is_none());

        svc.record_attempt(key(3, 3), 2_000, true).await.unwrap();
        svc.record_attempt(key(4, 4), 3_000, true).await.unwrap();
        let progress = svc.achievement().await.unwrap().unwrap();
        assert_eq!(progress.level, AchievementLevel::Genius);

        svc.reset().await.unwrap();
        assert!(svc.stats().await.unwrap().is_empty());
    }

    #[test]
    fn next_problem_uses_configured_range() {
        let svc = PerformanceService::new(
            Arc::new(InMemoryPerformanceStore::new()),
            GeneratorConfig::without_tens(),
        );
        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..200 {
            let p = svc.next_problem(&mut rng).unwrap();
            assert!(svc.generator().config().contains(p.key()));
        }
    }
}
