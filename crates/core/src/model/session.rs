use thiserror::Error;

use crate::model::Problem;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSummaryError {
    #[error("a summary needs at least one answered question")]
    Empty,

    #[error("too many answers for a single session: {len}")]
    TooManyAnswers { len: usize },
}

/// One scored question within a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnsweredQuestion {
    /// 1-based position in the session.
    pub index: u32,
    pub problem: Problem,
    /// Parsed answer, `None` when the input was not a number.
    pub submitted: Option<i64>,
    pub correct: bool,
    pub elapsed_ms: u64,
}

/// Aggregate metrics for a completed quiz.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSummary {
    total_questions: u32,
    correct: u32,
    incorrect: u32,
    total_time_ms: u64,
}

impl QuizSummary {
    /// Build a summary from the answered questions of a session.
    ///
    /// # Errors
    ///
    /// Returns `QuizSummaryError::Empty` for no answers and
    /// `QuizSummaryError::TooManyAnswers` if the count does not fit in `u32`.
    pub fn from_answers(answers: &[AnsweredQuestion]) -> Result<Self, QuizSummaryError> {
        if answers.is_empty() {
            return Err(QuizSummaryError::Empty);
        }
        let total_questions = u32::try_from(answers.len())
            .map_err(|_| QuizSummaryError::TooManyAnswers { len: answers.len() })?;

        let mut correct = 0_u32;
        let mut total_time_ms = 0_u64;
        for answer in answers {
            if answer.correct {
                correct = correct.saturating_add(1);
            }
            total_time_ms = total_time_ms.saturating_add(answer.elapsed_ms);
        }

        Ok(Self {
            total_questions,
            correct,
            incorrect: total_questions - correct,
            total_time_ms,
        })
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    /// Sum of the per-question elapsed times.
    #[must_use]
    pub fn total_time_ms(&self) -> u64 {
        self.total_time_ms
    }

    #[must_use]
    pub fn average_time_ms(&self) -> f64 {
        self.total_time_ms as f64 / f64::from(self.total_questions)
    }

    /// `(total - incorrect) / total`, in `[0, 1]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        f64::from(self.total_questions - self.incorrect) / f64::from(self.total_questions)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy() * 100.0
    }
}
