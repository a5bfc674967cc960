use std::collections::HashSet;
use std::fmt;
use std::time::{Duration, Instant};

use drill_core::model::{
    AnsweredQuestion, Problem, ProblemKey, QuizSettings, QuizSummary, parse_answer,
};
use drill_core::time::duration_to_ms;
use drill_core::{Clock, ProblemGenerator};
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::progress::QuizProgress;
use crate::error::QuizError;

//
// ─── STATE ─────────────────────────────────────────────────────────────────────
//

/// Lifecycle of a quiz: `Idle -> Running -> Complete`, `reset` back to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuizState {
    #[default]
    Idle,
    Running,
    Complete,
}

impl fmt::Display for QuizState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Complete => "complete",
        };
        f.write_str(s)
    }
}

/// What happened on one `submit_answer` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub answered: AnsweredQuestion,
    /// The problem now on screen, `None` once the quiz is complete.
    pub next_problem: Option<Problem>,
    pub summary: Option<QuizSummary>,
}

impl SubmitOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.summary.is_some()
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory quiz of N sequential multiplication questions.
///
/// Holds no store; `QuizLoopService` persists each answered question. Timing
/// uses the session `Clock`, so tests can drive it with `Clock::fixed`.
pub struct QuizSession {
    settings: QuizSettings,
    generator: ProblemGenerator,
    rng: StdRng,
    clock: Clock,
    state: QuizState,
    total_questions: u32,
    current_index: u32,
    score: u32,
    incorrect: u32,
    current: Option<Problem>,
    presented_at: Option<Instant>,
    used: HashSet<ProblemKey>,
    answers: Vec<AnsweredQuestion>,
    summary: Option<QuizSummary>,
}

impl QuizSession {
    /// Idle session seeded from the operating system.
    #[must_use]
    pub fn new(settings: QuizSettings) -> Self {
        Self::with_rng(settings, StdRng::from_os_rng())
    }

    /// Idle session with a reproducible problem sequence.
    #[must_use]
    pub fn with_seed(settings: QuizSettings, seed: u64) -> Self {
        Self::with_rng(settings, StdRng::seed_from_u64(seed))
    }

    fn with_rng(settings: QuizSettings, rng: StdRng) -> Self {
        let generator = ProblemGenerator::new(settings.generator().clone());
        Self {
            settings,
            generator,
            rng,
            clock: Clock::default(),
            state: QuizState::Idle,
            total_questions: 0,
            current_index: 0,
            score: 0,
            incorrect: 0,
            current: None,
            presented_at: None,
            used: HashSet::new(),
            answers: Vec::new(),
            summary: None,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn settings(&self) -> &QuizSettings {
        &self.settings
    }

    /// Begin a quiz of `total_questions` and present the first problem.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` while a quiz is running,
    /// `QuizError::InvalidConfiguration` for a count that is zero, not one of
    /// the configured choices, or larger than the no-repeat domain, and
    /// `QuizError::GenerationExhausted` if no problem can be drawn.
    pub fn start(&mut self, total_questions: u32) -> Result<Problem, QuizError> {
        if self.state == QuizState::Running {
            return Err(QuizError::InvalidStateTransition {
                operation: "start",
                state: self.state,
            });
        }
        if total_questions == 0 {
            return Err(QuizError::InvalidConfiguration(
                "a quiz needs at least one question".to_owned(),
            ));
        }
        if !self.settings.allows(total_questions) {
            return Err(QuizError::InvalidConfiguration(format!(
                "{total_questions} is not one of the offered question counts {:?}",
                self.settings.question_choices()
            )));
        }
        let domain = self.generator.config().domain_size();
        let over_domain = usize::try_from(total_questions).map_or(true, |n| n > domain);
        if self.settings.no_repeat() && over_domain {
            return Err(QuizError::InvalidConfiguration(format!(
                "{total_questions} questions without repeats exceed the {domain} distinct problems"
            )));
        }

        let first = self.generator.generate(&mut self.rng, &HashSet::new())?;

        self.total_questions = total_questions;
        self.current_index = 1;
        self.score = 0;
        self.incorrect = 0;
        self.used.clear();
        self.used.insert(first.key());
        self.answers.clear();
        self.summary = None;
        self.current = Some(first);
        self.presented_at = Some(self.clock.now());
        self.state = QuizState::Running;

        tracing::debug!(total_questions, first = %first.key(), "quiz started");
        Ok(first)
    }

    /// Score `raw` against the current problem and advance.
    ///
    /// Input that does not parse as an integer is scored as incorrect.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidStateTransition` unless the quiz is running,
    /// and `QuizError::GenerationExhausted` if the next problem cannot be
    /// drawn. The session is left untouched on error.
    pub fn submit_answer(&mut self, raw: &str) -> Result<SubmitOutcome, QuizError> {
        let (problem, presented_at) = match (self.state, self.current, self.presented_at) {
            (QuizState::Running, Some(problem), Some(at)) => (problem, at),
            (state, _, _) => {
                return Err(QuizError::InvalidStateTransition {
                    operation: "submit an answer",
                    state,
                });
            }
        };

        let elapsed_ms = duration_to_ms(self.clock.elapsed_since(presented_at));
        let submitted = parse_answer(raw);
        let answered = AnsweredQuestion {
            index: self.current_index,
            problem,
            submitted,
            correct: problem.is_correct(submitted),
            elapsed_ms,
        };

        let next_problem = if self.current_index < self.total_questions {
            let next = if self.settings.no_repeat() {
                self.generator.generate(&mut self.rng, &self.used)?
            } else {
                self.generator.generate(&mut self.rng, &HashSet::new())?
            };
            Some(next)
        } else {
            None
        };

        if answered.correct {
            self.score += 1;
        } else {
            self.incorrect += 1;
        }
        self.answers.push(answered.clone());
        tracing::debug!(
            index = answered.index,
            problem = %problem.key(),
            elapsed_ms,
            correct = answered.correct,
            "answer scored"
        );

        if let Some(next) = next_problem {
            self.used.insert(next.key());
            self.current = Some(next);
            self.current_index += 1;
            self.presented_at = Some(self.clock.now());
            return Ok(SubmitOutcome {
                answered,
                next_problem,
                summary: None,
            });
        }

        let summary = QuizSummary::from_answers(&self.answers)?;
        self.current = None;
        self.presented_at = None;
        self.summary = Some(summary.clone());
        self.state = QuizState::Complete;
        tracing::info!(
            total = summary.total_questions(),
            correct = summary.correct(),
            total_time_ms = summary.total_time_ms(),
            "quiz complete"
        );

        Ok(SubmitOutcome {
            answered,
            next_problem: None,
            summary: Some(summary),
        })
    }

    /// Return to `Idle`, discarding in-memory progress. Persisted records are
    /// untouched.
    pub fn reset(&mut self) {
        self.state = QuizState::Idle;
        self.total_questions = 0;
        self.current_index = 0;
        self.score = 0;
        self.incorrect = 0;
        self.current = None;
        self.presented_at = None;
        self.used.clear();
        self.answers.clear();
        self.summary = None;
    }

    #[must_use]
    pub fn state(&self) -> QuizState {
        self.state
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == QuizState::Complete
    }

    #[must_use]
    pub fn current_problem(&self) -> Option<Problem> {
        self.current
    }

    /// 1-based index of the problem on screen; zero when idle.
    #[must_use]
    pub fn current_index(&self) -> u32 {
        self.current_index
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn incorrect(&self) -> u32 {
        self.incorrect
    }

    #[must_use]
    pub fn results(&self) -> &[AnsweredQuestion] {
        &self.answers
    }

    #[must_use]
    pub fn summary(&self) -> Option<&QuizSummary> {
        self.summary.as_ref()
    }

    /// Time spent on the current problem so far, for a display tick.
    #[must_use]
    pub fn elapsed_on_current(&self) -> Option<Duration> {
        self.presented_at.map(|at| self.clock.elapsed_since(at))
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let answered = u32::try_from(self.answers.len()).unwrap_or(u32::MAX);
        QuizProgress {
            total: self.total_questions,
            answered,
            remaining: self.total_questions.saturating_sub(answered),
            is_complete: self.is_complete(),
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("state", &self.state)
            .field("total_questions", &self.total_questions)
            .field("current_index", &self.current_index)
            .field("score", &self.score)
            .field("incorrect", &self.incorrect)
            .field("current", &self.current)
            .field("answers_len", &self.answers.len())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use drill_core::GeneratorConfig;
    use drill_core::time::fixed_clock;

    fn settings() -> QuizSettings {
        QuizSettings::default()
    }

    fn session() -> QuizSession {
        QuizSession::with_seed(settings(), 17).with_clock(fixed_clock())
    }

    fn answer_for(session: &QuizSession) -> String {
        session.current_problem().unwrap().answer().to_string()
    }

    #[test]
    fn start_presents_first_problem() {
        let mut s = session();
        let first = s.start(5).unwrap();
        assert_eq!(s.state(), QuizState::Running);
        assert_eq!(s.current_problem(), Some(first));
        assert_eq!(s.current_index(), 1);
        assert_eq!(s.total_questions(), 5);
        assert_eq!(s.progress().remaining, 5);
    }

    #[test]
    fn zero_and_unoffered_counts_are_rejected() {
        let mut s = session();
        assert!(matches!(s.start(0), Err(QuizError::InvalidConfiguration(_))));
        assert!(matches!(s.start(7), Err(QuizError::InvalidConfiguration(_))));
        assert_eq!(s.state(), QuizState::Idle);
    }

    #[test]
    fn count_larger_than_domain_is_rejected() {
        let generator = GeneratorConfig::symmetric(2, 3, []).unwrap();
        let err = QuizSettings::new([5], generator.clone(), true).unwrap_err();
        assert!(matches!(QuizError::from(err), QuizError::InvalidConfiguration(_)));

        let repeats = QuizSettings::new([5], generator, false).unwrap();
        let mut s = QuizSession::with_seed(repeats, 1);
        assert!(s.start(5).is_ok());
    }

    #[test]
    fn failed_draw_leaves_session_unchanged() {
        let generator = GeneratorConfig::symmetric(1, 2, []).unwrap().with_max_attempts(1);
        let settings = QuizSettings::new([4], generator, true).unwrap();

        let mut exhausted = 0;
        for seed in 0..50 {
            let mut s = QuizSession::with_seed(settings.clone(), seed).with_clock(fixed_clock());
            s.start(4).unwrap();
            while s.state() == QuizState::Running {
                let index = s.current_index();
                let problem = s.current_problem();
                let answered = s.results().len();
                let score = s.score();

                let answer = answer_for(&s);
                match s.submit_answer(&answer) {
                    Ok(_) => {}
                    Err(QuizError::GenerationExhausted(_)) => {
                        exhausted += 1;
                        assert_eq!(s.state(), QuizState::Running);
                        assert_eq!(s.current_index(), index);
                        assert_eq!(s.current_problem(), problem);
                        assert_eq!(s.results().len(), answered);
                        assert_eq!(s.score(), score);
                        break;
                    }
                    Err(e) => panic!("unexpected error: {e}"),
                }
            }
        }
        assert!(exhausted > 0);
    }

    #[test]
    fn submit_while_idle_is_invalid() {
        let mut s = session();
        assert!(matches!(
            s.submit_answer("42"),
            Err(QuizError::InvalidStateTransition {
                state: QuizState::Idle,
                ..
            })
        ));
    }

    #[test]
    fn start_while_running_is_invalid() {
        let mut s = session();
        s.start(5).unwrap();
        assert!(matches!(
            s.start(10),
            Err(QuizError::InvalidStateTransition {
                state: QuizState::Running,
                ..
            })
        ));
        assert_eq!(s.total_questions(), 5);
    }

    #[test]
    fn full_run_scores_times_and_completes() {
        let mut s = session();
        s.start(5).unwrap();
        let times = [3, 2, 4, 1, 5];
        for (i, secs) in times.iter().enumerate() {
            s.clock_mut().advance(Duration::from_secs(*secs));
            let answer = answer_for(&s);
            let outcome = s.submit_answer(&answer).unwrap();
            assert!(outcome.answered.correct);
            assert_eq!(outcome.answered.elapsed_ms, secs * 1_000);
            assert_eq!(outcome.is_complete(), i == times.len() - 1);
        }

        assert_eq!(s.state(), QuizState::Complete);
        assert_eq!(s.score(), 5);
        assert_eq!(s.incorrect(), 0);
        let summary = s.summary().unwrap();
        assert_eq!(summary.total_questions(), 5);
        assert_eq!(summary.total_time_ms(), 15_000);
        assert!((summary.accuracy() - 1.0).abs() < f64::EPSILON);

        let keys: HashSet<ProblemKey> = s.results().iter().map(|a| a.problem.key()).collect();
        assert_eq!(keys.len(), 5);
        assert!(s.submit_answer("1").is_err());
    }

    #[test]
    fn garbage_input_is_incorrect_not_an_error() {
        let mut s = session();
        s.start(5).unwrap();
        for raw in ["", "abc", "56abc"] {
            let outcome = s.submit_answer(raw).unwrap();
            assert!(!outcome.answered.correct);
            assert_eq!(outcome.answered.submitted, None);
        }
        assert_eq!(s.incorrect(), 3);
        assert_eq!(s.score(), 0);
        assert_eq!(s.state(), QuizState::Running);
    }

    #[test]
    fn complete_quiz_can_restart() {
        let mut s = session();
        s.start(5).unwrap();
        while !s.is_complete() {
            s.submit_answer("0").unwrap();
        }
        assert_eq!(s.summary().unwrap().incorrect(), 5);

        s.start(10).unwrap();
        assert_eq!(s.state(), QuizState::Running);
        assert_eq!(s.score(), 0);
        assert_eq!(s.incorrect(), 0);
        assert!(s.results().is_empty());
        assert!(s.summary().is_none());
    }

    #[test]
    fn reset_returns_to_idle_from_any_state() {
        let mut s = session();
        s.reset();
        assert_eq!(s.state(), QuizState::Idle);

        s.start(5).unwrap();
        s.submit_answer("1").unwrap();
        s.reset();
        assert_eq!(s.state(), QuizState::Idle);
        assert!(s.current_problem().is_none());
        assert!(s.results().is_empty());
        assert_eq!(s.progress().total, 0);
    }

    #[test]
    fn whole_domain_without_repeats() {
        let generator = GeneratorConfig::symmetric(1, 2, []).unwrap();
        let settings = QuizSettings::new([4], generator, true).unwrap();
        let mut s = QuizSession::with_seed(settings, 9);
        s.start(4).unwrap();
        while !s.is_complete() {
            let answer = answer_for(&s);
            s.submit_answer(&answer).unwrap();
        }
        let keys: HashSet<ProblemKey> = s.results().iter().map(|a| a.problem.key()).collect();
        assert_eq!(keys.len(), 4);
    }

    #[test]
    fn elapsed_on_current_follows_clock() {
        let mut s = session();
        assert_eq!(s.elapsed_on_current(), None);
        s.start(5).unwrap();
        s.clock_mut().advance(Duration::from_millis(1_250));
        assert_eq!(s.elapsed_on_current(), Some(Duration::from_millis(1_250)));
        s.submit_answer("x").unwrap();
        assert_eq!(s.elapsed_on_current(), Some(Duration::ZERO));
    }
}
