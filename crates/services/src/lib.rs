#![forbid(unsafe_code)]

pub mod error;
pub mod performance_service;
pub mod quiz;

pub use drill_core::Clock;

pub use error::QuizError;
pub use performance_service::{AnswerFeedback, PerformanceService, RecordedAttempt};
pub use quiz::{
    QuizAnswerResult, QuizLoopService, QuizProgress, QuizSession, QuizState, SubmitOutcome,
};
