use thiserror::Error;

use crate::generator::GeneratorError;
use crate::model::{
    ParseProblemKeyError, PerformanceRecordError, ProblemError, QuizSettingsError,
    QuizSummaryError,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Problem(#[from] ProblemError),
    #[error(transparent)]
    ParseKey(#[from] ParseProblemKeyError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error(transparent)]
    Settings(#[from] QuizSettingsError),
    #[error(transparent)]
    Record(#[from] PerformanceRecordError),
    #[error(transparent)]
    Summary(#[from] QuizSummaryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProblemKey;

    fn parse_key(raw: &str) -> Result<ProblemKey, Error> {
        Ok(raw.parse::<ProblemKey>()?)
    }

    #[test]
    fn layer_errors_convert() {
        assert!(matches!(parse_key("7y8"), Err(Error::ParseKey(_))));
        let err: Error = ProblemKey::new(0, 3).unwrap_err().into();
        assert_eq!(err.to_string(), "operands must be positive, got 0x3");
    }
}
