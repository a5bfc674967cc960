use super::key::{ProblemError, ProblemKey};

/// A single multiplication question.
///
/// Immutable; a fresh value is created for every question presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Problem {
    key: ProblemKey,
}

impl Problem {
    /// Creates a problem from two positive operands.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::ZeroOperand` if either operand is zero.
    pub fn new(lhs: u32, rhs: u32) -> Result<Self, ProblemError> {
        Ok(Self {
            key: ProblemKey::new(lhs, rhs)?,
        })
    }

    #[must_use]
    pub fn key(&self) -> ProblemKey {
        self.key
    }

    #[must_use]
    pub fn lhs(&self) -> u32 {
        self.key.lhs()
    }

    #[must_use]
    pub fn rhs(&self) -> u32 {
        self.key.rhs()
    }

    /// The correct product.
    #[must_use]
    pub fn answer(&self) -> u64 {
        u64::from(self.lhs()) * u64::from(self.rhs())
    }

    /// Checks a parsed answer against the product.
    #[must_use]
    pub fn is_correct(&self, submitted: Option<i64>) -> bool {
        submitted
            .and_then(|v| u64::try_from(v).ok())
            .is_some_and(|v| v == self.answer())
    }
}

impl From<ProblemKey> for Problem {
    fn from(key: ProblemKey) -> Self {
        Self { key }
    }
}

/// Parses raw user input as an integer answer.
///
/// Empty, non-numeric and out-of-range input yields `None`; callers score it
/// as an incorrect answer.
#[must_use]
pub fn parse_answer(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}
