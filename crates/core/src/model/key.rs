use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised when building a problem from raw operands.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProblemError {
    #[error("operands must be positive, got {lhs}x{rhs}")]
    ZeroOperand { lhs: u32, rhs: u32 },
}

/// Identity of a multiplication problem: the ordered operand pair.
///
/// `7x8` and `8x7` are distinct keys. The canonical string form is
/// `"{lhs}x{rhs}"` and is what every store persists.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct ProblemKey {
    lhs: u32,
    rhs: u32,
}

impl ProblemKey {
    /// Creates a key from two positive operands.
    ///
    /// # Errors
    ///
    /// Returns `ProblemError::ZeroOperand` if either operand is zero.
    pub fn new(lhs: u32, rhs: u32) -> Result<Self, ProblemError> {
        if lhs == 0 || rhs == 0 {
            return Err(ProblemError::ZeroOperand { lhs, rhs });
        }
        Ok(Self { lhs, rhs })
    }

    #[must_use]
    pub fn lhs(&self) -> u32 {
        self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> u32 {
        self.rhs
    }
}

impl fmt::Debug for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProblemKey({}x{})", self.lhs, self.rhs)
    }
}

impl fmt::Display for ProblemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.lhs, self.rhs)
    }
}

/// Error type for parsing a `ProblemKey` from a string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid problem key: {raw:?}")]
pub struct ParseProblemKeyError {
    raw: String,
}

impl ParseProblemKeyError {
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl FromStr for ProblemKey {
    type Err = ParseProblemKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseProblemKeyError { raw: s.to_string() };
        let (lhs, rhs) = s
            .trim()
            .split_once(['x', 'X', '×'])
            .ok_or_else(err)?;
        let lhs: u32 = lhs.trim().parse().map_err(|_| err())?;
        let rhs: u32 = rhs.trim().parse().map_err(|_| err())?;
        Self::new(lhs, rhs).map_err(|_| err())
    }
}

impl From<ProblemKey> for String {
    fn from(key: ProblemKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for ProblemKey {
    type Error = ParseProblemKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_is_canonical() {
        let key = ProblemKey::new(7, 8).unwrap();
        assert_eq!(key.to_string(), "7x8");
        assert_eq!(format!("{key:?}"), "ProblemKey(7x8)");
    }

    #[test]
    fn key_parses_loose_separators() {
        let expected = ProblemKey::new(7, 8).unwrap();
        assert_eq!("7x8".parse::<ProblemKey>().unwrap(), expected);
        assert_eq!(" 7 x 8 ".parse::<ProblemKey>().unwrap(), expected);
        assert_eq!("7 × 8".parse::<ProblemKey>().unwrap(), expected);
        assert_eq!("7X8".parse::<ProblemKey>().unwrap(), expected);
    }

    #[test]
    fn key_rejects_garbage_and_zero() {
        assert!("".parse::<ProblemKey>().is_err());
        assert!("7*8".parse::<ProblemKey>().is_err());
        assert!("0x8".parse::<ProblemKey>().is_err());
        assert!("-1x8".parse::<ProblemKey>().is_err());
        assert!("7x".parse::<ProblemKey>().is_err());
        let err = "abc".parse::<ProblemKey>().unwrap_err();
        assert_eq!(err.raw(), "abc");
    }

    #[test]
    fn ordered_pairs_are_distinct() {
        let a = ProblemKey::new(3, 4).unwrap();
        let b = ProblemKey::new(4, 3).unwrap();
        assert_ne!(a, b);
        assert_ne!(a.to_string(), b.to_string());
    }

    #[test]
    fn key_serializes_as_string() {
        let key = ProblemKey::new(12, 3).unwrap();
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"12x3\"");
        let back: ProblemKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
