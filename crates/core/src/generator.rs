//! Random multiplication problem generation.

use std::collections::{BTreeSet, HashSet};

use rand::Rng;
use thiserror::Error;

use crate::model::{Problem, ProblemKey};

/// Largest operand the generator accepts.
pub const MAX_OPERAND: u32 = 10_000;

/// Default bound on re-draws when avoiding already used keys.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10_000;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GeneratorError {
    #[error("invalid operand range {min}..={max}: {reason}")]
    InvalidRange {
        min: u32,
        max: u32,
        reason: &'static str,
    },

    #[error("no unused problem found after {attempts} draws")]
    Exhausted { attempts: u32 },
}

/// Inclusive operand range with optional excluded values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandRange {
    min: u32,
    max: u32,
    excluded: BTreeSet<u32>,
    allowed: Vec<u32>,
}

impl OperandRange {
    /// Creates a validated range.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidRange` if the range is empty, starts at
    /// zero, exceeds `MAX_OPERAND`, or every value is excluded.
    pub fn new(
        min: u32,
        max: u32,
        excluded: impl IntoIterator<Item = u32>,
    ) -> Result<Self, GeneratorError> {
        let invalid = |reason| GeneratorError::InvalidRange { min, max, reason };
        if min == 0 {
            return Err(invalid("operands must be positive"));
        }
        if min > max {
            return Err(invalid("min must be <= max"));
        }
        if max > MAX_OPERAND {
            return Err(invalid("max exceeds the supported operand limit"));
        }

        let excluded: BTreeSet<u32> = excluded.into_iter().collect();
        let allowed: Vec<u32> = (min..=max).filter(|v| !excluded.contains(v)).collect();
        if allowed.is_empty() {
            return Err(invalid("every value in the range is excluded"));
        }

        Ok(Self {
            min,
            max,
            excluded,
            allowed,
        })
    }

    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }

    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<u32> {
        &self.excluded
    }

    /// Values that can actually be drawn, ascending.
    #[must_use]
    pub fn allowed(&self) -> &[u32] {
        &self.allowed
    }

    #[must_use]
    pub fn contains(&self, value: u32) -> bool {
        (self.min..=self.max).contains(&value) && !self.excluded.contains(&value)
    }

    fn draw<R: Rng>(&self, rng: &mut R) -> u32 {
        self.allowed[rng.random_range(0..self.allowed.len())]
    }
}

/// Operand ranges for both sides of the product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    lhs: OperandRange,
    rhs: OperandRange,
    max_attempts: u32,
}

impl GeneratorConfig {
    /// Same range and exclusions for both operands.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::InvalidRange` for an unusable range.
    pub fn symmetric(
        min: u32,
        max: u32,
        excluded: impl IntoIterator<Item = u32>,
    ) -> Result<Self, GeneratorError> {
        let range = OperandRange::new(min, max, excluded)?;
        Ok(Self::new(range.clone(), range))
    }

    #[must_use]
    pub fn new(lhs: OperandRange, rhs: OperandRange) -> Self {
        Self {
            lhs,
            rhs,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Times tables 1 through 12.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(Self::fixed_range(1, 12, &[]), Self::fixed_range(1, 12, &[]))
    }

    /// Times tables 2 through 12, skipping the trivial ones.
    #[must_use]
    pub fn from_two() -> Self {
        Self::new(Self::fixed_range(2, 12, &[]), Self::fixed_range(2, 12, &[]))
    }

    /// Times tables 1 through 12 without the tens.
    #[must_use]
    pub fn without_tens() -> Self {
        Self::new(
            Self::fixed_range(1, 12, &[10]),
            Self::fixed_range(1, 12, &[10]),
        )
    }

    fn fixed_range(min: u32, max: u32, excluded: &[u32]) -> OperandRange {
        let excluded: BTreeSet<u32> = excluded.iter().copied().collect();
        let allowed = (min..=max).filter(|v| !excluded.contains(v)).collect();
        OperandRange {
            min,
            max,
            excluded,
            allowed,
        }
    }

    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    #[must_use]
    pub fn lhs(&self) -> &OperandRange {
        &self.lhs
    }

    #[must_use]
    pub fn rhs(&self) -> &OperandRange {
        &self.rhs
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Number of distinct problem keys this configuration can produce.
    #[must_use]
    pub fn domain_size(&self) -> usize {
        self.lhs.allowed().len() * self.rhs.allowed().len()
    }

    /// Whether the key can be produced by this configuration.
    #[must_use]
    pub fn contains(&self, key: ProblemKey) -> bool {
        self.lhs.contains(key.lhs()) && self.rhs.contains(key.rhs())
    }

    /// Every key in the domain, ordered by left then right operand.
    #[must_use]
    pub fn all_keys(&self) -> Vec<ProblemKey> {
        let mut keys = Vec::with_capacity(self.domain_size());
        for &lhs in self.lhs.allowed() {
            for &rhs in self.rhs.allowed() {
                if let Ok(key) = ProblemKey::new(lhs, rhs) {
                    keys.push(key);
                }
            }
        }
        keys
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Draws random problems from a `GeneratorConfig`.
///
/// Holds no random state; the caller supplies the `Rng` so sequences are
/// reproducible with a seeded generator.
#[derive(Debug, Clone, Default)]
pub struct ProblemGenerator {
    config: GeneratorConfig,
}

impl ProblemGenerator {
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Draw a problem whose key is not in `exclude`.
    ///
    /// Re-draws at most `max_attempts` times.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorError::Exhausted` if the exclusion set covers the
    /// whole domain or the attempt bound is hit.
    pub fn generate<R: Rng>(
        &self,
        rng: &mut R,
        exclude: &HashSet<ProblemKey>,
    ) -> Result<Problem, GeneratorError> {
        if !exclude.is_empty() {
            let blocked = exclude.iter().filter(|k| self.config.contains(**k)).count();
            if blocked >= self.config.domain_size() {
                return Err(GeneratorError::Exhausted { attempts: 0 });
            }
        }

        let attempts = self.config.max_attempts;
        for _ in 0..attempts {
            let lhs = self.config.lhs.draw(rng);
            let rhs = self.config.rhs.draw(rng);
            let Ok(problem) = Problem::new(lhs, rhs) else {
                continue;
            };
            if !exclude.contains(&problem.key()) {
                return Ok(problem);
            }
        }

        Err(GeneratorError::Exhausted { attempts })
    }
}
