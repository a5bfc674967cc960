use thiserror::Error;

use crate::generator::GeneratorConfig;

/// Question counts offered when starting a quiz.
pub const DEFAULT_QUESTION_CHOICES: [u32; 6] = [5, 10, 15, 20, 50, 100];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuizSettingsError {
    #[error("at least one question count choice is required")]
    NoChoices,

    #[error("question count choices must be > 0")]
    ZeroChoice,

    #[error("question count {count} exceeds the {domain} distinct problems available")]
    ChoiceExceedsDomain { count: u32, domain: usize },
}

/// Configuration for quiz sessions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizSettings {
    question_choices: Vec<u32>,
    generator: GeneratorConfig,
    no_repeat: bool,
}

impl QuizSettings {
    /// Creates validated quiz settings.
    ///
    /// Choices are sorted and de-duplicated. With `no_repeat`, every choice must
    /// fit in the generator domain so a session can always draw a fresh key.
    ///
    /// # Errors
    ///
    /// Returns `QuizSettingsError` for an empty, zero, or oversized choice.
    pub fn new(
        question_choices: impl IntoIterator<Item = u32>,
        generator: GeneratorConfig,
        no_repeat: bool,
    ) -> Result<Self, QuizSettingsError> {
        let mut choices: Vec<u32> = question_choices.into_iter().collect();
        choices.sort_unstable();
        choices.dedup();

        if choices.is_empty() {
            return Err(QuizSettingsError::NoChoices);
        }
        if choices.contains(&0) {
            return Err(QuizSettingsError::ZeroChoice);
        }
        if no_repeat {
            let domain = generator.domain_size();
            if let Some(&count) = choices
                .iter()
                .find(|c| usize::try_from(**c).map_or(true, |c| c > domain))
            {
                return Err(QuizSettingsError::ChoiceExceedsDomain { count, domain });
            }
        }

        Ok(Self {
            question_choices: choices,
            generator,
            no_repeat,
        })
    }

    #[must_use]
    pub fn question_choices(&self) -> &[u32] {
        &self.question_choices
    }

    #[must_use]
    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }

    #[must_use]
    pub fn no_repeat(&self) -> bool {
        self.no_repeat
    }

    #[must_use]
    pub fn allows(&self, count: u32) -> bool {
        self.question_choices.contains(&count)
    }
}

impl Default for QuizSettings {
    /// 1–12 tables, the standard count choices, no repeats within a session.
    fn default() -> Self {
        Self {
            question_choices: DEFAULT_QUESTION_CHOICES.to_vec(),
            generator: GeneratorConfig::standard(),
            no_repeat: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_offer_standard_choices() {
        let settings = QuizSettings::default();
        assert_eq!(settings.question_choices(), &[5, 10, 15, 20, 50, 100]);
        assert!(settings.allows(20));
        assert!(!settings.allows(0));
        assert!(!settings.allows(7));
        assert!(settings.no_repeat());
    }

    #[test]
    fn choices_are_sorted_and_deduped() {
        let settings =
            QuizSettings::new([20, 5, 20, 10], GeneratorConfig::standard(), true).unwrap();
        assert_eq!(settings.question_choices(), &[5, 10, 20]);
    }

    #[test]
    fn invalid_choices_are_rejected() {
        assert_eq!(
            QuizSettings::new([], GeneratorConfig::standard(), false),
            Err(QuizSettingsError::NoChoices)
        );
        assert_eq!(
            QuizSettings::new([0, 5], GeneratorConfig::standard(), false),
            Err(QuizSettingsError::ZeroChoice)
        );
    }

    #[test]
    fn no_repeat_choices_must_fit_domain() {
        let small = GeneratorConfig::symmetric(2, 3, []).unwrap();
        assert_eq!(
            QuizSettings::new([5], small.clone(), true),
            Err(QuizSettingsError::ChoiceExceedsDomain { count: 5, domain: 4 })
        );
        assert!(QuizSettings::new([5], small, false).is_ok());
    }
}
