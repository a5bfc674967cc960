use std::collections::HashMap;

use serde::Serialize;

use super::{PerformanceRecord, ProblemKey};

/// Speed tier earned from the average best time across problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AchievementLevel {
    Beginner,
    Improving,
    Advanced,
    Expert,
    Genius,
}

impl AchievementLevel {
    pub const ALL: [AchievementLevel; 5] = [
        Self::Beginner,
        Self::Improving,
        Self::Advanced,
        Self::Expert,
        Self::Genius,
    ];

    /// Average best time (ms) at or below which the level is reached.
    #[must_use]
    pub fn max_time_ms(self) -> u64 {
        match self {
            Self::Beginner => 8_000,
            Self::Improving => 6_000,
            Self::Advanced => 4_500,
            Self::Expert => 3_000,
            Self::Genius => 2_500,
        }
    }

    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Improving => "Improving",
            Self::Advanced => "Advanced",
            Self::Expert => "Expert",
            Self::Genius => "Genius",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Self::Beginner => "Just getting started!",
            Self::Improving => "Making good progress",
            Self::Advanced => "Becoming a pro!",
            Self::Expert => "Multiplication master!",
            Self::Genius => "Incredible speed!",
        }
    }

    /// Fastest level whose threshold the average meets; `Beginner` otherwise.
    #[must_use]
    pub fn for_average_ms(average_ms: f64) -> Self {
        Self::ALL
            .iter()
            .rev()
            .copied()
            .find(|level| average_ms <= level.max_time_ms() as f64)
            .unwrap_or(Self::Beginner)
    }

    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Beginner => Some(Self::Improving),
            Self::Improving => Some(Self::Advanced),
            Self::Advanced => Some(Self::Expert),
            Self::Expert => Some(Self::Genius),
            Self::Genius => None,
        }
    }
}

/// Current level plus the average it was computed from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AchievementProgress {
    pub level: AchievementLevel,
    pub average_best_time_ms: f64,
    pub next_level: Option<AchievementLevel>,
}

impl AchievementProgress {
    /// Computes progress over every record with a best time.
    ///
    /// Returns `None` when no problem has a recorded time yet.
    #[must_use]
    pub fn from_records(records: &HashMap<ProblemKey, PerformanceRecord>) -> Option<Self> {
        let times: Vec<u64> = records
            .values()
            .filter_map(PerformanceRecord::best_time_ms)
            .collect();
        if times.is_empty() {
            return None;
        }
        let average = times.iter().sum::<u64>() as f64 / times.len() as f64;
        let level = AchievementLevel::for_average_ms(average);
        Some(Self {
            level,
            average_best_time_ms: average,
            next_level: level.next(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(AchievementLevel::for_average_ms(12_000.0), AchievementLevel::Beginner);
        assert_eq!(AchievementLevel::for_average_ms(8_000.0), AchievementLevel::Beginner);
        assert_eq!(AchievementLevel::for_average_ms(5_500.0), AchievementLevel::Improving);
        assert_eq!(AchievementLevel::for_average_ms(4_500.0), AchievementLevel::Advanced);
        assert_eq!(AchievementLevel::for_average_ms(2_900.0), AchievementLevel::Expert);
        assert_eq!(AchievementLevel::for_average_ms(1_000.0), AchievementLevel::Genius);
    }

    #[test]
    fn progress_averages_best_times() {
        let mut records = HashMap::new();
        records.insert(
            ProblemKey::new(2, 3).unwrap(),
            PerformanceRecord::first_attempt(2_000, true),
        );
        records.insert(
            ProblemKey::new(3, 2).unwrap(),
            PerformanceRecord::first_attempt(4_000, true),
        );
        records.insert(
            ProblemKey::new(4, 4).unwrap(),
            PerformanceRecord::first_attempt(0, true),
        );
        let progress = AchievementProgress::from_records(&records).unwrap();
        assert!((progress.average_best_time_ms - 3_000.0).abs() < f64::EPSILON);
        assert_eq!(progress.level, AchievementLevel::Expert);
        assert_eq!(progress.next_level, Some(AchievementLevel::Genius));
    }

    #[test]
    fn no_times_no_progress() {
        assert!(AchievementProgress::from_records(&HashMap::new()).is_none());
    }
}
