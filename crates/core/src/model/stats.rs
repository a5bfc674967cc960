use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{PerformanceRecord, ProblemKey};

/// A problem key paired with its record, for ordered views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProblemStat {
    pub key: ProblemKey,
    pub record: PerformanceRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatsSortKey {
    Problem,
    BestTime,
    #[default]
    Attempts,
    IncorrectAttempts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for StatsSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "problem" => Ok(Self::Problem),
            "bestTime" | "best_time" | "best-time" => Ok(Self::BestTime),
            "attempts" => Ok(Self::Attempts),
            "incorrectAttempts" | "incorrect_attempts" | "incorrect" => {
                Ok(Self::IncorrectAttempts)
            }
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction: {other}")),
        }
    }
}

fn compare(a: &ProblemStat, b: &ProblemStat, key: StatsSortKey) -> Ordering {
    match key {
        StatsSortKey::Problem => a.key.cmp(&b.key),
        // unset best times order before any recorded time
        StatsSortKey::BestTime => a.record.best_time_ms().cmp(&b.record.best_time_ms()),
        StatsSortKey::Attempts => a.record.attempts().cmp(&b.record.attempts()),
        StatsSortKey::IncorrectAttempts => a
            .record
            .incorrect_attempts()
            .cmp(&b.record.incorrect_attempts()),
    }
}

/// Sort in place. Stable: equal entries keep their prior relative order in
/// both directions.
pub fn sort_stats(stats: &mut [ProblemStat], key: StatsSortKey, direction: SortDirection) {
    stats.sort_by(|a, b| {
        let ord = compare(a, b, key);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// Flatten a store snapshot into a list ordered by `key`/`direction`.
///
/// Entries are first put in problem order so ties come out deterministic.
#[must_use]
pub fn sorted_stats(
    snapshot: &HashMap<ProblemKey, PerformanceRecord>,
    key: StatsSortKey,
    direction: SortDirection,
) -> Vec<ProblemStat> {
    let mut stats: Vec<ProblemStat> = snapshot
        .iter()
        .map(|(key, record)| ProblemStat {
            key: *key,
            record: *record,
        })
        .collect();
    stats.sort_by_key(|s| s.key);
    sort_stats(&mut stats, key, direction);
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(lhs: u32, rhs: u32, best: Option<u64>, attempts: u32, incorrect: u32) -> ProblemStat {
        ProblemStat {
            key: ProblemKey::new(lhs, rhs).unwrap(),
            record: PerformanceRecord::from_persisted(best, None, attempts, incorrect).unwrap(),
        }
    }

    #[test]
    fn sorts_by_attempts_desc_stably() {
        let mut stats = vec![
            stat(2, 2, Some(900), 3, 0),
            stat(3, 3, Some(800), 5, 1),
            stat(4, 4, Some(700), 3, 2),
        ];
        sort_stats(&mut stats, StatsSortKey::Attempts, SortDirection::Desc);
        let keys: Vec<String> = stats.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["3x3", "2x2", "4x4"]);
    }

    #[test]
    fn ascending_ties_keep_order() {
        let mut stats = vec![
            stat(5, 1, Some(1_000), 2, 0),
            stat(1, 5, Some(1_000), 2, 0),
            stat(2, 2, Some(500), 2, 0),
        ];
        sort_stats(&mut stats, StatsSortKey::BestTime, SortDirection::Asc);
        let keys: Vec<String> = stats.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["2x2", "5x1", "1x5"]);
    }

    #[test]
    fn unset_best_time_sorts_first_ascending() {
        let mut stats = vec![stat(2, 2, Some(500), 1, 0), stat(3, 3, Some(0), 1, 0)];
        sort_stats(&mut stats, StatsSortKey::BestTime, SortDirection::Asc);
        assert_eq!(stats[0].key.to_string(), "3x3");
    }

    #[test]
    fn snapshot_view_is_deterministic() {
        let mut snapshot = HashMap::new();
        for (l, r) in [(9, 9), (1, 2), (4, 4)] {
            snapshot.insert(
                ProblemKey::new(l, r).unwrap(),
                PerformanceRecord::first_attempt(1_000, true),
            );
        }
        let view = sorted_stats(&snapshot, StatsSortKey::Attempts, SortDirection::Desc);
        let keys: Vec<String> = view.iter().map(|s| s.key.to_string()).collect();
        assert_eq!(keys, vec!["1x2", "4x4", "9x9"]);
    }

    #[test]
    fn parses_query_values() {
        assert_eq!("bestTime".parse::<StatsSortKey>(), Ok(StatsSortKey::BestTime));
        assert_eq!("incorrect".parse::<StatsSortKey>(), Ok(StatsSortKey::IncorrectAttempts));
        assert_eq!("asc".parse::<SortDirection>(), Ok(SortDirection::Asc));
        assert!("sideways".parse::<SortDirection>().is_err());
    }
}
