use drill_core::model::{
    AchievementLevel, AchievementProgress, PerformanceRecord, Problem, ProblemStat,
};
use serde::{Deserialize, Serialize};
use services::AnswerFeedback;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemResponse {
    pub problem: String,
    pub lhs: u32,
    pub rhs: u32,
}

impl From<Problem> for ProblemResponse {
    fn from(p: Problem) -> Self {
        Self {
            problem: p.key().to_string(),
            lhs: p.lhs(),
            rhs: p.rhs(),
        }
    }
}

/// Answers arrive either as JSON numbers or as the raw text the user typed.
/// Any other JSON value is kept so it can be scored as incorrect.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SubmittedAnswer {
    Number(i64),
    Text(String),
    Other(serde_json::Value),
}

impl SubmittedAnswer {
    /// Text handed to the answer parser. `Other` renders as JSON, which never
    /// parses as an integer.
    #[must_use]
    pub fn as_raw(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::Other(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRequest {
    pub problem: String,
    pub elapsed_time_ms: u64,
    #[serde(default)]
    pub submitted_answer: Option<SubmittedAnswer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub correct: bool,
    pub correct_value: u64,
    pub best_time: Option<u64>,
    pub previous_best_time: Option<u64>,
    pub new_best: bool,
    pub attempts: u32,
    pub incorrect_attempts: u32,
}

impl From<AnswerFeedback> for AnswerResponse {
    fn from(f: AnswerFeedback) -> Self {
        let record = f.attempt.record;
        Self {
            correct: f.correct,
            correct_value: f.correct_value,
            best_time: record.best_time_ms(),
            previous_best_time: record.previous_best_time_ms(),
            new_best: f.attempt.new_best,
            attempts: record.attempts(),
            incorrect_attempts: record.incorrect_attempts(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SortQuery {
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatRow {
    pub problem: String,
    #[serde(flatten)]
    pub record: PerformanceRecord,
}

impl From<ProblemStat> for StatRow {
    fn from(stat: ProblemStat) -> Self {
        Self {
            problem: stat.key.to_string(),
            record: stat.record,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementResponse {
    pub level: AchievementLevel,
    pub title: &'static str,
    pub description: &'static str,
    pub average_best_time_ms: f64,
    pub next_level: Option<AchievementLevel>,
    pub next_level_max_time_ms: Option<u64>,
}

impl From<AchievementProgress> for AchievementResponse {
    fn from(p: AchievementProgress) -> Self {
        Self {
            level: p.level,
            title: p.level.title(),
            description: p.level.description(),
            average_best_time_ms: p.average_best_time_ms,
            next_level: p.next_level,
            next_level_max_time_ms: p.next_level.map(AchievementLevel::max_time_ms),
        }
    }
}
