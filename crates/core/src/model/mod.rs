mod achievement;
mod key;
mod performance;
mod problem;
mod session;
mod settings;
pub mod stats;

pub use achievement::{AchievementLevel, AchievementProgress};
pub use key::{ParseProblemKeyError, ProblemError, ProblemKey};
pub use performance::{PerformanceRecord, PerformanceRecordError};
pub use problem::{Problem, parse_answer};
pub use session::{AnsweredQuestion, QuizSummary, QuizSummaryError};
pub use settings::{DEFAULT_QUESTION_CHOICES, QuizSettings, QuizSettingsError};
pub use stats::{ProblemStat, SortDirection, StatsSortKey, sort_stats, sorted_stats};
