/// Aggregated view of quiz progress, useful for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizProgress {
    pub total: u32,
    pub answered: u32,
    pub remaining: u32,
    pub is_complete: bool,
}
