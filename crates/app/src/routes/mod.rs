pub mod answer;
pub mod health;
pub mod problem;
pub mod stats;
