#![forbid(unsafe_code)]

pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod terminal;

use axum::{
    Router,
    routing::{get, post},
};
use services::{PerformanceService, QuizLoopService};
use storage::repository::Storage;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub performance: PerformanceService,
}

impl AppState {
    #[must_use]
    pub fn new(storage: &Storage, generator: drill_core::GeneratorConfig) -> Self {
        Self {
            performance: PerformanceService::new(storage.performance.clone(), generator),
        }
    }

    #[must_use]
    pub fn quiz_loop(&self) -> QuizLoopService {
        QuizLoopService::new(self.performance.clone())
    }
}

/// HTTP surface over the performance service.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/problem", get(routes::problem::next_problem))
        .route("/answer", post(routes::answer::submit_answer))
        .route("/stats", get(routes::stats::all_stats))
        .route("/stats/sorted", get(routes::stats::sorted_stats))
        .route("/stats/achievement", get(routes::stats::achievement))
        .route("/stats/reset", post(routes::stats::reset_stats))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
