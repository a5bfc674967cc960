use axum::{Json, extract::State};

use crate::AppState;
use crate::dto::ProblemResponse;
use crate::error::Result;

pub async fn next_problem(State(state): State<AppState>) -> Result<Json<ProblemResponse>> {
    let problem = state.performance.next_problem(&mut rand::rng())?;
    Ok(Json(problem.into()))
}
