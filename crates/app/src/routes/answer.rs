use axum::{Json, extract::State};
use drill_core::model::{ParseProblemKeyError, ProblemKey};

use crate::AppState;
use crate::dto::{AnswerRequest, AnswerResponse};
use crate::error::{AppError, Result};

pub async fn submit_answer(
    State(state): State<AppState>,
    Json(payload): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>> {
    let key: ProblemKey = payload
        .problem
        .parse()
        .map_err(|e: ParseProblemKeyError| AppError::BadRequest(e.to_string()))?;
    let raw = payload
        .submitted_answer
        .as_ref()
        .map(|a| a.as_raw())
        .unwrap_or_default();

    let feedback = state
        .performance
        .check_answer(key, payload.elapsed_time_ms, &raw)
        .await?;
    Ok(Json(feedback.into()))
}
