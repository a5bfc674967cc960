use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use drill_core::model::{PerformanceRecord, ProblemKey, SortDirection, StatsSortKey};

use crate::AppState;
use crate::dto::{AchievementResponse, SortQuery, StatRow};
use crate::error::{AppError, Result};

pub async fn all_stats(
    State(state): State<AppState>,
) -> Result<Json<BTreeMap<ProblemKey, PerformanceRecord>>> {
    let stats = state.performance.stats().await?;
    Ok(Json(stats.into_iter().collect()))
}

pub async fn sorted_stats(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> Result<Json<Vec<StatRow>>> {
    let key = query
        .sort
        .as_deref()
        .map(str::parse::<StatsSortKey>)
        .transpose()
        .map_err(AppError::BadRequest)?
        .unwrap_or_default();
    let direction = query
        .direction
        .as_deref()
        .map(str::parse::<SortDirection>)
        .transpose()
        .map_err(AppError::BadRequest)?
        .unwrap_or_default();

    let rows = state.performance.sorted_stats(key, direction).await?;
    Ok(Json(rows.into_iter().map(StatRow::from).collect()))
}

pub async fn achievement(State(state): State<AppState>) -> Result<Json<AchievementResponse>> {
    let progress = state
        .performance
        .achievement()
        .await?
        .ok_or_else(|| AppError::NotFound("no best times recorded yet".to_string()))?;
    Ok(Json(progress.into()))
}

pub async fn reset_stats(State(state): State<AppState>) -> Result<StatusCode> {
    state.performance.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
