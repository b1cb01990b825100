use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::extractors::AppJson;
use crate::models::rate_limit::{Tier, TierLimitsUpdate};
use crate::services::AppState;

pub async fn list_usage(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.rate_limiter.all_usage()))
}

pub async fn reset_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if state.rate_limiter.reset_user(&user_id) {
        tracing::info!(user_id = %user_id, "Admin reset of rate limit state");
        Ok((StatusCode::NO_CONTENT, ()))
    } else {
        Err((
            StatusCode::NOT_FOUND,
            format!("No rate limit state for user {}", user_id),
        ))
    }
}

pub async fn update_tier_limits(
    State(state): State<Arc<AppState>>,
    Path(tier): Path<String>,
    AppJson(update): AppJson<TierLimitsUpdate>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let tier: Tier = tier
        .parse()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("{}", e)))?;

    update
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    state
        .rate_limiter
        .update_tier_limits(tier, update.into())
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok((StatusCode::NO_CONTENT, ()))
}

pub async fn run_cleanup(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let removed = state.rate_limiter.cleanup();
    (StatusCode::OK, Json(json!({ "removed": removed })))
}
