use axum::{
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::middlewares::rate_limit::extract_identity;
use crate::services::AppState;

/// Current quota usage for the calling user. Read-only; never consumes
/// quota, so it sits outside the rate-limited scope.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, Response> {
    let (user_id, tier) = extract_identity(&headers)?;
    let usage = state.rate_limiter.user_usage(&user_id, tier);
    Ok(Json(usage))
}
