use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;

use crate::metrics::record_rate_limit_decision;
use crate::models::rate_limit::Tier;
use crate::services::AppState;

const USER_ID_HEADER: &str = "x-user-id";
const TIER_HEADER: &str = "x-user-tier";

/// Identity arrives via trusted gateway headers; the tier string must match
/// the closed enum, anything else is a client error.
pub(crate) fn extract_identity(headers: &HeaderMap) -> Result<(String, Tier), Response> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| bad_request(format!("Missing {} header", USER_ID_HEADER)))?
        .to_string();

    let tier_raw = headers
        .get(TIER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .ok_or_else(|| bad_request(format!("Missing {} header", TIER_HEADER)))?;

    let tier: Tier = tier_raw.parse().map_err(|e| {
        tracing::warn!("Rejected request with unknown tier: {}", tier_raw);
        bad_request(format!("{}", e))
    })?;

    Ok((user_id, tier))
}

fn bad_request(message: String) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": message, "status": 400 })),
    )
        .into_response()
}

fn apply_rate_limit_headers(response: &mut Response, headers: Vec<(&'static str, String)>) {
    for (name, value) in headers {
        if let Ok(value) = HeaderValue::from_str(&value) {
            response
                .headers_mut()
                .insert(HeaderName::from_static(name), value);
        }
    }
}

/// Quota denial is a normal state, surfaced as 429 with the reset time so
/// the client knows when to retry.
fn quota_denied(state: &AppState, user_id: &str, tier: Tier, message: &str) -> Response {
    let usage = state.rate_limiter.user_usage(user_id, tier);
    let retry_after_secs = state.rate_limiter.retry_after_secs(user_id, tier);

    let mut response = (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({
            "message": message,
            "status": 429,
            "tier": tier,
            "reset_at": usage.reset_at,
        })),
    )
        .into_response();

    if let Ok(value) = HeaderValue::from_str(&retry_after_secs.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("retry-after"), value);
    }
    apply_rate_limit_headers(
        &mut response,
        state.rate_limiter.rate_limit_headers(user_id, tier),
    );
    response
}

/// Gate for the scoring endpoints: atomic check-and-increment per request,
/// layered under a coarser burst guard. Allowed responses carry the
/// X-RateLimit-* headers.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    if state.config.rate_limit_disabled {
        tracing::debug!("Rate limiting disabled via RATE_LIMIT_DISABLED=1");
        return Ok(next.run(request).await);
    }

    let (user_id, tier) = extract_identity(request.headers())?;

    if !state.rate_limiter.check_burst_limit(&user_id, tier) {
        record_rate_limit_decision(tier.as_str(), false);
        tracing::warn!(user_id = %user_id, tier = %tier, "Burst limit exceeded");
        return Err(quota_denied(&state, &user_id, tier, "Burst limit exceeded"));
    }

    let decision = state.rate_limiter.try_acquire(&user_id, tier, 1);
    record_rate_limit_decision(tier.as_str(), decision.allowed);

    if !decision.allowed {
        tracing::warn!(user_id = %user_id, tier = %tier, "Rate limit exceeded");
        return Err(quota_denied(&state, &user_id, tier, "Rate limit exceeded"));
    }

    let mut response = next.run(request).await;
    apply_rate_limit_headers(
        &mut response,
        state.rate_limiter.rate_limit_headers(&user_id, tier),
    );
    Ok(response)
}
