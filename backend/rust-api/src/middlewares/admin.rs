use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};

use crate::models::rate_limit::Tier;

/// Guard for /admin routes: the upstream gateway marks admins with the
/// x-user-tier header; everyone else gets 403.
pub async fn admin_guard_middleware(request: Request, next: Next) -> Result<Response, StatusCode> {
    let tier = request
        .headers()
        .get("x-user-tier")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<Tier>().ok());

    match tier {
        Some(Tier::Admin) => Ok(next.run(request).await),
        _ => {
            tracing::warn!("Blocked non-admin access to admin route");
            Err(StatusCode::FORBIDDEN)
        }
    }
}
