#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'; connect-src 'self'"),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The quiz UI is served from another origin
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no identity required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler).layer(middleware::from_fn_with_state(
                app_state.clone(),
                handlers::metrics_auth_middleware,
            )),
        )
        // Scoring endpoints, gated by the per-user rate limiter
        .nest(
            "/api/v1/scores",
            scores_routes()
                .layer(cors)
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::rate_limit::rate_limit_middleware,
                )),
        )
        // Read-only quota introspection for the calling user
        .route("/api/v1/usage", get(handlers::usage::get_usage))
        .nest(
            "/admin",
            admin_routes().route_layer(middleware::from_fn(
                middlewares::admin::admin_guard_middleware,
            )),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn scores_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/question", post(handlers::scores::score_question))
        .route("/final", post(handlers::scores::score_final))
        .route("/summary", post(handlers::scores::score_summary))
        .route("/rank/{score}", get(handlers::scores::get_rank))
}

fn admin_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/rate-limit/users", get(handlers::admin::list_usage))
        .route(
            "/rate-limit/users/{user_id}",
            delete(handlers::admin::reset_user),
        )
        .route(
            "/rate-limit/tiers/{tier}",
            put(handlers::admin::update_tier_limits),
        )
        .route("/rate-limit/cleanup", post(handlers::admin::run_cleanup))
}
