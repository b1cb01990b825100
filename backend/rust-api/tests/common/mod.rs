use axum::Router;
use std::sync::Arc;

use heroquiz_api::{config::Config, create_router, services::AppState};

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        metrics_auth: "admin:test".to_string(),
        cleanup_interval_secs: 3600,
        rate_limit_disabled: false,
    }
}

pub fn create_test_app() -> Router {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::new(test_config()));
    create_router(app_state)
}
