use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, register_int_gauge, Encoder, HistogramVec,
    IntCounterVec, IntGauge, TextEncoder,
};

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // Scoring Metrics
    pub static ref QUESTIONS_SCORED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "questions_scored_total",
        "Total number of questions scored",
        &["correct"]
    )
    .unwrap();

    pub static ref GAMES_SCORED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "games_scored_total",
        "Total number of completed games scored",
        &["difficulty"]
    )
    .unwrap();

    pub static ref ACHIEVEMENTS_AWARDED_TOTAL: IntCounterVec = register_int_counter_vec!(
        "achievements_awarded_total",
        "Total number of achievements awarded",
        &["id"]
    )
    .unwrap();

    // Rate Limiter Metrics
    pub static ref RATE_LIMIT_DECISIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "rate_limit_decisions_total",
        "Total number of rate limit decisions",
        &["tier", "allowed"]
    )
    .unwrap();

    pub static ref RATE_LIMIT_TRACKED_USERS: IntGauge = register_int_gauge!(
        "rate_limit_tracked_users",
        "Number of users with live rate limit state"
    )
    .unwrap();
}

/// Render all registered metrics in the Prometheus text format.
pub fn render_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_question_scored(correct: bool) {
    let label = if correct { "true" } else { "false" };
    QUESTIONS_SCORED_TOTAL.with_label_values(&[label]).inc();
}

pub fn record_game_scored(difficulty: &str) {
    GAMES_SCORED_TOTAL.with_label_values(&[difficulty]).inc();
}

pub fn record_achievement(id: &str) {
    ACHIEVEMENTS_AWARDED_TOTAL.with_label_values(&[id]).inc();
}

pub fn record_rate_limit_decision(tier: &str, allowed: bool) {
    let label = if allowed { "true" } else { "false" };
    RATE_LIMIT_DECISIONS_TOTAL
        .with_label_values(&[tier, label])
        .inc();
}
