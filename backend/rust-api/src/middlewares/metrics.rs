use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::metrics::{HTTP_REQUESTS_TOTAL, HTTP_REQUEST_DURATION_SECONDS};

/// Records request count and latency for every response.
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().to_string();
    let path = normalize_path(req.uri().path());

    let response = next.run(req).await;

    let duration = start.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    HTTP_REQUESTS_TOTAL
        .with_label_values(&[&method, &path, &status])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[&method, &path])
        .observe(duration);

    response
}

/// Replace dynamic path segments (scores, user ids) with placeholders to
/// keep metric cardinality bounded.
fn normalize_path(path: &str) -> String {
    let mut normalized = Vec::new();
    let mut segments = path.split('/').peekable();

    while let Some(segment) = segments.next() {
        if is_numeric_id(segment) {
            normalized.push("{id}");
        } else if segment == "users" && segments.peek().is_some_and(|next| !next.is_empty()) {
            normalized.push(segment);
            segments.next();
            normalized.push("{id}");
        } else {
            normalized.push(segment);
        }
    }

    normalized.join("/")
}

fn is_numeric_id(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_score_and_user_segments() {
        assert_eq!(
            normalize_path("/api/v1/scores/rank/4200"),
            "/api/v1/scores/rank/{id}"
        );
        assert_eq!(
            normalize_path("/admin/rate-limit/users/player-7"),
            "/admin/rate-limit/users/{id}"
        );
        assert_eq!(normalize_path("/health"), "/health");
        assert_eq!(normalize_path("/admin/rate-limit/users"), "/admin/rate-limit/users");
    }
}
