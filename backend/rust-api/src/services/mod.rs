use std::sync::Arc;

use crate::config::Config;
use crate::utils::clock::{Clock, SystemClock};

pub mod rate_limit;
pub mod score;

use rate_limit::RateLimiter;

/// Shared application state. The rate limiter is the only stateful piece;
/// scoring is a set of pure functions.
pub struct AppState {
    pub config: Config,
    pub rate_limiter: RateLimiter,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            rate_limiter: RateLimiter::new(clock),
        }
    }
}
