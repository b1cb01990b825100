use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::rate_limit::RateLimitError;

/// Subscription tier. A closed set; anything else is rejected at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Corporate,
    Enterprise,
    Admin,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Free, Tier::Corporate, Tier::Enterprise, Tier::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Corporate => "corporate",
            Tier::Enterprise => "enterprise",
            Tier::Admin => "admin",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = RateLimitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "corporate" => Ok(Tier::Corporate),
            "enterprise" => Ok(Tier::Enterprise),
            "admin" => Ok(Tier::Admin),
            other => Err(RateLimitError::UnknownTier(other.to_string())),
        }
    }
}

/// Static quota configuration for one tier.
///
/// `requests_per_hour = None` means unlimited (admin). Mutated only through
/// the explicit admin update endpoint.
#[derive(Debug, Clone)]
pub struct TierLimits {
    pub requests_per_hour: Option<u32>,
    pub requests_per_day: u32,
    pub burst_limit: u32,
    pub reset_window: Duration,
}

impl TierLimits {
    pub fn default_for(tier: Tier) -> Self {
        match tier {
            Tier::Free => Self {
                requests_per_hour: Some(10),
                requests_per_day: 50,
                burst_limit: 3,
                reset_window: Duration::hours(1),
            },
            Tier::Corporate => Self {
                requests_per_hour: Some(100),
                requests_per_day: 500,
                burst_limit: 10,
                reset_window: Duration::hours(1),
            },
            Tier::Enterprise => Self {
                requests_per_hour: Some(1000),
                requests_per_day: 5000,
                burst_limit: 25,
                reset_window: Duration::hours(1),
            },
            Tier::Admin => Self {
                requests_per_hour: None,
                requests_per_day: u32::MAX,
                burst_limit: u32::MAX,
                reset_window: Duration::hours(1),
            },
        }
    }
}

/// Admin request body for updating a tier's limits.
#[derive(Debug, Deserialize, Validate)]
pub struct TierLimitsUpdate {
    #[validate(range(min = 1))]
    pub requests_per_hour: u32,
    #[validate(range(min = 1))]
    pub requests_per_day: u32,
    #[validate(range(min = 1))]
    pub burst_limit: u32,
    #[validate(range(min = 60, max = 86400))]
    pub reset_window_secs: i64,
}

impl From<TierLimitsUpdate> for TierLimits {
    fn from(update: TierLimitsUpdate) -> Self {
        Self {
            requests_per_hour: Some(update.requests_per_hour),
            requests_per_day: update.requests_per_day,
            burst_limit: update.burst_limit,
            reset_window: Duration::seconds(update.reset_window_secs),
        }
    }
}

/// Per-user quota counters. Created lazily on first check or record,
/// reset when the window expires, purged after 24h of inactivity.
#[derive(Debug, Clone)]
pub struct UserRateState {
    pub requests: u32,
    pub tokens: u64,
    pub reset_at: DateTime<Utc>,
    pub last_request: DateTime<Utc>,
}

/// Outcome of a limit check. `allowed = false` is a normal state, not an
/// error; the HTTP layer maps it to 429.
#[derive(Debug, Clone, Serialize)]
pub struct LimitDecision {
    pub allowed: bool,
    /// None for unlimited tiers.
    pub remaining: Option<u32>,
    pub reset_at: DateTime<Utc>,
    pub tier: Tier,
}

/// Read-only projection of one user's counters for display purposes.
#[derive(Debug, Clone, Serialize)]
pub struct UsageSnapshot {
    pub user_id: String,
    pub requests: u32,
    pub tokens: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<u32>,
    pub reset_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_request: Option<DateTime<Utc>>,
}
