use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::metrics::RATE_LIMIT_TRACKED_USERS;
use crate::models::rate_limit::{
    LimitDecision, Tier, TierLimits, UsageSnapshot, UserRateState,
};
use crate::utils::clock::Clock;

/// Entries idle longer than this are dropped by `cleanup`.
const IDLE_EXPIRY_HOURS: i64 = 24;

/// A burst window ends after this much idle time; the next request starts a
/// fresh burst regardless of accumulated counters.
const BURST_IDLE_SECONDS: i64 = 60;

#[derive(Debug, Error, PartialEq)]
pub enum RateLimitError {
    #[error("unknown tier: {0}")]
    UnknownTier(String),
    #[error("limits for the {0} tier cannot be changed")]
    ImmutableTier(Tier),
}

/// Fixed-window request limiter keyed by user id.
///
/// The quota resets entirely when the window expires, so a client can spend
/// a full quota just before the boundary and another full quota just after.
/// That is the documented behavior of this design, not a bug.
///
/// `check_limit` and `record_usage` are deliberately decoupled so callers
/// can do the real work between the check and the accounting; two
/// concurrent requests from one user can both pass the check before either
/// records. Callers that do not need the split should use `try_acquire`,
/// which checks and increments under a single lock acquisition.
pub struct RateLimiter {
    clock: Arc<dyn Clock>,
    limits: RwLock<HashMap<Tier, TierLimits>>,
    states: Mutex<HashMap<String, UserRateState>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let limits = Tier::ALL
            .into_iter()
            .map(|tier| (tier, TierLimits::default_for(tier)))
            .collect();
        Self {
            clock,
            limits: RwLock::new(limits),
            states: Mutex::new(HashMap::new()),
        }
    }

    fn limits_for(&self, tier: Tier) -> TierLimits {
        let limits = self.limits.read().unwrap_or_else(|e| e.into_inner());
        limits
            .get(&tier)
            .cloned()
            .unwrap_or_else(|| TierLimits::default_for(tier))
    }

    fn lock_states(&self) -> MutexGuard<'_, HashMap<String, UserRateState>> {
        self.states.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn admin_decision(&self, now: DateTime<Utc>) -> LimitDecision {
        LimitDecision {
            allowed: true,
            remaining: None,
            reset_at: now,
            tier: Tier::Admin,
        }
    }

    /// Get or create the user's entry and roll the window if it expired.
    fn entry_at<'a>(
        states: &'a mut HashMap<String, UserRateState>,
        user_id: &str,
        limits: &TierLimits,
        now: DateTime<Utc>,
    ) -> &'a mut UserRateState {
        let entry = states
            .entry(user_id.to_string())
            .or_insert_with(|| UserRateState {
                requests: 0,
                tokens: 0,
                reset_at: now + limits.reset_window,
                last_request: now,
            });
        if now >= entry.reset_at {
            entry.requests = 0;
            entry.tokens = 0;
            entry.reset_at = now + limits.reset_window;
        }
        entry
    }

    /// Check the hourly quota without consuming it.
    ///
    /// Lazily creates the user entry and rolls an expired window; otherwise
    /// a pure read. Admin bypasses without touching state.
    pub fn check_limit(&self, user_id: &str, tier: Tier) -> LimitDecision {
        let now = self.clock.now();
        if tier == Tier::Admin {
            return self.admin_decision(now);
        }

        let limits = self.limits_for(tier);
        let mut states = self.lock_states();
        let entry = Self::entry_at(&mut states, user_id, &limits, now);

        match limits.requests_per_hour {
            Some(limit) => LimitDecision {
                allowed: entry.requests < limit,
                remaining: Some(limit.saturating_sub(entry.requests)),
                reset_at: entry.reset_at,
                tier,
            },
            None => LimitDecision {
                allowed: true,
                remaining: None,
                reset_at: entry.reset_at,
                tier,
            },
        }
    }

    /// Account for one executed request. The caller is expected to have
    /// passed `check_limit` first; this does not re-check the quota.
    pub fn record_usage(&self, user_id: &str, tier: Tier, tokens_used: u64) {
        let now = self.clock.now();
        if tier == Tier::Admin {
            return;
        }

        let limits = self.limits_for(tier);
        let mut states = self.lock_states();
        let entry = Self::entry_at(&mut states, user_id, &limits, now);
        entry.requests += 1;
        entry.tokens += tokens_used;
        entry.last_request = now;

        tracing::debug!(
            user_id,
            tier = %tier,
            requests = entry.requests,
            tokens = entry.tokens,
            "Recorded usage"
        );
    }

    /// Atomic check-and-increment: the quota is consumed only when the
    /// request is allowed, all under one lock acquisition. Safe against the
    /// check-then-record race in concurrent hosts.
    pub fn try_acquire(&self, user_id: &str, tier: Tier, tokens_used: u64) -> LimitDecision {
        let now = self.clock.now();
        if tier == Tier::Admin {
            return self.admin_decision(now);
        }

        let limits = self.limits_for(tier);
        let mut states = self.lock_states();
        let entry = Self::entry_at(&mut states, user_id, &limits, now);

        let allowed = match limits.requests_per_hour {
            Some(limit) => entry.requests < limit,
            None => true,
        };

        if allowed {
            entry.requests += 1;
            entry.tokens += tokens_used;
            entry.last_request = now;
        } else {
            tracing::warn!(user_id, tier = %tier, "Quota exhausted");
        }

        LimitDecision {
            allowed,
            remaining: limits
                .requests_per_hour
                .map(|limit| limit.saturating_sub(entry.requests)),
            reset_at: entry.reset_at,
            tier,
        }
    }

    /// Secondary short-horizon guard against rapid-fire requests. A user
    /// idle for 60s always passes; otherwise the in-window request count
    /// must stay at or below the tier's burst limit.
    pub fn check_burst_limit(&self, user_id: &str, tier: Tier) -> bool {
        if tier == Tier::Admin {
            return true;
        }

        let now = self.clock.now();
        let limits = self.limits_for(tier);
        let states = self.lock_states();

        match states.get(user_id) {
            None => true,
            Some(entry) => {
                let idle = now - entry.last_request;
                idle.num_seconds() >= BURST_IDLE_SECONDS || entry.requests <= limits.burst_limit
            }
        }
    }

    /// Read-only usage projection for one user. Never mutates state; an
    /// expired window is reported as zero usage without rolling it.
    pub fn user_usage(&self, user_id: &str, tier: Tier) -> UsageSnapshot {
        let now = self.clock.now();
        let limits = self.limits_for(tier);
        let states = self.lock_states();

        let (requests, tokens, reset_at, last_request) = match states.get(user_id) {
            Some(entry) if now < entry.reset_at => (
                entry.requests,
                entry.tokens,
                entry.reset_at,
                Some(entry.last_request),
            ),
            Some(entry) => (0, 0, now + limits.reset_window, Some(entry.last_request)),
            None => (0, 0, now + limits.reset_window, None),
        };

        UsageSnapshot {
            user_id: user_id.to_string(),
            requests,
            tokens,
            limit: limits.requests_per_hour,
            remaining: limits
                .requests_per_hour
                .map(|limit| limit.saturating_sub(requests)),
            reset_at,
            last_request,
        }
    }

    /// Usage snapshots for every tracked user, without tier-specific limit
    /// columns (tier is not stored with the counters).
    pub fn all_usage(&self) -> Vec<UsageSnapshot> {
        let states = self.lock_states();
        let mut snapshots: Vec<UsageSnapshot> = states
            .iter()
            .map(|(user_id, entry)| UsageSnapshot {
                user_id: user_id.clone(),
                requests: entry.requests,
                tokens: entry.tokens,
                limit: None,
                remaining: None,
                reset_at: entry.reset_at,
                last_request: Some(entry.last_request),
            })
            .collect();
        snapshots.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        snapshots
    }

    /// Values for the X-RateLimit-* response headers. Read-only; empty for
    /// unlimited tiers.
    pub fn rate_limit_headers(&self, user_id: &str, tier: Tier) -> Vec<(&'static str, String)> {
        if tier == Tier::Admin {
            return Vec::new();
        }

        let usage = self.user_usage(user_id, tier);
        let mut headers = Vec::with_capacity(3);
        if let Some(limit) = usage.limit {
            headers.push(("x-ratelimit-limit", limit.to_string()));
        }
        if let Some(remaining) = usage.remaining {
            headers.push(("x-ratelimit-remaining", remaining.to_string()));
        }
        headers.push(("x-ratelimit-reset", usage.reset_at.to_rfc3339()));
        headers
    }

    /// Seconds until the user's window resets, measured on the limiter's
    /// own clock so it always agrees with the reported `reset_at`.
    pub fn retry_after_secs(&self, user_id: &str, tier: Tier) -> i64 {
        let usage = self.user_usage(user_id, tier);
        (usage.reset_at - self.clock.now()).num_seconds().max(0)
    }

    /// Drop entries idle for more than 24h. Invoked by an external
    /// scheduler; the limiter does not self-schedule.
    pub fn cleanup(&self) -> usize {
        let now = self.clock.now();
        let mut states = self.lock_states();
        let before = states.len();
        states.retain(|_, entry| now - entry.last_request <= Duration::hours(IDLE_EXPIRY_HOURS));
        let removed = before - states.len();

        RATE_LIMIT_TRACKED_USERS.set(states.len() as i64);
        if removed > 0 {
            tracing::info!(removed, tracked = states.len(), "Rate limit state cleanup");
        }
        removed
    }

    /// Admin reset: forget one user's counters entirely.
    pub fn reset_user(&self, user_id: &str) -> bool {
        self.lock_states().remove(user_id).is_some()
    }

    /// Admin update of a tier's quota configuration. The admin tier itself
    /// stays unlimited.
    pub fn update_tier_limits(&self, tier: Tier, limits: TierLimits) -> Result<(), RateLimitError> {
        if tier == Tier::Admin {
            return Err(RateLimitError::ImmutableTier(tier));
        }
        let mut all = self.limits.write().unwrap_or_else(|e| e.into_inner());
        tracing::info!(
            tier = %tier,
            requests_per_hour = ?limits.requests_per_hour,
            burst_limit = limits.burst_limit,
            "Updating tier limits"
        );
        all.insert(tier, limits);
        Ok(())
    }

    pub fn tracked_users(&self) -> usize {
        self.lock_states().len()
    }
}
