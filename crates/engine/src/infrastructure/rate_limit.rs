//! Per-user sliding-window rate limiting.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tavern_domain::UserKey;

use crate::infrastructure::config::RateLimitConfig;
use crate::infrastructure::ports::ClockPort;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum RateDecision {
    Allowed,
    RateLimited {
        /// Time until the oldest request in the window expires
        #[serde(with = "duration_secs")]
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Tracks recent request instants per user.
///
/// Owned by the caller and passed around explicitly.
pub struct RateLimiter {
    max_requests: usize,
    window: chrono::Duration,
    clock: Arc<dyn ClockPort>,
    requests: DashMap<UserKey, Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, clock: Arc<dyn ClockPort>) -> Self {
        Self {
            max_requests: config.max_requests as usize,
            window: chrono::Duration::from_std(config.window)
                .unwrap_or_else(|_| chrono::Duration::weeks(52)),
            clock,
            requests: DashMap::new(),
        }
    }

    /// Record a request for `user` unless the window is already full.
    pub fn check(&self, user: &UserKey) -> RateDecision {
        let now = self.clock.now();
        let cutoff = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let mut recent = self.requests.entry(user.clone()).or_default();
        recent.retain(|instant| *instant > cutoff);

        if recent.len() >= self.max_requests {
            let retry_after = recent
                .first()
                .map(|oldest| (*oldest + self.window) - now)
                .unwrap_or(self.window)
                .to_std()
                .unwrap_or(Duration::ZERO);
            tracing::warn!(
                user_key = %user,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            return RateDecision::RateLimited { retry_after };
        }

        recent.push(now);
        RateDecision::Allowed
    }

    /// Drop users with no requests inside the window.
    pub fn prune(&self) {
        let now = self.clock.now();
        let cutoff = now
            .checked_sub_signed(self.window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.requests.retain(|_, recent| {
            recent.retain(|instant| *instant > cutoff);
            !recent.is_empty()
        });
    }

    pub fn tracked_users(&self) -> usize {
        self.requests.len()
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }
}
