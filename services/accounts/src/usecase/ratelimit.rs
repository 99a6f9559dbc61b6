//! Multi-window rate gate for OTP requests.
//!
//! Pure policy over a [`RequestStats`] snapshot; the caller reads the snapshot
//! from the durable verification ledger, so the gates hold across process
//! restarts and multiple instances. Checks run in a fixed order — per-email
//! cap, per-IP cap, cooldown — and the first failing check determines the
//! rejection and its retry-after.

use chrono::{DateTime, Duration, Utc};

use crate::domain::repository::RequestStats;

/// Trailing window for the hourly caps.
pub const WINDOW_SECS: i64 = 3600;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_per_email_hour: u64,
    pub max_per_ip_hour: u64,
    pub cooldown_secs: i64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_per_email_hour: 5,
            max_per_ip_hour: 20,
            cooldown_secs: 30,
        }
    }
}

/// Which gate rejected the request. Logged, never sent to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateScope {
    Email,
    Ip,
    Cooldown,
}

#[derive(Debug, Clone, Copy)]
pub struct Rejection {
    pub scope: RateScope,
    pub retry_after_secs: u64,
}

/// Seconds until the oldest request inside the window leaves it.
fn window_retry_after(oldest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> u64 {
    match oldest {
        Some(oldest) => {
            let elapsed = (now - oldest).num_seconds();
            (WINDOW_SECS - elapsed).clamp(1, WINDOW_SECS) as u64
        }
        None => WINDOW_SECS as u64,
    }
}

fn cooldown_remaining(last: Option<DateTime<Utc>>, now: DateTime<Utc>, cooldown: Duration) -> i64 {
    match last {
        Some(last) => (cooldown - (now - last)).num_seconds(),
        None => 0,
    }
}

pub fn evaluate(
    stats: &RequestStats,
    config: &RateLimitConfig,
    now: DateTime<Utc>,
) -> Result<(), Rejection> {
    if stats.email_count >= config.max_per_email_hour {
        return Err(Rejection {
            scope: RateScope::Email,
            retry_after_secs: window_retry_after(stats.oldest_email_at, now),
        });
    }

    if stats.ip_count >= config.max_per_ip_hour {
        return Err(Rejection {
            scope: RateScope::Ip,
            retry_after_secs: window_retry_after(stats.oldest_ip_at, now),
        });
    }

    // Cooldown: block if the same email *or* the same IP asked too recently;
    // report whichever leaves the longer wait.
    let cooldown = Duration::seconds(config.cooldown_secs);
    let remaining = cooldown_remaining(stats.last_email_at, now, cooldown)
        .max(cooldown_remaining(stats.last_ip_at, now, cooldown));
    if remaining > 0 {
        return Err(Rejection {
            scope: RateScope::Cooldown,
            retry_after_secs: remaining.max(1) as u64,
        });
    }

    Ok(())
}
