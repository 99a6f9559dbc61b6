//! In-memory login rate limiter, keyed by account id.
//!
//! Sliding window of failure timestamps; reaching the threshold locks the
//! account for a fixed duration and clears the window, so the lock alone
//! governs re-entry. Process-local by design: multiple instances each keep
//! their own counters, which can only make the limit slightly looser or
//! stricter, never corrupt account state. A shared cache can replace the map
//! behind this same interface.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct LoginLimiterConfig {
    pub max_failures: u32,
    pub window_secs: i64,
    pub lock_secs: i64,
}

impl Default for LoginLimiterConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_secs: 900,
            lock_secs: 900,
        }
    }
}

#[derive(Debug, Default)]
struct Entry {
    failures: Vec<DateTime<Utc>>,
    locked_until: Option<DateTime<Utc>>,
}

/// Result of recording one failed login.
#[derive(Debug, Clone, Copy)]
pub struct FailureOutcome {
    pub just_locked: bool,
    pub retry_after_secs: u64,
    pub count: u32,
}

pub struct LoginLimiter {
    config: LoginLimiterConfig,
    state: Mutex<HashMap<Uuid, Entry>>,
}

impl LoginLimiter {
    pub fn new(config: LoginLimiterConfig) -> Self {
        Self {
            config,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Remaining lock time in seconds, if the account is currently locked.
    pub fn is_locked(&self, account_id: Uuid) -> Option<u64> {
        self.is_locked_at(account_id, Utc::now())
    }

    /// Record a failed password check; locks the account when the windowed
    /// failure count reaches the threshold.
    pub fn record_failure(&self, account_id: Uuid) -> FailureOutcome {
        self.record_failure_at(account_id, Utc::now())
    }

    /// Forget all failures for an account after a successful authentication.
    pub fn clear(&self, account_id: Uuid) {
        self.state.lock().unwrap().remove(&account_id);
    }

    fn is_locked_at(&self, account_id: Uuid, now: DateTime<Utc>) -> Option<u64> {
        let mut state = self.state.lock().unwrap();
        let entry = state.get_mut(&account_id)?;
        let locked_until = entry.locked_until?;
        let remaining = (locked_until - now).num_seconds();
        if remaining > 0 {
            return Some(remaining as u64);
        }
        // Expired lock; clear it but keep the entry for future failures.
        entry.locked_until = None;
        None
    }

    fn record_failure_at(&self, account_id: Uuid, now: DateTime<Utc>) -> FailureOutcome {
        let window = Duration::seconds(self.config.window_secs);
        let mut state = self.state.lock().unwrap();
        let entry = state.entry(account_id).or_default();

        entry.failures.retain(|t| now - *t < window);
        entry.failures.push(now);

        let count = entry.failures.len() as u32;
        if count >= self.config.max_failures {
            let locked_until = now + Duration::seconds(self.config.lock_secs);
            entry.locked_until = Some(locked_until);
            // The lock, not a further rolling count, governs re-entry.
            entry.failures.clear();
            return FailureOutcome {
                just_locked: true,
                retry_after_secs: (locked_until - now).num_seconds().max(0) as u64,
                count,
            };
        }

        FailureOutcome {
            just_locked: false,
            retry_after_secs: 0,
            count,
        }
    }
}
