//! Daily ceiling on upstream forecast calls.
//!
//! The free tier of the forecast service allows a fixed number of calls per
//! day. [`QuotaTracker`] counts calls per calendar day (UTC, as reported by the
//! injected [`Clock`]) and starts denying once the ceiling is reached. State is
//! in-memory only; a restart starts a fresh count.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::debug;

use crate::clock::Clock;

pub const DEFAULT_DAILY_CALL_LIMIT: u64 = 1000;

/// Outcome of [`QuotaTracker::try_consume`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed { call: u64 },
    Denied { call: u64, limit: u64 },
}

impl Admission {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Admission::Allowed { .. })
    }
}

#[derive(Debug)]
struct QuotaState {
    calls_today: u64,
    last_call: DateTime<Utc>,
}

#[derive(Debug)]
pub struct QuotaTracker {
    limit: u64,
    clock: Arc<dyn Clock>,
    state: Mutex<QuotaState>,
}

impl QuotaTracker {
    pub fn new(limit: u64, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            clock,
            state: Mutex::new(QuotaState {
                calls_today: 0,
                last_call: DateTime::UNIX_EPOCH,
            }),
        }
    }

    pub fn with_default_limit(clock: Arc<dyn Clock>) -> Self {
        Self::new(DEFAULT_DAILY_CALL_LIMIT, clock)
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Count one call attempt and decide whether it may go upstream.
    ///
    /// The count is compared *after* incrementing with `>=`, so with a limit of
    /// 1000 the 1000th attempt of a day is the first one denied. Denied
    /// attempts are still counted.
    pub fn try_consume(&self) -> Admission {
        let now = self.clock.now();
        let mut state = self.state.lock();

        if state.last_call.date_naive() != now.date_naive() {
            debug!(previous = %state.last_call, "resetting forecast API call counter");
            state.calls_today = 0;
        }

        state.calls_today = state.calls_today.saturating_add(1);
        let call = state.calls_today;
        debug!(call, limit = self.limit, "forecast API call number {call} today");

        if call >= self.limit {
            return Admission::Denied {
                call,
                limit: self.limit,
            };
        }

        state.last_call = now;
        Admission::Allowed { call }
    }
}
