use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::time::Duration;

use super::GateError;
use super::Reason;

const PREALLOCATED: usize = 1024;

/// The ordered record of admissions still (possibly) inside the window.
///
/// Timestamps are nanoseconds from an anchor chosen by the owning limiter, so
/// the same log serves both the `quanta` and the `tokio` clocks. Entries are
/// appended in non-decreasing order and pruned from the front only.
///
/// An entry stamped `t` covers the half-open interval `[t, t + window)`.
#[derive(Debug)]
pub struct AdmissionLog {
    limit: usize,
    window_ns: u64,
    stamps: VecDeque<u64>,
}

impl AdmissionLog {
    /// Creates an empty log.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidConfig` if `limit` or `window` is zero.
    pub fn new(limit: usize, window: Duration) -> Result<Self, GateError> {
        if limit == 0 {
            return Err(GateError::InvalidConfig("limit must be greater than zero"));
        }
        let window_ns = u64::try_from(window.as_nanos()).unwrap_or(u64::MAX);
        if window_ns == 0 {
            return Err(GateError::InvalidConfig("window must be greater than zero"));
        }
        Ok(Self {
            limit,
            window_ns,
            stamps: VecDeque::with_capacity(limit.min(PREALLOCATED)),
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn window(&self) -> Duration {
        Duration::from_nanos(self.window_ns)
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    /// Free slots, assuming expired entries have already been evicted.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.stamps.len())
    }

    /// Drops every entry whose window has closed by `now`.
    ///
    /// Returns how many entries were dropped.
    pub fn evict_expired(&mut self, now: u64) -> usize {
        let mut evicted = 0;
        while let Some(&oldest) = self.stamps.front() {
            if now.saturating_sub(oldest) < self.window_ns {
                break;
            }
            self.stamps.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// How long until the oldest entry leaves the window, if the log is full.
    ///
    /// `None` means a caller may be admitted right now.
    pub fn wait_time(&self, now: u64) -> Option<Duration> {
        if self.stamps.len() < self.limit {
            return None;
        }
        let oldest = self.stamps.front().copied().unwrap_or(now);
        let expires = oldest.saturating_add(self.window_ns);
        Some(Duration::from_nanos(expires.saturating_sub(now)))
    }

    /// Records an admission at `now`.
    ///
    /// A clock that steps backwards is clamped to the newest entry so the log
    /// stays sorted.
    pub fn record(&mut self, now: u64) {
        let stamp = self.stamps.back().map_or(now, |&newest| newest.max(now));
        self.stamps.push_back(stamp);
    }

    /// Evicts, then admits if there is room.
    ///
    /// The eviction count is returned alongside the outcome so the caller can
    /// decide whether to wake anybody.
    pub fn try_admit(&mut self, now: u64) -> (usize, ControlFlow<Reason>) {
        let evicted = self.evict_expired(now);
        match self.wait_time(now) {
            None => {
                self.record(now);
                (evicted, ControlFlow::Continue(()))
            }
            Some(retry_after) => (evicted, ControlFlow::Break(Reason::Overloaded { retry_after })),
        }
    }
}
