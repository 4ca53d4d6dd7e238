use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Condvar;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use quanta::Clock;
use quanta::Instant;

use super::AdmissionLog;
use super::CancelToken;
use super::GateConfig;
use super::GateError;
use super::Reason;
use super::Strategy;

/// A blocking sliding window limiter.
///
/// At most `limit` callers are admitted in any trailing `window`, counted from
/// the moment `acquire` returns. Cloning is cheap and every clone shares the
/// same admission log.
#[derive(Debug, Clone)]
pub struct SlidingWindowLimiter {
    shared: Arc<Shared>,
}

#[derive(Debug)]
pub(crate) struct Shared {
    log: Mutex<AdmissionLog>,
    /// Signalled whenever entries leave the log or a token fires
    slot_freed: Condvar,
    clock: Clock,
    anchor: Instant,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, AdmissionLog> {
        self.log.lock()
    }

    fn now(&self) -> u64 {
        self.clock.now().duration_since(self.anchor).as_nanos() as u64
    }

    fn evict(&self, log: &mut AdmissionLog, now: u64) {
        let evicted = log.evict_expired(now);
        if evicted > 0 {
            tracing::trace!(evicted, "admissions left the window");
            self.slot_freed.notify_all();
        }
    }

    /// Wakes every parked caller so they re-validate.
    ///
    /// The lock is taken first so a caller between its last check and its
    /// wait cannot miss the signal.
    pub(crate) fn wake_all(&self) {
        drop(self.lock());
        self.slot_freed.notify_all();
    }
}

impl Strategy for SlidingWindowLimiter {
    fn process(&self) -> ControlFlow<Reason> {
        self.try_acquire()
    }
}

impl SlidingWindowLimiter {
    /// Creates a limiter admitting `limit` callers per trailing `window`.
    ///
    /// # Errors
    ///
    /// Returns `GateError::InvalidConfig` if `limit` or `window` is zero.
    pub fn new(limit: usize, window: Duration) -> Result<Self, GateError> {
        Self::with_clock(limit, window, Clock::new())
    }

    /// Creates a limiter from a validated [`GateConfig`].
    pub fn from_config(config: &GateConfig) -> Result<Self, GateError> {
        config.validate()?;
        Self::new(config.limit, config.window)
    }

    /// Creates a limiter driven by the given clock.
    ///
    /// Mainly useful with [`Clock::mock`] for non-blocking tests.
    pub fn with_clock(limit: usize, window: Duration, clock: Clock) -> Result<Self, GateError> {
        let log = AdmissionLog::new(limit, window)?;
        let anchor = clock.now();
        Ok(Self {
            shared: Arc::new(Shared {
                log: Mutex::new(log),
                slot_freed: Condvar::new(),
                clock,
                anchor,
            }),
        })
    }

    pub fn limit(&self) -> usize {
        self.shared.lock().limit()
    }

    pub fn window(&self) -> Duration {
        self.shared.lock().window()
    }

    /// Number of callers that could be admitted right now without waiting.
    pub fn available(&self) -> usize {
        let mut log = self.shared.lock();
        self.shared.evict(&mut log, self.shared.now());
        log.remaining()
    }

    /// Admits the caller if there is room, without waiting.
    pub fn try_acquire(&self) -> ControlFlow<Reason> {
        let mut log = self.shared.lock();
        let (evicted, outcome) = log.try_admit(self.shared.now());
        if evicted > 0 {
            self.shared.slot_freed.notify_all();
        }
        outcome
    }

    /// Blocks until the caller is admitted.
    pub fn acquire(&self) {
        let outcome = self.admit(None, None);
        // Only a deadline or a token can end a wait without admission
        debug_assert!(outcome.is_ok());
    }

    /// Blocks until admitted or until `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Cancelled` if the token fired first, including when
    /// it was already cancelled on entry. The admission log is left untouched.
    pub fn acquire_cancellable(&self, token: &CancelToken) -> Result<(), GateError> {
        self.admit(None, Some(token))
    }

    /// Blocks until admitted or until `timeout` has elapsed.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Timeout` if no slot opened in time. The admission
    /// log is left untouched.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<(), GateError> {
        self.acquire_with(Some(timeout), None)
    }

    /// The general form of the blocking acquisitions.
    pub fn acquire_with(
        &self,
        timeout: Option<Duration>,
        token: Option<&CancelToken>,
    ) -> Result<(), GateError> {
        let deadline = timeout.map(|timeout| {
            let timeout_ns = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
            self.shared.now().saturating_add(timeout_ns)
        });
        self.admit(deadline, token)
    }

    fn admit(&self, deadline: Option<u64>, token: Option<&CancelToken>) -> Result<(), GateError> {
        let shared = &*self.shared;
        if let Some(token) = token {
            token.register(&self.shared);
        }

        let mut log = shared.lock();
        let mut now = shared.now();
        shared.evict(&mut log, now);

        loop {
            if token.is_some_and(CancelToken::is_cancelled) {
                tracing::debug!("admission cancelled");
                return Err(GateError::Cancelled);
            }

            let Some(wait) = log.wait_time(now) else {
                break;
            };

            let park = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_sub(now);
                    if remaining == 0 {
                        tracing::debug!("admission deadline passed");
                        return Err(GateError::Timeout);
                    }
                    wait.min(Duration::from_nanos(remaining))
                }
                None => wait,
            };

            if !park.is_zero() {
                tracing::debug!(park = ?park, "window full, parking");
                // Timeout, notification and spurious wakeups all fall through
                // to the same re-check below.
                shared.slot_freed.wait_for(&mut log, park);
            }

            now = shared.now();
            shared.evict(&mut log, now);
        }

        log.record(now);
        tracing::trace!(in_window = log.len(), "admitted");
        Ok(())
    }
}
