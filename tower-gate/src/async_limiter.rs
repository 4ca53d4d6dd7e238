use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use gate_limit::AdmissionLog;
use gate_limit::GateError;
use gate_limit::Reason;
use gate_limit::Strategy;
use parking_lot::Mutex;
use parking_lot::MutexGuard;
use tokio::sync::Notify;
use tokio::time::Instant;

/// An async sliding window limiter.
///
/// Same admission rules as [`gate_limit::SlidingWindowLimiter`], but callers
/// park on a [`Notify`] raced against a timer instead of a condition variable.
/// The log's mutex is never held across an `.await`.
///
/// Dropping an `acquire` future before it resolves is the cancellation: an
/// admission is recorded in the same poll that returns `Ready`, so a dropped
/// future never holds a slot.
#[derive(Debug, Clone)]
pub struct AsyncSlidingWindowLimiter {
    shared: Arc<Shared>,
}

#[derive(Debug)]
struct Shared {
    log: Mutex<AdmissionLog>,
    slot_freed: Notify,
    anchor: Instant,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, AdmissionLog> {
        self.log.lock()
    }

    fn now(&self) -> u64 {
        Instant::now().duration_since(self.anchor).as_nanos() as u64
    }

    fn try_admit(&self) -> ControlFlow<Reason> {
        let mut log = self.lock();
        let (evicted, outcome) = log.try_admit(self.now());
        if evicted > 0 {
            tracing::trace!(evicted, "admissions left the window");
            self.slot_freed.notify_waiters();
        }
        outcome
    }
}

impl Strategy for AsyncSlidingWindowLimiter {
    fn process(&self) -> ControlFlow<Reason> {
        self.try_acquire()
    }
}

impl AsyncSlidingWindowLimiter {
    /// # Errors
    ///
    /// Returns `GateError::InvalidConfig` if `limit` or `window` is zero.
    pub fn new(limit: usize, window: Duration) -> Result<Self, GateError> {
        let log = AdmissionLog::new(limit, window)?;
        Ok(Self {
            shared: Arc::new(Shared {
                log: Mutex::new(log),
                slot_freed: Notify::new(),
                anchor: Instant::now(),
            }),
        })
    }

    pub fn limit(&self) -> usize {
        self.shared.lock().limit()
    }

    pub fn window(&self) -> Duration {
        self.shared.lock().window()
    }

    pub fn available(&self) -> usize {
        let mut log = self.shared.lock();
        if log.evict_expired(self.shared.now()) > 0 {
            self.shared.slot_freed.notify_waiters();
        }
        log.remaining()
    }

    pub fn try_acquire(&self) -> ControlFlow<Reason> {
        self.shared.try_admit()
    }

    /// Waits until the caller is admitted.
    pub async fn acquire(&self) {
        loop {
            let notified = self.shared.slot_freed.notified();
            tokio::pin!(notified);
            // Subscribe before looking, so an eviction between the check and
            // the select still wakes us.
            notified.as_mut().enable();

            let ControlFlow::Break(Reason::Overloaded { retry_after }) = self.shared.try_admit()
            else {
                tracing::trace!("admitted");
                return;
            };

            tracing::debug!(retry_after = ?retry_after, "window full, parking");
            tokio::select! {
                _ = &mut notified => {}
                _ = tokio::time::sleep(retry_after) => {}
            }
        }
    }

    /// Waits at most `timeout` for admission.
    ///
    /// # Errors
    ///
    /// Returns `GateError::Timeout` if no slot opened in time.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<(), GateError> {
        tokio::time::timeout(timeout, self.acquire())
            .await
            .map_err(|_| {
                tracing::debug!("admission deadline passed");
                GateError::Timeout
            })
    }
}
