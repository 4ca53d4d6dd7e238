use std::sync::Arc;
use std::sync::Weak;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use parking_lot::Mutex;

use crate::limiter::Shared;

/// A cloneable handle that interrupts parked callers.
///
/// Pass it to [`SlidingWindowLimiter::acquire_cancellable`]; calling
/// [`CancelToken::cancel`] from any thread wakes every caller parked with this
/// token, and they return [`GateError::Cancelled`] without being admitted.
/// One token may be used with several limiters.
///
/// [`SlidingWindowLimiter::acquire_cancellable`]: crate::SlidingWindowLimiter::acquire_cancellable
/// [`GateError::Cancelled`]: crate::GateError::Cancelled
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    /// Limiters this token has parked on
    limiters: Mutex<Vec<Weak<Shared>>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return;
        }
        let limiters: Vec<Arc<Shared>> = self
            .inner
            .limiters
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();

        tracing::debug!(limiters = limiters.len(), "cancelling parked admissions");
        for shared in limiters {
            shared.wake_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Remembers `shared` so a later `cancel` can wake its waiters.
    ///
    /// Must happen before the caller first checks `is_cancelled` under the
    /// limiter's lock, otherwise a concurrent `cancel` could miss it.
    pub(crate) fn register(&self, shared: &Arc<Shared>) {
        let mut limiters = self.inner.limiters.lock();
        limiters.retain(|known| known.strong_count() > 0);
        if !limiters
            .iter()
            .any(|known| std::ptr::eq(known.as_ptr(), Arc::as_ptr(shared)))
        {
            limiters.push(Arc::downgrade(shared));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_is_idempotent_and_shared_between_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());

        token.cancel();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
