use std::time::Duration;

use tower::Layer;

use crate::AsyncSlidingWindowLimiter;
use crate::service::GateService;

/// Holds requests back until the shared sliding window admits them.
#[derive(Debug, Clone)]
pub struct GateLayer {
    limiter: AsyncSlidingWindowLimiter,
    fail_fast: bool,
    timeout: Option<Duration>,
}

impl GateLayer {
    /// Create a GateLayer. Every service it wraps shares `limiter`.
    pub fn new(limiter: AsyncSlidingWindowLimiter) -> Self {
        GateLayer {
            limiter,
            fail_fast: false,
            timeout: None,
        }
    }

    /// Set whether the service should fail immediately when the window is full.
    ///
    /// If `true`, the service will return `ThrottleError::RateLimited`
    /// immediately instead of waiting for a slot.
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the longest a request may wait for a slot.
    ///
    /// Past this the service returns `ThrottleError::Timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl<S> Layer<S> for GateLayer {
    type Service = GateService<S>;

    fn layer(&self, service: S) -> Self::Service {
        let mut svc =
            GateService::new(service, self.limiter.clone()).with_fail_fast(self.fail_fast);
        if let Some(timeout) = self.timeout {
            svc = svc.with_timeout(timeout);
        }
        svc
    }
}
