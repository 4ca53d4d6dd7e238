use std::fmt;
use std::future::Future;
use std::ops::ControlFlow;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use std::time::Duration;

use gate_limit::GateError;
use gate_limit::Reason;
use opentelemetry::KeyValue;
use opentelemetry::global;
use opentelemetry::metrics::Counter;
use tower::BoxError;
use tower::Service;

use crate::AsyncSlidingWindowLimiter;
use crate::error::ThrottleError;

type Admission = Pin<Box<dyn Future<Output = Result<(), GateError>> + Send>>;

#[derive(Clone, Debug)]
struct GateServiceMetrics {
    throttled: Counter<u64>,
}

/// Tower service that calls its inner service only once admitted.
pub struct GateService<S> {
    inner: S,
    limiter: AsyncSlidingWindowLimiter,
    admission: Option<Admission>,
    admitted: bool,
    fail_fast: bool,
    timeout: Option<Duration>,
    instruments: GateServiceMetrics,
}

impl<S: fmt::Debug> fmt::Debug for GateService<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateService")
            .field("inner", &self.inner)
            .field("limiter", &self.limiter)
            .field("waiting", &self.admission.is_some())
            .field("admitted", &self.admitted)
            .field("fail_fast", &self.fail_fast)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// A pending admission stays with the service that started it; clones start fresh
impl<S> Clone for GateService<S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            limiter: self.limiter.clone(),
            admission: None,
            admitted: false,
            fail_fast: self.fail_fast,
            timeout: self.timeout,
            instruments: self.instruments.clone(),
        }
    }
}

impl<S, Req> Service<Req> for GateService<S>
where
    S: Service<Req, Error = BoxError>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // 1. Check inner service readiness FIRST to avoid spending slots
        match self.inner.poll_ready(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
            Poll::Ready(Ok(())) => {}
        }

        if self.admitted {
            return Poll::Ready(Ok(()));
        }

        // 2. Fail fast: a single probe, no waiting
        if self.fail_fast {
            return match self.limiter.try_acquire() {
                ControlFlow::Continue(()) => {
                    self.admitted = true;
                    Poll::Ready(Ok(()))
                }
                ControlFlow::Break(Reason::Overloaded { retry_after }) => {
                    self.instruments
                        .throttled
                        .add(1, &[KeyValue::new("mode", "fail_fast")]);
                    Poll::Ready(Err(Box::new(ThrottleError::RateLimited { retry_after })))
                }
            };
        }

        // 3. Drive the admission wait, creating it on first use
        let admission = self.admission.get_or_insert_with(|| {
            let limiter = self.limiter.clone();
            let timeout = self.timeout;
            let admission: Admission = Box::pin(async move {
                match timeout {
                    Some(timeout) => limiter.acquire_timeout(timeout).await,
                    None => {
                        limiter.acquire().await;
                        Ok(())
                    }
                }
            });
            admission
        });

        match admission.as_mut().poll(cx) {
            Poll::Pending => {
                self.instruments
                    .throttled
                    .add(1, &[KeyValue::new("mode", "wait")]);
                Poll::Pending
            }
            Poll::Ready(outcome) => {
                self.admission = None;
                match outcome {
                    Ok(()) => {
                        self.admitted = true;
                        Poll::Ready(Ok(()))
                    }
                    Err(err) => Poll::Ready(Err(Box::new(ThrottleError::from(err)))),
                }
            }
        }
    }

    fn call(&mut self, req: Req) -> Self::Future {
        self.admitted = false;
        self.inner.call(req)
    }
}

impl<S> GateService<S> {
    pub fn new(inner: S, limiter: AsyncSlidingWindowLimiter) -> Self {
        let meter = global::meter("gate_service");
        let instruments = GateServiceMetrics {
            throttled: meter.u64_counter("throttled_polls").build(),
        };

        Self {
            inner,
            limiter,
            admission: None,
            admitted: false,
            fail_fast: false,
            timeout: None,
            instruments,
        }
    }

    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
