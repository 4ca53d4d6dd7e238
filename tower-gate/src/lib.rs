//! # Tower Gate
//!
//! `tower-gate` brings the sliding window admission gate from
//! [`gate_limit`] to async code and to the
//! [Tower](https://github.com/tower-rs/tower) ecosystem.
//!
//! - [`AsyncSlidingWindowLimiter`]: the same admission log and rules as
//!   [`gate_limit::SlidingWindowLimiter`], with callers parked on a
//!   `tokio::sync::Notify` raced against a timer instead of a condition variable.
//! - [`GateLayer`]: middleware whose `poll_ready` waits for admission before the
//!   inner service is called. Optionally fails fast with
//!   `ThrottleError::RateLimited`, or gives up after a timeout with
//!   `ThrottleError::Timeout`.

mod async_limiter;
mod error;
mod layer;
mod service;


pub use async_limiter::AsyncSlidingWindowLimiter;
pub use error::ThrottleError;
pub use layer::GateLayer;
pub use service::GateService;
