//! # gate-limit
//!
//! `gate-limit` provides a blocking, thread-safe sliding window admission gate.
//!
//! ## Core Philosophy
//!
//! A [`SlidingWindowLimiter`] admits at most `limit` callers in any trailing
//! `window`. Callers that arrive while the window is full are parked on a
//! condition variable until the oldest admission expires, then re-validate and
//! either proceed or park again. Nobody spins and nobody sleeps blindly.
//!
//! ## Key Concepts
//!
//! * **Admission Log**: An ordered queue of admission timestamps. Appended at the
//!   tail, pruned at the head.
//! * **Lazy Eviction**: Expired entries are removed the next time any caller
//!   looks at the log, so there are no background worker threads or timers.
//! * **Broadcast Wake**: Every eviction wakes every parked caller so they can
//!   recompute how long they still need to wait.
//! * **Strategy Trait**: A non-blocking probe shared with the async gate and the
//!   tower middleware.
//!
//! ## Example
//!
//! ```rust
//! use gate_limit::SlidingWindowLimiter;
//! use std::time::Duration;
//!
//! let limiter = SlidingWindowLimiter::new(2, Duration::from_millis(50)).unwrap();
//!
//! limiter.acquire();
//! limiter.acquire();
//! // Blocks for ~50ms until the first admission leaves the window.
//! limiter.acquire();
//! ```

use std::fmt::Debug;
use std::ops::ControlFlow;
use std::time::Duration;

mod cancel;
mod config;
mod error;
mod limiter;
mod log;

pub use cancel::CancelToken;
pub use config::GateConfig;
pub use config::human_duration;
pub use error::GateError;
pub use limiter::SlidingWindowLimiter;
pub use log::AdmissionLog;

/// Reasons why a request might be rejected by a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    Overloaded { retry_after: Duration },
}

/// A non-blocking admission probe.
///
/// Strategies must be `Send` and `Sync` to allow sharing across thread boundaries
/// via `Arc`.
pub trait Strategy: Debug {
    /// Attempts to admit a single request without waiting.
    ///
    /// # Errors
    ///
    /// Returns `Reason` if the window is full, with a hint of when the next
    /// slot opens.
    fn process(&self) -> ControlFlow<Reason>;
}
