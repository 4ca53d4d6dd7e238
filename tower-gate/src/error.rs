use gate_limit::GateError;

/// Errors produced by the gate middleware.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ThrottleError {
    /// The request waited for a slot longer than the configured timeout.
    #[error("Request timed out waiting for an admission slot")]
    Timeout,

    /// The window was full and the service is in fail-fast mode.
    ///
    /// The duration indicates when the oldest admission leaves the window.
    #[error("Rate limit exceeded; retry after {retry_after:?}")]
    RateLimited {
        /// The duration to wait before retrying.
        retry_after: std::time::Duration,
    },

    /// The admission wait ended for another reason.
    #[error("Admission failed: {0}")]
    Gate(GateError),
}

impl From<GateError> for ThrottleError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Timeout => Self::Timeout,
            other => Self::Gate(other),
        }
    }
}
