/// Errors produced by the admission gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The limiter was constructed with a zero limit or a zero window.
    ///
    /// Raised by the constructor, never by `acquire`.
    #[error("Invalid limiter configuration: {0}")]
    InvalidConfig(&'static str),

    /// A parked caller was cancelled before it was admitted.
    ///
    /// Nothing was recorded in the admission log, so the caller may retry.
    #[error("Admission wait was cancelled")]
    Cancelled,

    /// A caller's deadline passed before a slot opened.
    ///
    /// Nothing was recorded in the admission log, so the caller may retry.
    #[error("Timed out waiting for admission")]
    Timeout,
}
