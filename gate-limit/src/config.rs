use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

use super::GateError;

/// Window parameters for a limiter.
///
/// Deserializes from e.g. `{ "limit": 10, "window": "1s" }`. The window accepts
/// any [`humantime`] duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Maximum admissions in any trailing window
    pub limit: usize,
    #[serde(with = "human_duration")]
    pub window: Duration,
}

impl GateConfig {
    pub fn new(limit: usize, window: Duration) -> Self {
        Self { limit, window }
    }

    pub fn per_second(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(1))
    }

    pub fn per_minute(limit: usize) -> Self {
        Self::new(limit, Duration::from_secs(60))
    }

    /// # Errors
    ///
    /// Returns `GateError::InvalidConfig` if `limit` or `window` is zero.
    pub fn validate(&self) -> Result<(), GateError> {
        if self.limit == 0 {
            return Err(GateError::InvalidConfig("limit must be greater than zero"));
        }
        if self.window.is_zero() {
            return Err(GateError::InvalidConfig("window must be greater than zero"));
        }
        Ok(())
    }
}

/// `serde` helpers for durations written as `"250ms"`, `"1s"`, `"1m 30s"`.
pub mod human_duration {
    use std::time::Duration;

    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;
    use serde::de::Error;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&humantime::format_duration(*duration))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(deserializer)?;
        humantime::parse_duration(&raw).map_err(D::Error::custom)
    }
}
