//! Session timing configuration.

use regbridge_core::{Error, Result, constants::*};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timeouts and polling parameters used by a [`UsbBridgeDevice`].
///
/// Defaults match the bridge firmware's expectations: 500 ms read timeout,
/// 1000 ms write timeout, and up to 100 receive-queue polls 1 ms apart.
///
/// # Examples
///
/// ```
/// use regbridge_hardware::BridgeConfig;
/// use std::time::Duration;
///
/// let config = BridgeConfig::default().with_poll_attempts(20);
/// assert_eq!(config.poll_attempts, 20);
/// assert_eq!(config.poll_interval(), Duration::from_millis(1));
/// assert!(config.validate().is_ok());
/// ```
///
/// [`UsbBridgeDevice`]: crate::UsbBridgeDevice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Driver read timeout in milliseconds.
    pub read_timeout_ms: u32,

    /// Driver write timeout in milliseconds.
    pub write_timeout_ms: u32,

    /// Receive-queue polls before giving up.
    pub poll_attempts: u32,

    /// Delay between receive-queue polls in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            poll_attempts: DEFAULT_POLL_ATTEMPTS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl BridgeConfig {
    /// Set the driver read and write timeouts.
    pub fn with_timeouts(mut self, read_ms: u32, write_ms: u32) -> Self {
        self.read_timeout_ms = read_ms;
        self.write_timeout_ms = write_ms;
        self
    }

    /// Set the number of receive-queue polls.
    pub fn with_poll_attempts(mut self, attempts: u32) -> Self {
        self.poll_attempts = attempts;
        self
    }

    /// Set the delay between receive-queue polls, rounded up to whole
    /// milliseconds.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        let millis = interval.as_micros().div_ceil(1000);
        self.poll_interval_ms = u64::try_from(millis).unwrap_or(u64::MAX);
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Check the configuration can drive a transaction.
    ///
    /// # Errors
    /// Returns `Error::Config` if `poll_attempts` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.poll_attempts == 0 {
            return Err(Error::Config(
                "poll_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.read_timeout_ms, 500);
        assert_eq!(config.write_timeout_ms, 1000);
        assert_eq!(config.poll_attempts, 100);
        assert_eq!(config.poll_interval(), Duration::from_millis(1));
    }

    #[test]
    fn test_builder_setters() {
        let config = BridgeConfig::default()
            .with_timeouts(250, 750)
            .with_poll_attempts(5)
            .with_poll_interval(Duration::from_millis(10));

        assert_eq!(config.read_timeout_ms, 250);
        assert_eq!(config.write_timeout_ms, 750);
        assert_eq!(config.poll_attempts, 5);
        assert_eq!(config.poll_interval_ms, 10);
    }

    #[test]
    fn test_poll_interval_rounds_up() {
        let config = BridgeConfig::default().with_poll_interval(Duration::from_micros(200));
        assert_eq!(config.poll_interval(), Duration::from_millis(1));

        let config = BridgeConfig::default().with_poll_interval(Duration::from_micros(2500));
        assert_eq!(config.poll_interval_ms, 3);

        let config = BridgeConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(config.poll_interval_ms, 0);
    }

    #[test]
    fn test_poll_interval_saturates() {
        let config = BridgeConfig::default().with_poll_interval(Duration::MAX);
        assert_eq!(config.poll_interval_ms, u64::MAX);
    }

    #[test]
    fn test_zero_poll_attempts_rejected() {
        let config = BridgeConfig::default().with_poll_attempts(0);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: BridgeConfig = serde_json::from_str(r#"{"poll_attempts": 10}"#).unwrap();

        assert_eq!(config.poll_attempts, 10);
        assert_eq!(config.read_timeout_ms, 500);
        assert_eq!(config.write_timeout_ms, 1000);
    }
}
