//! Poller configuration.

use std::time::Duration;

/// Configuration for the preview poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between the end of one status check and the next
    pub interval: Duration,
    /// Non-terminal status checks before giving up (0 = unbounded)
    pub max_attempts: u32,
    /// Delay before the settle hook runs after a success
    pub settle_delay: Duration,
    /// Delay before the hook refreshes state after a submission is accepted
    pub accept_refresh_delay: Duration,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            max_attempts: 60,
            settle_delay: Duration::from_millis(1000),
            accept_refresh_delay: Duration::from_millis(2000),
        }
    }
}

impl PollerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            interval: Duration::from_secs(
                std::env::var("VDNA_POLL_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .filter(|secs: &u64| *secs > 0)
                    .unwrap_or(5),
            ),
            max_attempts: std::env::var("VDNA_POLL_MAX_ATTEMPTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(60),
            settle_delay: Duration::from_millis(
                std::env::var("VDNA_SETTLE_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(1000),
            ),
            accept_refresh_delay: Duration::from_millis(
                std::env::var("VDNA_ACCEPT_REFRESH_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn with_accept_refresh_delay(mut self, delay: Duration) -> Self {
        self.accept_refresh_delay = delay;
        self
    }

    /// Whether polling is bounded.
    pub fn is_bounded(&self) -> bool {
        self.max_attempts > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let config = PollerConfig::default();
        assert_eq!(config.interval, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 60);
        assert_eq!(config.accept_refresh_delay, Duration::from_secs(2));
        assert!(config.is_bounded());
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var("VDNA_POLL_INTERVAL_SECS", "2");
        std::env::set_var("VDNA_POLL_MAX_ATTEMPTS", "0");
        std::env::set_var("VDNA_SETTLE_DELAY_MS", "250");
        std::env::set_var("VDNA_ACCEPT_REFRESH_DELAY_MS", "500");
        let config = PollerConfig::from_env();
        std::env::remove_var("VDNA_POLL_INTERVAL_SECS");
        std::env::remove_var("VDNA_POLL_MAX_ATTEMPTS");
        std::env::remove_var("VDNA_SETTLE_DELAY_MS");
        std::env::remove_var("VDNA_ACCEPT_REFRESH_DELAY_MS");

        assert_eq!(config.interval, Duration::from_secs(2));
        assert!(!config.is_bounded());
        assert_eq!(config.settle_delay, Duration::from_millis(250));
        assert_eq!(config.accept_refresh_delay, Duration::from_millis(500));
    }

    #[test]
    #[serial]
    fn test_zero_interval_falls_back() {
        std::env::set_var("VDNA_POLL_INTERVAL_SECS", "0");
        let config = PollerConfig::from_env();
        std::env::remove_var("VDNA_POLL_INTERVAL_SECS");

        assert_eq!(config.interval, Duration::from_secs(5));
    }
}
