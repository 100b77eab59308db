//! Session configuration.
//!
//! [`SessionConfig`] carries the two tunables a sender exposes: window size
//! and retransmission timeout.  The fragment size is fixed at
//! [`crate::datagram::MAX_PAYLOAD_LENGTH`].

use std::time::Duration;

use thiserror::Error;

use crate::seq;

/// Default number of fragments in flight.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Default retransmission timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Largest usable window: sequence comparisons need every in-flight pair
/// to be less than half the sequence space apart.
pub const MAX_WINDOW_SIZE: usize = (seq::SPACE / 2) as usize;

/// Tunables for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of unacknowledged fragments (N).
    pub window_size: usize,
    /// How long the oldest fragment may stay unacknowledged before the
    /// whole window is retransmitted.
    pub timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.window_size > MAX_WINDOW_SIZE {
            return Err(ConfigError::WindowTooLarge(self.window_size));
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

/// Rejected configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroWindow,
    #[error("window size {0} exceeds the maximum of {MAX_WINDOW_SIZE}")]
    WindowTooLarge(usize),
    #[error("retransmission timeout must be non-zero")]
    ZeroTimeout,
    #[error("{name} rate {rate} is outside [0, 1]")]
    InvalidRate { name: &'static str, rate: f64 },
}
