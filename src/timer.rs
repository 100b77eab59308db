//! Retransmission timer.
//!
//! Go-Back-N runs a **single** timer per window.  The session decides when
//! it is armed, stopped and restarted; the timer itself only answers "has the
//! deadline passed?".  This module provides:
//! - [`RetransmitTimer`]: the capability the session consumes.
//! - [`DeadlineTimer`]: an implementation on `tokio::time::Instant`, so
//!   tests running with paused tokio time control expiry exactly.
//!
//! A timer never restarts itself: once [`RetransmitTimer::expired`] has
//! reported an expiry the timer is disarmed until the next `start`.

use std::time::Duration;

use tokio::time::Instant;

/// Start / stop / poll capability for the retransmission timer.
pub trait RetransmitTimer {
    /// Arm the timer, or re-arm it from now if it is already running.
    fn start(&mut self);

    /// Disarm the timer.  Idempotent.
    fn stop(&mut self);

    /// Non-blocking poll.  Returns `true` exactly once per expiry and
    /// disarms the timer.
    fn expired(&mut self) -> bool;

    /// When the armed timer will expire, or `None` while stopped.
    fn deadline(&self) -> Option<Instant>;

    /// `true` while armed.
    fn is_running(&self) -> bool {
        self.deadline().is_some()
    }
}

/// Fixed-timeout timer backed by `tokio::time::Instant`.
#[derive(Debug)]
pub struct DeadlineTimer {
    timeout: Duration,
    deadline: Option<Instant>,
}

impl DeadlineTimer {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl RetransmitTimer for DeadlineTimer {
    fn start(&mut self) {
        self.deadline = Some(Instant::now() + self.timeout);
    }

    fn stop(&mut self) {
        self.deadline = None;
    }

    fn expired(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    fn deadline(&self) -> Option<Instant> {
        self.deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stopped_timer_never_expires() {
        let mut t = DeadlineTimer::new(Duration::from_millis(100));
        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(!t.expired());
        assert!(!t.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn expires_once_after_timeout() {
        let mut t = DeadlineTimer::new(Duration::from_millis(100));
        t.start();
        tokio::time::advance(Duration::from_millis(99)).await;
        assert!(!t.expired());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(t.expired());
        // No auto-restart.
        assert!(!t.is_running());
        tokio::time::advance(Duration::from_millis(500)).await;
        assert!(!t.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pushes_deadline_out() {
        let mut t = DeadlineTimer::new(Duration::from_millis(100));
        t.start();
        tokio::time::advance(Duration::from_millis(80)).await;
        t.start();
        tokio::time::advance(Duration::from_millis(80)).await;
        assert!(!t.expired());
        tokio::time::advance(Duration::from_millis(20)).await;
        assert!(t.expired());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_pending_expiry() {
        let mut t = DeadlineTimer::new(Duration::from_millis(10));
        t.start();
        t.stop();
        tokio::time::advance(Duration::from_millis(50)).await;
        assert!(!t.expired());
        assert_eq!(t.deadline(), None);
    }
}
