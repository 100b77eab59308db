//! Per-session leveled logger.
//!
//! The session owns a [`SessionLog`] carrying its own verbosity, so two
//! sessions in one process can log at different levels and nothing relies
//! on a mutable global threshold.  Records that pass the session's level are
//! forwarded to the `log` facade; the binary installs `env_logger` as the
//! sink.

use std::fmt;

use log::{Level, LevelFilter};

/// Target every session record is emitted under.
pub const TARGET: &str = "rdt_over_udp::session";

/// Explicitly leveled handle to the `log` facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionLog {
    level: LevelFilter,
}

impl Default for SessionLog {
    fn default() -> Self {
        Self::new(LevelFilter::Info)
    }
}

impl SessionLog {
    pub fn new(level: LevelFilter) -> Self {
        Self { level }
    }

    /// A logger that drops everything.
    pub fn off() -> Self {
        Self::new(LevelFilter::Off)
    }

    /// Map the numeric `-d` verbosity (0 = off … 5 = trace) to a level.
    /// Values above 5 saturate at trace.
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => LevelFilter::Off,
            1 => LevelFilter::Error,
            2 => LevelFilter::Warn,
            3 => LevelFilter::Info,
            4 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };
        Self::new(level)
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.enabled(level) {
            log::log!(target: TARGET, level, "{args}");
        }
    }

    pub fn error(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Error, args);
    }

    pub fn warn(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Warn, args);
    }

    pub fn info(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Info, args);
    }

    pub fn debug(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Debug, args);
    }

    pub fn trace(&self, args: fmt::Arguments<'_>) {
        self.log(Level::Trace, args);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(SessionLog::from_verbosity(0).level(), LevelFilter::Off);
        assert_eq!(SessionLog::from_verbosity(2).level(), LevelFilter::Warn);
        assert_eq!(SessionLog::from_verbosity(3).level(), LevelFilter::Info);
        assert_eq!(SessionLog::from_verbosity(9).level(), LevelFilter::Trace);
    }

    #[test]
    fn enabled_respects_threshold() {
        let log = SessionLog::new(LevelFilter::Warn);
        assert!(log.enabled(Level::Error));
        assert!(log.enabled(Level::Warn));
        assert!(!log.enabled(Level::Info));
        assert!(!SessionLog::off().enabled(Level::Error));
    }
}
