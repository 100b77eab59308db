//! Sender session phases.
//!
//! The session is driven by two flags (`all_sent`, `all_acked`) plus the
//! window occupancy; [`SessionPhase`] names the combinations so transitions
//! can be logged and asserted on.
//!
//! ```text
//!  FILLING ⇄ WAITING ──terminal sent──▶ DRAINING ──final ACK──▶ DONE
//!     │                                    ▲
//!     └───────────terminal sent────────────┘
//! ```

/// Where a sender session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Room in the window and more input to read.
    #[default]
    Filling,
    /// Window full; waiting for an ACK or a timeout.
    Waiting,
    /// Terminal fragment sent; waiting for the remaining ACKs.
    Draining,
    /// Every fragment, including the terminal one, acknowledged.
    Done,
}

impl SessionPhase {
    /// Derive the phase from session flags and window room.
    pub fn from_flags(all_sent: bool, all_acked: bool, can_admit: bool) -> Self {
        match (all_sent, all_acked) {
            (true, true) => Self::Done,
            (true, false) => Self::Draining,
            (false, _) if can_admit => Self::Filling,
            (false, _) => Self::Waiting,
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Filling => "FILLING",
            Self::Waiting => "WAITING",
            Self::Draining => "DRAINING",
            Self::Done => "DONE",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phases_from_flags() {
        assert_eq!(SessionPhase::from_flags(false, false, true), SessionPhase::Filling);
        assert_eq!(SessionPhase::from_flags(false, false, false), SessionPhase::Waiting);
        assert_eq!(SessionPhase::from_flags(true, false, true), SessionPhase::Draining);
        assert_eq!(SessionPhase::from_flags(true, true, true), SessionPhase::Done);
    }

    #[test]
    fn display_is_upper_case() {
        assert_eq!(SessionPhase::Draining.to_string(), "DRAINING");
    }
}
