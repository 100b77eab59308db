//! 16-bit sequence-number arithmetic.
//!
//! Sequence numbers live in the space `1..=65535`; 0 is reserved and never
//! assigned to a fragment.  The successor of 65535 is therefore 1, and every
//! distance is measured modulo [`SPACE`].
//!
//! Ordering between two sequence numbers is only meaningful while they are
//! less than half the space apart, which [`crate::config::MAX_WINDOW_SIZE`]
//! guarantees for every pair inside one send window.

use std::fmt;

/// Number of usable sequence numbers (0 excluded).
pub const SPACE: u32 = u16::MAX as u32;

/// A wire sequence number in `1..=65535`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeqNum(u16);

impl SeqNum {
    /// The sequence number of the first fragment of every session.
    pub const FIRST: SeqNum = SeqNum(1);

    /// Wrap a raw wire value.  Returns `None` for the reserved value 0.
    pub fn new(raw: u16) -> Option<Self> {
        (raw != 0).then_some(Self(raw))
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Sequence number `n` steps after `self`, skipping the reserved 0.
    pub fn advance(self, n: u32) -> Self {
        let zero_based = (u32::from(self.0) - 1 + n % SPACE) % SPACE;
        Self((zero_based + 1) as u16)
    }

    /// The next sequence number.
    pub fn succ(self) -> Self {
        self.advance(1)
    }

    /// Number of steps from `self` forward to `later`, in `0..SPACE`.
    pub fn distance_to(self, later: SeqNum) -> u32 {
        (u32::from(later.0) + SPACE - u32::from(self.0)) % SPACE
    }

    /// `true` when `self` lies in the half-open range `[start, end)`.
    pub fn in_range(self, start: SeqNum, end: SeqNum) -> bool {
        start.distance_to(self) < start.distance_to(end)
    }
}

impl fmt::Display for SeqNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
