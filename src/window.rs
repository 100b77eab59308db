//! Go-Back-N send window.
//!
//! [`SendWindow`] holds up to `capacity` in-flight datagrams in a fixed ring
//! of slots.  Multiple datagrams may be outstanding simultaneously; all of
//! them are covered by one cumulative acknowledgment and one timer.
//!
//! # Protocol contract
//!
//! - At most `capacity` datagrams are in flight: `base ≤ next_seq ≤ base + N`.
//! - ACKs are **cumulative**: `ack = K` retires every fragment up to and
//!   including `K`.
//! - ACKs below `base` (stale) or at/after `next_seq` (never sent) are
//!   ignored and leave the window untouched.
//! - On timeout, the caller retransmits every datagram yielded by
//!   [`SendWindow::outstanding`] (go back to N).
//!
//! This module only manages state; all transport I/O is the caller's
//! responsibility.

use thiserror::Error;

use crate::datagram::Datagram;
use crate::seq::SeqNum;

/// Misuse of the window by its caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WindowError {
    #[error("window capacity must be at least 1")]
    ZeroCapacity,
    #[error("admit called on a full window ({capacity} in flight)")]
    Full { capacity: usize },
    #[error("admitted datagram carries seq {got}, expected next_seq {expected}")]
    OutOfOrder { expected: u16, got: u16 },
}

// ---------------------------------------------------------------------------
// AckOutcome
// ---------------------------------------------------------------------------

/// What an acknowledgment did to the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckOutcome {
    /// `base` moved forward past `retired` fragments.
    Advanced { retired: usize },
    /// The ACK was below `base`; nothing changed.
    Stale,
    /// The ACK named a sequence number that was never sent, or 0.
    OutOfWindow,
}

// ---------------------------------------------------------------------------
// SendWindow
// ---------------------------------------------------------------------------

/// Go-Back-N send-side window.
///
/// # Sequence-number layout
///
/// ```text
///    base            next_seq        base + N
///      │                 │               │
///  ────┼─────────────────┼───────────────┼──────▶ seq space
///      │ <── in flight ─▶│ <── usable ──▶│
/// ```
#[derive(Debug)]
pub struct SendWindow {
    /// Oldest unacknowledged sequence number (left window edge).
    base: SeqNum,

    /// Sequence number assigned to the next admitted fragment.
    next_seq: SeqNum,

    /// Ring index holding the datagram for `base`.
    base_slot: usize,

    /// Fixed ring of slots; `None` until a slot is first used.
    entries: Vec<Option<Datagram>>,
}

impl SendWindow {
    /// Create an empty window of `capacity` slots starting at
    /// [`SeqNum::FIRST`].
    pub fn new(capacity: usize) -> Result<Self, WindowError> {
        if capacity == 0 {
            return Err(WindowError::ZeroCapacity);
        }
        Ok(Self {
            base: SeqNum::FIRST,
            next_seq: SeqNum::FIRST,
            base_slot: SeqNum::FIRST.get() as usize % capacity,
            entries: vec![None; capacity],
        })
    }

    pub fn base(&self) -> SeqNum {
        self.base
    }

    pub fn next_seq(&self) -> SeqNum {
        self.next_seq
    }

    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    /// Number of datagrams awaiting acknowledgment (`next_seq − base`).
    pub fn in_flight(&self) -> usize {
        self.base.distance_to(self.next_seq) as usize
    }

    /// `true` when there is room for at least one more datagram.
    pub fn can_admit(&self) -> bool {
        self.in_flight() < self.capacity()
    }

    /// `true` when every admitted datagram has been acknowledged.
    pub fn is_drained(&self) -> bool {
        self.base == self.next_seq
    }

    /// Store a just-transmitted datagram at the slot of `next_seq` and
    /// advance `next_seq`.
    ///
    /// The terminal zero-length datagram advances `next_seq` like any other;
    /// the session stops admitting once it has been sent.  Fails without
    /// touching the window if it is full or `datagram.seq` is not
    /// `next_seq`.
    pub fn admit(&mut self, datagram: Datagram) -> Result<(), WindowError> {
        if !self.can_admit() {
            return Err(WindowError::Full {
                capacity: self.capacity(),
            });
        }
        if datagram.seq != self.next_seq.get() {
            return Err(WindowError::OutOfOrder {
                expected: self.next_seq.get(),
                got: datagram.seq,
            });
        }
        let slot = self.slot_of(self.next_seq);
        self.entries[slot] = Some(datagram);
        self.next_seq = self.next_seq.succ();
        Ok(())
    }

    /// Apply a cumulative acknowledgment for sequence number `ack`.
    ///
    /// Only an `ack` in `[base, next_seq)` advances the window.  An ACK at or
    /// beyond `next_seq` names a fragment that was never sent and is reported
    /// as [`AckOutcome::OutOfWindow`] rather than accepted, which keeps
    /// `base ≤ next_seq` under any input.
    pub fn apply_ack(&mut self, ack: u16) -> AckOutcome {
        let Some(ack) = SeqNum::new(ack) else {
            return AckOutcome::OutOfWindow;
        };
        if !ack.in_range(self.base, self.next_seq) {
            // Anything within one window below base is a late duplicate.
            let behind = ack.distance_to(self.base) as usize;
            return if behind > 0 && behind <= self.capacity() {
                AckOutcome::Stale
            } else {
                AckOutcome::OutOfWindow
            };
        }

        let retired = self.base.distance_to(ack) as usize + 1;
        self.base = ack.succ();
        self.base_slot = (self.base_slot + retired) % self.capacity();
        AckOutcome::Advanced { retired }
    }

    /// Iterate over every in-flight datagram from oldest to newest.
    ///
    /// Used by the session to retransmit the whole window on timeout.
    pub fn outstanding(&self) -> impl Iterator<Item = &Datagram> + '_ {
        let start = self.base;
        (0..self.in_flight() as u32).filter_map(move |offset| {
            let slot = self.slot_of(start.advance(offset));
            self.entries[slot].as_ref()
        })
    }

    /// Mutable variant of [`SendWindow::outstanding`], so retransmissions
    /// can reseal what they send.
    pub fn outstanding_mut(&mut self) -> impl Iterator<Item = &mut Datagram> + '_ {
        let capacity = self.capacity();
        let in_flight = self.in_flight();
        let base_slot = self.base_slot;
        // Rotate the ring so it starts at base, then keep the occupied prefix.
        let (tail, head) = self.entries.split_at_mut(base_slot);
        head.iter_mut()
            .chain(tail.iter_mut())
            .take(in_flight.min(capacity))
            .filter_map(Option::as_mut)
    }

    fn slot_of(&self, seq: SeqNum) -> usize {
        (self.base_slot + self.base.distance_to(seq) as usize) % self.capacity()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
