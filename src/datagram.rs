//! Wire-format definitions for protocol datagrams.
//!
//! Every unit exchanged between sender and receiver is a [`Datagram`].  This
//! module is responsible for:
//! - Defining the on-wire binary layout (header fields, payload).
//! - Computing and validating the Internet checksum over a datagram.
//! - Serialising a [`Datagram`] into a byte buffer ready for transmission.
//! - Deserialising a raw byte slice back into a [`Datagram`], returning errors
//!   for malformed or truncated input.
//!
//! No I/O happens here.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Sequence Number        |      Acknowledgment Number    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |  Payload Len  |               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+               +
//! |                     Payload (0..=255 bytes) ...               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total header size: [`HEADER_LEN`] = 7 bytes.
//! seq(2) + ack(2) + checksum(2) + payload_len(1)
//!
//! A payload length of zero marks the end of the stream.

use thiserror::Error;

/// Byte length of the fixed-size header on the wire.
pub const HEADER_LEN: usize = 7;

/// Largest payload a single datagram may carry.
pub const MAX_PAYLOAD_LENGTH: usize = u8::MAX as usize;

/// Largest datagram that can appear on the wire.
pub const MAX_DATAGRAM_LEN: usize = HEADER_LEN + MAX_PAYLOAD_LENGTH;

// Byte offsets of each field within the serialised header.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 2;
const OFF_CHECKSUM: usize = 4;
const OFF_PAYLOAD_LEN: usize = 6;

/// A complete protocol datagram: header fields + payload bytes.
///
/// Fields are in host byte order; [`Datagram::encode`] converts to big-endian
/// on the wire and [`Datagram::decode`] converts back.  The payload length is
/// never stored separately: `payload.len()` is authoritative and capped at
/// [`MAX_PAYLOAD_LENGTH`] by the constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// Sender-assigned sequence number; 0 is never used for data.
    pub seq: u16,
    /// Highest in-order sequence number received (receiver → sender only).
    pub ack: u16,
    /// Internet checksum (RFC 1071) as last stored by [`Datagram::seal`] or
    /// read off the wire.
    pub checksum: u16,
    payload: Vec<u8>,
}

impl Datagram {
    /// Build a data datagram carrying `payload`.
    pub fn data(seq: u16, payload: Vec<u8>) -> Result<Self, DatagramError> {
        if payload.len() > MAX_PAYLOAD_LENGTH {
            return Err(DatagramError::PayloadTooLong(payload.len()));
        }
        Ok(Self {
            seq,
            ack: 0,
            checksum: 0,
            payload,
        })
    }

    /// Build the zero-length datagram that terminates the stream.
    pub fn end_of_stream(seq: u16) -> Self {
        Self {
            seq,
            ack: 0,
            checksum: 0,
            payload: Vec::new(),
        }
    }

    /// Build an acknowledgment for everything up to and including `ack`.
    pub fn ack(ack: u16) -> Self {
        Self {
            seq: 0,
            ack,
            checksum: 0,
            payload: Vec::new(),
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Mutable access for fault injection; the cap still holds because the
    /// slice cannot grow.
    pub(crate) fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.payload
    }

    pub fn payload_len(&self) -> u8 {
        self.payload.len() as u8
    }

    /// `true` for the zero-length end-of-stream marker.
    pub fn is_end_of_stream(&self) -> bool {
        self.payload.is_empty()
    }

    /// Recompute the checksum and store it in the header.
    pub fn seal(&mut self) {
        self.checksum = compute_checksum(self);
    }

    /// Serialise this datagram into a newly allocated byte vector.
    ///
    /// The stored `checksum` is written as-is; call [`Datagram::seal`] first.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_LEN + self.payload.len()];
        write_header(&mut buf, self, self.checksum);
        buf[HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Datagram`] from a raw byte slice.
    ///
    /// Returns [`Err`] if:
    /// - `buf` is shorter than [`HEADER_LEN`], or
    /// - the `payload_len` field claims more bytes than `buf` holds.
    ///
    /// Bytes past the declared payload are ignored so peers that always
    /// transmit the full fixed-capacity payload region still parse.  The
    /// checksum is **not** verified here; see [`validate_checksum`].
    pub fn decode(buf: &[u8]) -> Result<Self, DatagramError> {
        if buf.len() < HEADER_LEN {
            return Err(DatagramError::BufferTooShort(buf.len()));
        }

        let seq = u16::from_be_bytes([buf[OFF_SEQ], buf[OFF_SEQ + 1]]);
        let ack = u16::from_be_bytes([buf[OFF_ACK], buf[OFF_ACK + 1]]);
        let checksum = u16::from_be_bytes([buf[OFF_CHECKSUM], buf[OFF_CHECKSUM + 1]]);
        let payload_len = buf[OFF_PAYLOAD_LEN] as usize;

        let end = HEADER_LEN + payload_len;
        if buf.len() < end {
            return Err(DatagramError::LengthMismatch {
                declared: payload_len,
                available: buf.len() - HEADER_LEN,
            });
        }

        Ok(Self {
            seq,
            ack,
            checksum,
            payload: buf[HEADER_LEN..end].to_vec(),
        })
    }
}

/// Errors that can arise when building or parsing a datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DatagramError {
    #[error("buffer of {0} bytes is too short to contain a header")]
    BufferTooShort(usize),
    #[error("payload_len field claims {declared} bytes but only {available} follow the header")]
    LengthMismatch { declared: usize, available: usize },
    #[error("payload of {0} bytes exceeds the {MAX_PAYLOAD_LENGTH}-byte limit")]
    PayloadTooLong(usize),
}

/// Checksum over the datagram's logical content.
///
/// The header is laid out exactly as on the wire with the checksum field
/// zeroed, followed by the used payload bytes; memory layout and any bytes
/// past the payload length never contribute.
pub fn compute_checksum(datagram: &Datagram) -> u16 {
    let mut header = [0u8; HEADER_LEN];
    write_header(&mut header, datagram, 0);
    internet_checksum(&header, &datagram.payload)
}

/// `true` when the stored checksum matches the recomputed one.
pub fn validate_checksum(datagram: &Datagram) -> bool {
    compute_checksum(datagram) == datagram.checksum
}

fn write_header(buf: &mut [u8], datagram: &Datagram, checksum: u16) {
    buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&datagram.seq.to_be_bytes());
    buf[OFF_ACK..OFF_ACK + 2].copy_from_slice(&datagram.ack.to_be_bytes());
    buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&checksum.to_be_bytes());
    buf[OFF_PAYLOAD_LEN] = datagram.payload_len();
}

/// Compute the Internet checksum (RFC 1071) over `header ++ payload`.
///
/// Sum consecutive 16-bit big-endian words, fold the carry, return the
/// one's-complement.  The two slices are treated as one contiguous buffer,
/// so an odd-length header pairs its last byte with the first payload byte.
fn internet_checksum(header: &[u8], payload: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut pending: Option<u8> = None;

    for &byte in header.iter().chain(payload.iter()) {
        match pending.take() {
            Some(high) => sum += u32::from(u16::from_be_bytes([high, byte])),
            None => pending = Some(byte),
        }
    }
    // Odd trailing byte: pad with a zero on the right.
    if let Some(high) = pending {
        sum += u32::from(high) << 8;
    }

    // Fold 32-bit sum into 16 bits.
    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}
