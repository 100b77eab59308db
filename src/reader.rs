//! Fragment reader.
//!
//! Splits an input stream into fragments of at most
//! [`MAX_PAYLOAD_LENGTH`] bytes.  A short read from the underlying source
//! does not end a fragment early; only end-of-file does, so every fragment
//! except the last is exactly full.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use crate::datagram::MAX_PAYLOAD_LENGTH;

/// Sequential fixed-size chunk reader.
#[derive(Debug)]
pub struct FragmentReader<R> {
    inner: R,
    bytes_read: u64,
    at_eof: bool,
}

impl FragmentReader<BufReader<File>> {
    /// Open `path` for buffered reading.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> FragmentReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            bytes_read: 0,
            at_eof: false,
        }
    }

    /// Read the next fragment.  An empty vector means the input is
    /// exhausted; every later call returns an empty vector too.
    pub fn next_fragment(&mut self) -> io::Result<Vec<u8>> {
        let mut chunk = vec![0u8; MAX_PAYLOAD_LENGTH];
        let mut filled = 0;
        while filled < chunk.len() && !self.at_eof {
            match self.inner.read(&mut chunk[filled..]) {
                Ok(0) => self.at_eof = true,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        chunk.truncate(filled);
        self.bytes_read += filled as u64;
        Ok(chunk)
    }

    /// Total payload bytes handed out so far.
    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }
}
