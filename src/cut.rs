//! Bounded accumulator for field data split across chunk boundaries.
//!
//! The cut buffer holds the prefix of a field whose remaining bytes have not
//! arrived yet, and reassembles quoted fields whose escaped quotes must be
//! collapsed. Its capacity is the configured maximum field length; exceeding
//! it is the only way a field can be too long.

/// Error returned when an append would exceed the configured capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutOverflow;

/// Reusable bounded byte accumulator.
///
/// Backing storage is reserved lazily on first append, so tokenizers for
/// streams that never split a field allocate nothing. The buffer is reset at
/// every field boundary and reallocated only through
/// [`CutBuffer::set_capacity`], which must happen between streams.
#[derive(Debug)]
pub struct CutBuffer {
    buf: Vec<u8>,
    capacity: usize,
}

impl CutBuffer {
    /// Create a cut buffer bounded at `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::new(),
            capacity,
        }
    }

    /// Append bytes, truncating at capacity.
    ///
    /// On overflow the fitting prefix is kept, the rest is discarded, and
    /// `Err(CutOverflow)` is returned so the caller can report the oversized
    /// field exactly once.
    pub fn append(&mut self, bytes: &[u8]) -> Result<(), CutOverflow> {
        if self.buf.capacity() == 0 {
            self.buf.reserve_exact(self.capacity);
        }
        let room = self.capacity - self.buf.len();
        if bytes.len() <= room {
            self.buf.extend_from_slice(bytes);
            Ok(())
        } else {
            self.buf.extend_from_slice(&bytes[..room]);
            Err(CutOverflow)
        }
    }

    /// Bytes accumulated so far.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Configured maximum field length.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reset to empty, keeping the allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Replace the capacity bound, dropping any held data and allocation.
    ///
    /// Only valid between streams, never mid-parse.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.buf = Vec::new();
        self.capacity = capacity;
    }
}
