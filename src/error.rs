// src/error.rs

use std::fmt;
use std::io;

/// Custom `Error` type for buffer, reader and framing failures.
#[derive(Debug)]
pub enum Error {
    /// The buffer was constructed with an unusable capacity.
    InvalidCapacity(usize),
    /// Not every input byte fit; `written` bytes were still accepted.
    BufferFull { written: usize },
    /// Error reported by the reader handed to the adapter.
    Io(io::Error),
    /// A record did not begin with the start marker.
    BadStartMarker(u8),
    /// A record did not end with the end marker.
    BadEndMarker(u8),
    /// A record header declared a length smaller than its own framing.
    RecordTooShort(usize),
    /// A record header declared a length the buffer can never hold.
    RecordTooLarge { len: usize, capacity: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity(cap) => write!(f, "Invalid buffer capacity: {}", cap),
            Error::BufferFull { written } => {
                write!(f, "Buffer is full ({} bytes accepted)", written)
            }
            Error::Io(e) => write!(f, "Read error: {}", e),
            Error::BadStartMarker(b) => write!(f, "Bad record start marker: 0x{:02x}", b),
            Error::BadEndMarker(b) => write!(f, "Bad record end marker: 0x{:02x}", b),
            Error::RecordTooShort(len) => write!(f, "Record length {} is too short", len),
            Error::RecordTooLarge { len, capacity } => write!(
                f,
                "Record length {} exceeds buffer capacity {}",
                len, capacity
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl Error {
    /// True for the recoverable backpressure condition.
    pub fn is_buffer_full(&self) -> bool {
        matches!(self, Error::BufferFull { .. })
    }

    /// Bytes accepted before the buffer filled up, zero for every other variant.
    pub fn written(&self) -> usize {
        match self {
            Error::BufferFull { written } => *written,
            _ => 0,
        }
    }
}
