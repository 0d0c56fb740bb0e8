use std::borrow::Cow;
use std::fmt;

use crate::error::Error;

/// Fixed-capacity circular byte buffer.
///
/// The backing store holds `capacity + 1` bytes. One slot always stays unused
/// so that `head == tail` can only mean "empty". The store is allocated once
/// and never grows.
pub struct CircularBuffer {
    buffer: Box<[u8]>,
    head: usize,
    tail: usize,
    capacity: usize,
}

impl CircularBuffer {
    /// Create an empty buffer able to hold `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity(capacity));
        }
        let size = capacity
            .checked_add(1)
            .ok_or(Error::InvalidCapacity(capacity))?;

        Ok(Self {
            buffer: vec![0; size].into_boxed_slice(),
            head: 0,
            tail: 0,
            capacity,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Physical index of the oldest unread byte.
    pub fn head(&self) -> usize {
        self.head
    }

    /// Physical index one past the newest written byte.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Number of buffered bytes.
    pub fn used(&self) -> usize {
        if self.tail >= self.head {
            self.tail - self.head
        } else {
            self.tail + self.buffer.len() - self.head
        }
    }

    pub fn unused(&self) -> usize {
        self.capacity - self.used()
    }

    pub fn is_empty(&self) -> bool {
        self.used() == 0
    }

    pub fn is_full(&self) -> bool {
        self.used() == self.capacity
    }

    /// Append as many bytes of `input` as fit.
    ///
    /// Returns the number of bytes written. When the buffer fills up before
    /// `input` is exhausted, the bytes that did fit stay written and
    /// `Error::BufferFull` reports how many there were.
    pub fn write(&mut self, input: &[u8]) -> Result<usize, Error> {
        if input.is_empty() {
            return Ok(0);
        }

        let end = self.write_end();
        let mut written;
        if self.tail <= end {
            written = copy_into(&mut self.buffer[self.tail..end], input);
        } else {
            // Free space wraps: fill up to the physical end, then from 0.
            written = copy_into(&mut self.buffer[self.tail..], input);
            if written < input.len() {
                written += copy_into(&mut self.buffer[..end], &input[written..]);
            }
        }
        self.tail = (self.tail + written) % self.buffer.len();

        if written < input.len() {
            return Err(Error::BufferFull { written });
        }
        Ok(written)
    }

    /// Peek at the next `n` buffered bytes without consuming them.
    ///
    /// `n >= capacity` returns everything buffered. A request for more than
    /// `used()` bytes is silently shortened to what is available. The view is
    /// borrowed unless the bytes wrap around the end of storage, in which case
    /// the two segments are copied into one owned vector.
    pub fn next_bytes(&self, n: usize) -> Cow<'_, [u8]> {
        if n >= self.capacity {
            return self.bytes();
        }
        let n = n.min(self.used());

        let (front, back) = self.as_slices();
        if n <= front.len() {
            return Cow::Borrowed(&front[..n]);
        }
        Cow::Owned(concat(front, &back[..n - front.len()]))
    }

    /// Discard up to `n` buffered bytes and return the new `head` position.
    ///
    /// Consuming everything (or more) resets the buffer to its initial state.
    pub fn consume(&mut self, n: usize) -> usize {
        if n == 0 {
            return self.head;
        }
        if n >= self.used() {
            self.reset();
        } else {
            self.head = (self.head + n) % self.buffer.len();
        }
        self.head
    }

    /// Everything currently buffered.
    ///
    /// Copies when the region wraps, so prefer `next_bytes` or `as_slices` on
    /// hot paths.
    pub fn bytes(&self) -> Cow<'_, [u8]> {
        match self.as_slices() {
            (front, []) => Cow::Borrowed(front),
            (front, back) => Cow::Owned(concat(front, back)),
        }
    }

    /// The buffered bytes as their physical segments, oldest first.
    ///
    /// The second slice is empty unless the region wraps.
    pub fn as_slices(&self) -> (&[u8], &[u8]) {
        if self.tail >= self.head {
            (&self.buffer[self.head..self.tail], &self.buffer[..0])
        } else {
            (&self.buffer[self.head..], &self.buffer[..self.tail])
        }
    }

    pub fn reset(&mut self) {
        self.head = 0;
        self.tail = 0;
    }

    /// Free space starting at `tail`, if it does not wrap around.
    pub(crate) fn contiguous_free_mut(&mut self) -> Option<&mut [u8]> {
        let end = self.write_end();
        if self.tail <= end {
            Some(&mut self.buffer[self.tail..end])
        } else if end == 0 {
            Some(&mut self.buffer[self.tail..])
        } else {
            None
        }
    }

    /// Advance `tail` over `n` bytes filled in through `contiguous_free_mut`.
    pub(crate) fn commit_write(&mut self, n: usize) {
        debug_assert!(n <= self.unused());
        self.tail = (self.tail + n) % self.buffer.len();
    }

    /// The reserved slot right before `head`; writes stop there.
    fn write_end(&self) -> usize {
        if self.head == 0 {
            self.buffer.len() - 1
        } else {
            self.head - 1
        }
    }
}

impl fmt::Debug for CircularBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CircularBuffer")
            .field("capacity", &self.capacity)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .field("used", &self.used())
            .finish()
    }
}

fn copy_into(dst: &mut [u8], src: &[u8]) -> usize {
    let n = dst.len().min(src.len());
    dst[..n].copy_from_slice(&src[..n]);
    n
}

fn concat(front: &[u8], back: &[u8]) -> Vec<u8> {
    let mut joined = Vec::with_capacity(front.len() + back.len());
    joined.extend_from_slice(front);
    joined.extend_from_slice(back);
    joined
}
