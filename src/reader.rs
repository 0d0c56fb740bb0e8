// src/reader.rs

use std::io::Read;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::circular_buffer::CircularBuffer;
use crate::error::Error;

impl CircularBuffer {
    /// Fill free space with a single `read` call on `reader`.
    ///
    /// Fails with `Error::BufferFull` without touching the reader when there is
    /// no room. When the free space wraps around the end of storage the bytes
    /// go through a scratch buffer and `write`. Reader errors are returned as
    /// `Error::Io`; `Ok(0)` means the reader reported end of stream.
    pub fn read_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<usize, Error> {
        if self.is_full() {
            return Err(Error::BufferFull { written: 0 });
        }

        if let Some(free) = self.contiguous_free_mut() {
            let n = reader.read(free)?;
            self.commit_write(n);
            return Ok(n);
        }

        let mut scratch = vec![0u8; self.unused()];
        let n = reader.read(&mut scratch)?;
        self.write(&scratch[..n])
    }

    /// Async twin of [`read_from`](Self::read_from).
    ///
    /// Dropping the future before it resolves leaves the buffer unchanged.
    pub async fn read_from_async<R: AsyncRead + Unpin + ?Sized>(
        &mut self,
        reader: &mut R,
    ) -> Result<usize, Error> {
        if self.is_full() {
            return Err(Error::BufferFull { written: 0 });
        }

        if let Some(free) = self.contiguous_free_mut() {
            let n = reader.read(free).await?;
            self.commit_write(n);
            return Ok(n);
        }

        let mut scratch = vec![0u8; self.unused()];
        let n = reader.read(&mut scratch).await?;
        self.write(&scratch[..n])
    }
}
