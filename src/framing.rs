//! Length-delimited records on top of [`CircularBuffer`].
//!
//! A record is laid out as
//!
//! ```text
//! '(' | u32 LE total length | payload | ')'
//! ```
//!
//! where the length counts every byte of the record, markers included.

use log::debug;

use crate::circular_buffer::CircularBuffer;
use crate::error::Error;

pub const START_MARKER: u8 = b'(';
pub const END_MARKER: u8 = b')';
/// Start marker plus the length field.
pub const HEADER_LEN: usize = 5;
pub const TRAILER_LEN: usize = 1;

/// Frame `payload` as a single record.
pub fn encode(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let len = HEADER_LEN + payload.len() + TRAILER_LEN;
    let declared = u32::try_from(len).map_err(|_| Error::RecordTooLarge {
        len,
        capacity: u32::MAX as usize,
    })?;

    let mut record = Vec::with_capacity(len);
    record.push(START_MARKER);
    record.extend_from_slice(&declared.to_le_bytes());
    record.extend_from_slice(payload);
    record.push(END_MARKER);
    Ok(record)
}

/// Take the next complete record out of `buf` and return its payload.
///
/// Returns `Ok(None)` while the record is still incomplete. A malformed header
/// or trailer is an error and leaves the buffer untouched.
pub fn next_record(buf: &mut CircularBuffer) -> Result<Option<Vec<u8>>, Error> {
    if buf.used() < HEADER_LEN {
        return Ok(None);
    }

    let len = {
        let header = buf.next_bytes(HEADER_LEN);
        if header[0] != START_MARKER {
            return Err(Error::BadStartMarker(header[0]));
        }
        u32::from_le_bytes([header[1], header[2], header[3], header[4]]) as usize
    };
    if len < HEADER_LEN + TRAILER_LEN {
        return Err(Error::RecordTooShort(len));
    }
    if len > buf.capacity() {
        return Err(Error::RecordTooLarge { len, capacity: buf.capacity() });
    }
    if buf.used() < len {
        debug!("Waiting for {} more bytes of a {} byte record", len - buf.used(), len);
        return Ok(None);
    }

    let payload = {
        let record = buf.next_bytes(len);
        let last = record[len - 1];
        if last != END_MARKER {
            return Err(Error::BadEndMarker(last));
        }
        record[HEADER_LEN..len - TRAILER_LEN].to_vec()
    };
    buf.consume(len);
    Ok(Some(payload))
}

/// Hand every complete record in `buf` to `on_record`, returning how many there were.
pub fn drain_records<F>(buf: &mut CircularBuffer, mut on_record: F) -> Result<usize, Error>
where
    F: FnMut(Vec<u8>),
{
    let mut count = 0;
    while let Some(payload) = next_record(buf)? {
        on_record(payload);
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_layout() {
        let record = encode(b"{}").unwrap();
        assert_eq!(record, [b'(', 8, 0, 0, 0, b'{', b'}', b')']);
        assert_eq!(encode(b"").unwrap(), [b'(', 6, 0, 0, 0, b')']);
    }

    #[test]
    fn test_incomplete_header_waits() {
        let mut buf = CircularBuffer::new(32).unwrap();
        buf.write(b"(\x08\x00").unwrap();
        assert!(next_record(&mut buf).unwrap().is_none());
        assert_eq!(buf.used(), 3);
    }

    #[test]
    fn test_incomplete_payload_waits() {
        let mut buf = CircularBuffer::new(32).unwrap();
        let record = encode(b"payload").unwrap();
        buf.write(&record[..record.len() - 1]).unwrap();
        assert!(next_record(&mut buf).unwrap().is_none());

        buf.write(&record[record.len() - 1..]).unwrap();
        assert_eq!(next_record(&mut buf).unwrap().unwrap(), b"payload");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_record_across_wrap() {
        let mut buf = CircularBuffer::new(16).unwrap();
        let first = encode(b"filler").unwrap();
        let second = encode(b"wrapped").unwrap();
        buf.write(&first).unwrap();
        buf.write(&second[..3]).unwrap();
        assert_eq!(next_record(&mut buf).unwrap().unwrap(), b"filler");

        buf.write(&second[3..]).unwrap();
        assert!(buf.tail() < buf.head());
        assert_eq!(next_record(&mut buf).unwrap().unwrap(), b"wrapped");
        assert!(buf.is_empty());
    }

    #[test]
    fn test_drain_multiple_records() {
        let mut buf = CircularBuffer::new(64).unwrap();
        for payload in [&b"one"[..], b"two", b"three"] {
            buf.write(&encode(payload).unwrap()).unwrap();
        }
        buf.write(b"(\x20").unwrap();

        let mut seen = Vec::new();
        let count = drain_records(&mut buf, |p| seen.push(p)).unwrap();
        assert_eq!(count, 3);
        assert_eq!(seen, vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()]);
        assert_eq!(buf.used(), 2);
    }

    #[test]
    fn test_bad_start_marker() {
        let mut buf = CircularBuffer::new(32).unwrap();
        buf.write(b"[\x06\x00\x00\x00]").unwrap();
        assert!(matches!(next_record(&mut buf), Err(Error::BadStartMarker(b'['))));
        assert_eq!(buf.used(), 6);
    }

    #[test]
    fn test_bad_end_marker() {
        let mut buf = CircularBuffer::new(32).unwrap();
        buf.write(b"(\x07\x00\x00\x00x]").unwrap();
        assert!(matches!(next_record(&mut buf), Err(Error::BadEndMarker(b']'))));
        assert_eq!(buf.used(), 7);
    }

    #[test]
    fn test_declared_length_out_of_range() {
        let mut buf = CircularBuffer::new(32).unwrap();
        buf.write(b"(\x02\x00\x00\x00").unwrap();
        assert!(matches!(next_record(&mut buf), Err(Error::RecordTooShort(2))));

        buf.reset();
        buf.write(b"(\x40\x00\x00\x00").unwrap();
        assert!(matches!(
            next_record(&mut buf),
            Err(Error::RecordTooLarge { len: 64, capacity: 32 })
        ));
    }
}
