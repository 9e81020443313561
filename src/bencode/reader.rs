//! Byte sources for the decoder.
//!
//! A [`ByteReader`] is a cursor over input bytes with one byte of lookahead.
//! [`BufferReader`] walks a fixed buffer; [`StreamReader`] pulls bytes from a
//! blocking [`Read`] one at a time (string payloads in bulk), keeping the byte
//! under the cursor buffered ahead of time so `peek` never blocks.

use super::error::BencodeError;
use crate::constants::STREAM_PREALLOC_LIMIT;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io::{ErrorKind, Read};
use tracing::trace;

/// Cursor-based access to a bencode byte source.
pub trait ByteReader {
    /// Returns the byte under the cursor, or `None` at end of input.
    fn peek(&self) -> Option<u8>;

    /// Returns the byte under the cursor and advances past it.
    fn read(&mut self) -> Result<u8, BencodeError>;

    /// Cursor position relative to the last [`clear`](ByteReader::clear).
    fn position(&self) -> usize;

    /// Drops every byte before the cursor and resets the cursor to 0.
    fn clear(&mut self);

    fn is_at_end(&self) -> bool {
        self.peek().is_none()
    }

    /// Consumes the next byte if it equals `byte`.
    fn match_byte(&mut self, byte: u8) -> Result<bool, BencodeError> {
        if self.peek() == Some(byte) {
            self.read()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Consumes the pending byte without retaining it.
    fn advance_and_clear(&mut self) -> Result<(), BencodeError> {
        self.read()?;
        self.clear();
        Ok(())
    }

    /// Reads exactly `len` bytes verbatim.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, BencodeError> {
        let mut buf = BytesMut::with_capacity(len.min(STREAM_PREALLOC_LIMIT));
        for _ in 0..len {
            buf.put_u8(self.read()?);
        }
        Ok(buf.freeze())
    }
}

/// A reader over a fixed, fully available buffer.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{BufferReader, ByteReader, Decoder, DecodeOptions, Value};
///
/// let mut reader = BufferReader::new(&b"i1ei2e"[..]);
/// let mut decoder = Decoder::new(DecodeOptions::default());
///
/// assert_eq!(decoder.decode(&mut reader).unwrap(), Some(Value::Integer(1)));
/// reader.clear();
/// assert_eq!(reader.remaining(), b"i2e");
/// ```
#[derive(Debug, Clone)]
pub struct BufferReader {
    data: Bytes,
    index: usize,
}

impl BufferReader {
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_index(data, 0)
    }

    /// Creates a reader whose cursor starts at `index`, clamped to the buffer length.
    pub fn with_index(data: impl Into<Bytes>, index: usize) -> Self {
        let data = data.into();
        let index = index.min(data.len());
        Self { data, index }
    }

    /// The unread bytes after the cursor.
    pub fn remaining(&self) -> &[u8] {
        &self.data[self.index..]
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl ByteReader for BufferReader {
    fn peek(&self) -> Option<u8> {
        self.data.get(self.index).copied()
    }

    fn read(&mut self) -> Result<u8, BencodeError> {
        let byte = self
            .peek()
            .ok_or_else(|| BencodeError::parse("unexpected end of input", self.index))?;
        self.index += 1;
        Ok(byte)
    }

    fn position(&self) -> usize {
        self.index
    }

    fn clear(&mut self) {
        trace!(dropped = self.index, "clearing buffer reader");
        self.data.advance(self.index);
        self.index = 0;
    }

    fn read_bytes(&mut self, len: usize) -> Result<Bytes, BencodeError> {
        let available = self.data.len() - self.index;
        if len > available {
            return Err(BencodeError::parse(
                format!(
                    "unexpected end of input: string needs {} bytes, {} remain",
                    len, available
                ),
                self.data.len(),
            ));
        }

        let bytes = self.data.slice(self.index..self.index + len);
        self.index += len;
        Ok(bytes)
    }
}

/// A reader over a blocking byte stream.
///
/// The byte under the cursor is always already buffered: construction reads
/// the first byte, and every [`read`](ByteReader::read) pulls one more byte
/// from the stream before handing back the previously buffered one. Reads
/// block for as long as the stream does; timeouts belong to the stream.
///
/// Reuse one `StreamReader` for consecutive values from the same stream, and
/// [`clear`](ByteReader::clear) it between values to keep the buffer small.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{decode_from_stream, DecodeOptions, StreamReader, Value};
/// use std::io::Cursor;
///
/// let mut reader = StreamReader::new(Cursor::new(b"4:spami7e".to_vec())).unwrap();
/// let options = DecodeOptions::default();
///
/// assert_eq!(decode_from_stream(&mut reader, &options).unwrap(), Some(Value::string("spam")));
/// assert_eq!(decode_from_stream(&mut reader, &options).unwrap(), Some(Value::Integer(7)));
/// assert_eq!(decode_from_stream(&mut reader, &options).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct StreamReader<R> {
    stream: R,
    buf: BytesMut,
    index: usize,
    closed: bool,
}

impl<R: Read> StreamReader<R> {
    /// Wraps `stream`, blocking until its first byte arrives or it closes.
    pub fn new(stream: R) -> Result<Self, BencodeError> {
        let mut reader = Self {
            stream,
            buf: BytesMut::with_capacity(64),
            index: 0,
            closed: false,
        };
        reader.fetch()?;
        Ok(reader)
    }

    fn fetch(&mut self) -> Result<(), BencodeError> {
        if self.closed {
            return Ok(());
        }

        let mut byte = [0u8; 1];
        loop {
            match self.stream.read(&mut byte) {
                Ok(0) => {
                    trace!(position = self.index, "stream closed");
                    self.closed = true;
                    return Ok(());
                }
                Ok(_) => {
                    self.buf.put_u8(byte[0]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Returns true once the stream has signalled end of data.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    /// Returns the underlying stream. Any buffered read-ahead byte is lost.
    pub fn into_inner(self) -> R {
        self.stream
    }
}

impl<R: Read> ByteReader for StreamReader<R> {
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.index).copied()
    }

    fn read(&mut self) -> Result<u8, BencodeError> {
        if self.index >= self.buf.len() {
            return Err(BencodeError::StreamClosed);
        }

        self.fetch()?;
        let byte = self.buf[self.index];
        self.index += 1;
        Ok(byte)
    }

    fn position(&self) -> usize {
        self.index
    }

    fn clear(&mut self) {
        trace!(dropped = self.index, "clearing stream reader");
        self.buf.advance(self.index);
        self.index = 0;
    }

    /// Reads the payload with `read_exact` in chunks of at most
    /// `STREAM_PREALLOC_LIMIT`, then fetches the next read-ahead byte.
    fn read_bytes(&mut self, len: usize) -> Result<Bytes, BencodeError> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        if self.index >= self.buf.len() {
            return Err(BencodeError::StreamClosed);
        }

        let end = self.index + len;
        while self.buf.len() < end {
            if self.closed {
                return Err(BencodeError::StreamClosed);
            }

            let start = self.buf.len();
            let chunk = (end - start).min(STREAM_PREALLOC_LIMIT);
            self.buf.resize(start + chunk, 0);
            if let Err(e) = self.stream.read_exact(&mut self.buf[start..]) {
                self.buf.truncate(start);
                if e.kind() == ErrorKind::UnexpectedEof {
                    trace!(position = start, "stream closed inside string");
                    self.closed = true;
                    return Err(BencodeError::StreamClosed);
                }
                return Err(e.into());
            }
        }

        self.fetch()?;
        let payload = Bytes::copy_from_slice(&self.buf[self.index..end]);
        self.index = end;
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// Hands out one byte per `read` call, failing once with `Interrupted`
    /// before the first byte.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        interrupted: bool,
    }

    impl Trickle {
        fn new(data: &[u8]) -> Self {
            Self {
                data: data.to_vec(),
                pos: 0,
                interrupted: false,
            }
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::new(ErrorKind::Interrupted, "try again"));
            }
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    /// Counts `read` calls on the wrapped stream.
    struct Counting {
        inner: Cursor<Vec<u8>>,
        calls: usize,
    }

    impl Read for Counting {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.calls += 1;
            self.inner.read(buf)
        }
    }

    struct Broken;

    impl Read for Broken {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_buffer_reader_peek_read() {
        let mut reader = BufferReader::new(&b"ab"[..]);
        assert_eq!(reader.peek(), Some(b'a'));
        assert_eq!(reader.read().unwrap(), b'a');
        assert!(reader.match_byte(b'b').unwrap());
        assert!(reader.is_at_end());
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_buffer_reader_read_past_end() {
        let mut reader = BufferReader::new(&b"x"[..]);
        reader.read().unwrap();
        let err = reader.read().unwrap_err();
        assert!(err.is_parse());
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_buffer_reader_match_miss_does_not_consume() {
        let mut reader = BufferReader::new(&b"x"[..]);
        assert!(!reader.match_byte(b'y').unwrap());
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_buffer_reader_with_index_clamps() {
        let reader = BufferReader::with_index(&b"abc"[..], 10);
        assert_eq!(reader.position(), 3);
        assert!(reader.is_at_end());

        let reader = BufferReader::with_index(&b"abc"[..], 1);
        assert_eq!(reader.remaining(), b"bc");
    }

    #[test]
    fn test_buffer_reader_clear() {
        let mut reader = BufferReader::new(&b"abcd"[..]);
        reader.read().unwrap();
        reader.read().unwrap();
        reader.clear();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.len(), 2);
        assert_eq!(reader.peek(), Some(b'c'));
    }

    #[test]
    fn test_buffer_reader_read_bytes() {
        let mut reader = BufferReader::new(&b"spam!"[..]);
        assert_eq!(reader.read_bytes(4).unwrap(), Bytes::from_static(b"spam"));
        assert_eq!(reader.peek(), Some(b'!'));
        assert!(reader.read_bytes(2).is_err());
        assert_eq!(reader.position(), 4);
    }

    #[test]
    fn test_stream_reader_read_ahead() {
        let mut reader = StreamReader::new(Trickle::new(b"ab")).unwrap();
        assert_eq!(reader.peek(), Some(b'a'));
        assert_eq!(reader.read().unwrap(), b'a');
        assert_eq!(reader.peek(), Some(b'b'));
        assert!(!reader.is_closed());
        assert_eq!(reader.read().unwrap(), b'b');
        assert!(reader.is_closed());
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_stream_reader_closed() {
        let mut reader = StreamReader::new(Cursor::new(b"a".to_vec())).unwrap();
        reader.read().unwrap();
        assert!(matches!(reader.read(), Err(BencodeError::StreamClosed)));
    }

    #[test]
    fn test_stream_reader_empty_stream() {
        let reader = StreamReader::new(Cursor::new(Vec::new())).unwrap();
        assert!(reader.is_closed());
        assert_eq!(reader.peek(), None);
    }

    #[test]
    fn test_stream_reader_io_error() {
        assert!(matches!(
            StreamReader::new(Broken),
            Err(BencodeError::Io(_))
        ));
    }

    #[test]
    fn test_stream_reader_clear_keeps_lookahead() {
        let mut reader = StreamReader::new(Trickle::new(b"abc")).unwrap();
        reader.read().unwrap();
        reader.clear();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.peek(), Some(b'b'));

        reader.advance_and_clear().unwrap();
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.peek(), Some(b'c'));
    }

    #[test]
    fn test_stream_reader_read_bytes() {
        let mut reader = StreamReader::new(Trickle::new(b"spam")).unwrap();
        assert_eq!(reader.read_bytes(3).unwrap(), Bytes::from_static(b"spa"));
        assert!(matches!(
            reader.read_bytes(2),
            Err(BencodeError::StreamClosed)
        ));
    }

    #[test]
    fn test_stream_reader_read_bytes_in_bulk() {
        let payload = vec![b'x'; 1000];
        let mut data = payload.clone();
        data.extend_from_slice(b"i1e");
        let stream = Counting {
            inner: Cursor::new(data),
            calls: 0,
        };

        let mut reader = StreamReader::new(stream).unwrap();
        assert_eq!(reader.read_bytes(1000).unwrap(), Bytes::from(payload));
        assert_eq!(reader.position(), 1000);
        assert_eq!(reader.peek(), Some(b'i'));
        assert!(reader.get_ref().calls <= 3);

        reader.clear();
        assert_eq!(reader.read().unwrap(), b'i');
        assert_eq!(reader.read().unwrap(), b'1');
    }

    #[test]
    fn test_stream_reader_read_bytes_to_end_of_stream() {
        let mut reader = StreamReader::new(Cursor::new(b"spam".to_vec())).unwrap();
        assert_eq!(reader.read_bytes(0).unwrap(), Bytes::new());
        assert_eq!(reader.read_bytes(4).unwrap(), Bytes::from_static(b"spam"));
        assert!(reader.is_closed());
        assert!(reader.is_at_end());
        assert!(matches!(
            reader.read_bytes(1),
            Err(BencodeError::StreamClosed)
        ));
    }
}
