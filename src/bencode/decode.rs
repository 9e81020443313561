use super::builder::{Builder, Frozen, Growable, Interner};
use super::error::BencodeError;
use super::reader::{BufferReader, ByteReader, StreamReader};
use super::value::{Key, Value, ValueMut};
use crate::constants::{
    CR, DEFAULT_MAX_DEPTH, DICT_START, INTEGER_START, LENGTH_SEPARATOR, LF, LIST_START, MINUS,
    TERMINATOR,
};
use bytes::Bytes;
use std::io::Read;
use std::marker::PhantomData;
use tracing::{debug, trace};

/// Per-call decoding switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Intern dictionary keys as [`Symbol`](super::Symbol)s instead of raw bytes.
    pub keyword_dicts: bool,
    /// Skip LF and CR bytes before each top-level value.
    pub ignore_newlines: bool,
    /// Deepest container nesting accepted before failing.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            keyword_dicts: true,
            ignore_newlines: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl DecodeOptions {
    pub fn with_keyword_dicts(mut self, enabled: bool) -> Self {
        self.keyword_dicts = enabled;
        self
    }

    pub fn with_ignore_newlines(mut self, enabled: bool) -> Self {
        self.ignore_newlines = enabled;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

/// A recursive-descent bencode decoder.
///
/// The builder type picks the output containers: [`Decoder::new`] produces
/// immutable [`Value`]s and [`Decoder::mutable`] produces growable
/// [`ValueMut`]s. A decoder may be reused for consecutive values; its key
/// interner is shared across those calls.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{BufferReader, ByteReader, Decoder, DecodeOptions, Value};
///
/// let mut reader = BufferReader::new(&b"d3:cow3:mooei42e"[..]);
/// let mut decoder = Decoder::new(DecodeOptions::default());
///
/// let dict = decoder.decode(&mut reader).unwrap().unwrap();
/// assert_eq!(dict.get(b"cow").and_then(|v| v.as_str()), Some("moo"));
///
/// reader.clear();
/// assert_eq!(decoder.decode(&mut reader).unwrap(), Some(Value::Integer(42)));
/// assert_eq!(decoder.decode(&mut reader).unwrap(), None);
/// ```
#[derive(Debug)]
pub struct Decoder<B: Builder = Frozen> {
    options: DecodeOptions,
    interner: Interner,
    builder: PhantomData<B>,
}

impl Decoder<Frozen> {
    pub fn new(options: DecodeOptions) -> Self {
        Self::with_builder(options)
    }
}

impl Decoder<Growable> {
    pub fn mutable(options: DecodeOptions) -> Self {
        Self::with_builder(options)
    }
}

impl<B: Builder> Decoder<B> {
    pub fn with_builder(options: DecodeOptions) -> Self {
        Self {
            options,
            interner: Interner::default(),
            builder: PhantomData,
        }
    }

    pub fn options(&self) -> &DecodeOptions {
        &self.options
    }

    /// Decodes the next top-level value from `reader`.
    ///
    /// Returns `Ok(None)` if the reader is at end of input where a value
    /// would start. Bytes after the value are left in the reader.
    pub fn decode<R: ByteReader>(
        &mut self,
        reader: &mut R,
    ) -> Result<Option<B::Value>, BencodeError> {
        if self.options.ignore_newlines {
            skip_newlines(reader)?;
        }

        let lead = match reader.peek() {
            Some(byte) => byte,
            None => return Ok(None),
        };

        let value = self
            .decode_value(reader, 0)
            .inspect_err(|e| debug!(error = %e, "bencode decode failed"))?;

        // The outermost container stops in front of its terminator.
        if lead == LIST_START || lead == DICT_START {
            reader.read()?;
        }

        trace!(position = reader.position(), "decoded top-level value");
        Ok(Some(value))
    }

    /// Iterates over consecutive top-level values, clearing the reader after
    /// each one. Iteration ends at end of input or after the first error.
    pub fn values<'a, R: ByteReader>(&'a mut self, reader: &'a mut R) -> Values<'a, R, B> {
        Values {
            decoder: self,
            reader,
            done: false,
        }
    }

    fn decode_value<R: ByteReader>(
        &mut self,
        reader: &mut R,
        depth: usize,
    ) -> Result<B::Value, BencodeError> {
        if depth > self.options.max_depth {
            return Err(BencodeError::parse(
                format!("nesting too deep (limit {})", self.options.max_depth),
                reader.position(),
            ));
        }

        match reader.peek() {
            Some(INTEGER_START) => decode_integer(reader).map(B::integer),
            Some(LIST_START) => self.decode_list(reader, depth),
            Some(DICT_START) => self.decode_dict(reader, depth),
            Some(b'0'..=b'9') | Some(MINUS) => decode_string(reader).map(B::bytes),
            Some(byte) => Err(BencodeError::parse(
                format!("unexpected byte {:?} (0x{:02x})", byte as char, byte),
                reader.position(),
            )),
            None => Err(BencodeError::parse(
                "unexpected end of input",
                reader.position(),
            )),
        }
    }

    fn decode_list<R: ByteReader>(
        &mut self,
        reader: &mut R,
        depth: usize,
    ) -> Result<B::Value, BencodeError> {
        reader.read()?;
        let mut list = B::list();

        while !at_terminator_or_end(reader) {
            let item = self
                .decode_value(reader, depth + 1)
                .map_err(|e| e.context("list element"))?;
            B::push(&mut list, item);
        }

        close(reader, depth, "unterminated list")?;
        Ok(B::finish_list(list))
    }

    fn decode_dict<R: ByteReader>(
        &mut self,
        reader: &mut R,
        depth: usize,
    ) -> Result<B::Value, BencodeError> {
        reader.read()?;
        let mut dict = B::dict();

        while !at_terminator_or_end(reader) {
            let key = self
                .decode_key(reader)
                .map_err(|e| e.context("dictionary key"))?;
            let value = self
                .decode_value(reader, depth + 1)
                .map_err(|e| e.context("dictionary value"))?;
            B::insert(&mut dict, key, value);
        }

        close(reader, depth, "unterminated dictionary")?;
        Ok(B::finish_dict(dict))
    }

    fn decode_key<R: ByteReader>(&mut self, reader: &mut R) -> Result<Key, BencodeError> {
        if !matches!(reader.peek(), Some(b'0'..=b'9') | Some(MINUS)) {
            return Err(BencodeError::parse(
                "dictionary key must be a byte string",
                reader.position(),
            ));
        }

        let raw = decode_string(reader)?;
        if self.options.keyword_dicts {
            Ok(self.interner.key(raw))
        } else {
            Ok(Key::Bytes(raw))
        }
    }
}

/// Iterator returned by [`Decoder::values`].
pub struct Values<'a, R, B: Builder> {
    decoder: &'a mut Decoder<B>,
    reader: &'a mut R,
    done: bool,
}

impl<R: ByteReader, B: Builder> Iterator for Values<'_, R, B> {
    type Item = Result<B::Value, BencodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.decoder.decode(self.reader) {
            Ok(Some(value)) => {
                self.reader.clear();
                Some(Ok(value))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn skip_newlines<R: ByteReader>(reader: &mut R) -> Result<(), BencodeError> {
    let mut skipped = 0usize;
    while matches!(reader.peek(), Some(LF) | Some(CR)) {
        reader.advance_and_clear()?;
        skipped += 1;
    }
    if skipped > 0 {
        trace!(skipped, "skipped newlines between values");
    }
    Ok(())
}

fn at_terminator_or_end<R: ByteReader>(reader: &R) -> bool {
    matches!(reader.peek(), Some(TERMINATOR) | None)
}

/// Checks the container terminator. Nested containers consume it here; the
/// outermost one (depth 0) leaves it for [`Decoder::decode`].
fn close<R: ByteReader>(reader: &mut R, depth: usize, message: &str) -> Result<(), BencodeError> {
    let terminated = if depth == 0 {
        reader.peek() == Some(TERMINATOR)
    } else {
        reader.match_byte(TERMINATOR)?
    };

    if terminated {
        Ok(())
    } else {
        Err(BencodeError::parse(message, reader.position()))
    }
}

fn decode_integer<R: ByteReader>(reader: &mut R) -> Result<i64, BencodeError> {
    reader.read()?;
    let value = read_number(reader, true).map_err(|e| e.context("invalid integer"))?;

    if !reader.match_byte(TERMINATOR)? {
        return Err(BencodeError::parse(
            "unterminated integer",
            reader.position(),
        ));
    }

    Ok(value)
}

fn decode_string<R: ByteReader>(reader: &mut R) -> Result<Bytes, BencodeError> {
    if reader.peek() == Some(MINUS) {
        return Err(BencodeError::parse(
            "negative string length",
            reader.position(),
        ));
    }

    let len = read_number(reader, false).map_err(|e| e.context("invalid string length"))?;

    if !reader.match_byte(LENGTH_SEPARATOR)? {
        return Err(BencodeError::parse(
            "missing length separator ':'",
            reader.position(),
        ));
    }

    let len = usize::try_from(len)
        .map_err(|_| BencodeError::parse("string length out of range", reader.position()))?;
    reader.read_bytes(len)
}

/// Scans an optional `-` (when `signed`) and one or more decimal digits.
///
/// Leading zeros are accepted.
fn read_number<R: ByteReader>(reader: &mut R, signed: bool) -> Result<i64, BencodeError> {
    let negative = signed && reader.match_byte(MINUS)?;
    let mut value: i64 = 0;
    let mut digits = 0usize;

    while let Some(byte @ b'0'..=b'9') = reader.peek() {
        let digit = i64::from(byte - b'0');
        value = value
            .checked_mul(10)
            .and_then(|v| {
                if negative {
                    v.checked_sub(digit)
                } else {
                    v.checked_add(digit)
                }
            })
            .ok_or_else(|| BencodeError::parse("out of range", reader.position()))?;
        reader.read()?;
        digits += 1;
    }

    if digits == 0 {
        return Err(BencodeError::parse("expected digits", reader.position()));
    }

    Ok(value)
}

/// Decodes exactly one value from `data`.
///
/// Unlike [`decode_from_buffer`], empty input and bytes after the value are
/// errors. [`Bytes`] input is not copied: decoded byte strings share its
/// memory.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{decode, BencodeError, Value};
///
/// assert_eq!(decode(&b"i42e"[..]).unwrap(), Value::Integer(42));
/// assert!(matches!(decode(&b"i42eextra"[..]), Err(BencodeError::TrailingData { position: 4 })));
/// assert!(decode(&b""[..]).is_err());
/// ```
pub fn decode(data: impl Into<Bytes>) -> Result<Value, BencodeError> {
    let mut reader = BufferReader::new(data);
    let mut decoder = Decoder::new(DecodeOptions::default());

    let value = decoder
        .decode(&mut reader)?
        .ok_or_else(|| BencodeError::parse("unexpected end of input", 0))?;

    if !reader.is_at_end() {
        return Err(BencodeError::TrailingData {
            position: reader.position(),
        });
    }

    Ok(value)
}

/// Decodes the first value in `data` as an immutable [`Value`].
///
/// Returns `Ok(None)` for empty input. Bytes after the first value are ignored;
/// use a [`BufferReader`] with a [`Decoder`] to read them.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{decode_from_buffer, DecodeOptions, Value};
///
/// let options = DecodeOptions::default();
/// let value = decode_from_buffer(&b"l4:spam4:eggse"[..], &options).unwrap().unwrap();
/// assert_eq!(
///     value,
///     Value::list(vec![Value::string("spam"), Value::string("eggs")])
/// );
/// assert_eq!(decode_from_buffer(&b""[..], &options).unwrap(), None);
/// ```
pub fn decode_from_buffer(
    data: impl Into<Bytes>,
    options: &DecodeOptions,
) -> Result<Option<Value>, BencodeError> {
    Decoder::new(options.clone()).decode(&mut BufferReader::new(data))
}

/// Decodes the first value in `data` into growable containers.
pub fn decode_from_buffer_mut(
    data: impl Into<Bytes>,
    options: &DecodeOptions,
) -> Result<Option<ValueMut>, BencodeError> {
    Decoder::mutable(options.clone()).decode(&mut BufferReader::new(data))
}

/// Decodes the next value from a stream, blocking until it is complete.
///
/// Returns `Ok(None)` if the stream closes before a value starts.
pub fn decode_from_stream<R: Read>(
    reader: &mut StreamReader<R>,
    options: &DecodeOptions,
) -> Result<Option<Value>, BencodeError> {
    Decoder::new(options.clone()).decode(reader)
}

/// Decodes the next value from a stream into growable containers.
pub fn decode_from_stream_mut<R: Read>(
    reader: &mut StreamReader<R>,
    options: &DecodeOptions,
) -> Result<Option<ValueMut>, BencodeError> {
    Decoder::mutable(options.clone()).decode(reader)
}
