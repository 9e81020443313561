use super::error::BencodeError;
use super::value::{Key, Symbol, Value, ValueMut};
use crate::constants::{DICT_START, LENGTH_SEPARATOR, LIST_START, TERMINATOR};
use bytes::{BufMut, Bytes, BytesMut};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::io::Write;

/// Per-call encoding switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Reject [`Symbol`]s instead of writing their names as byte strings.
    pub strict_conversion: bool,
    /// Reorder list elements by their encoded bytes before writing.
    ///
    /// Off by default: lists keep their order, as standard bencode requires.
    pub sort_lists: bool,
}

impl EncodeOptions {
    pub fn strict() -> Self {
        Self {
            strict_conversion: true,
            ..Self::default()
        }
    }

    pub fn with_strict_conversion(mut self, enabled: bool) -> Self {
        self.strict_conversion = enabled;
        self
    }

    pub fn with_sort_lists(mut self, enabled: bool) -> Self {
        self.sort_lists = enabled;
        self
    }
}

/// Writes bencode tokens into an in-memory buffer.
#[derive(Debug)]
pub struct Encoder<'a> {
    buf: &'a mut Vec<u8>,
    options: &'a EncodeOptions,
}

impl<'a> Encoder<'a> {
    pub fn new(buf: &'a mut Vec<u8>, options: &'a EncodeOptions) -> Self {
        Self { buf, options }
    }

    pub fn options(&self) -> &EncodeOptions {
        self.options
    }

    /// Writes `i<n>e`. Only primitive integer types are accepted.
    ///
    /// ```compile_fail
    /// use rbenc::bencode::{EncodeOptions, Encoder};
    ///
    /// let (mut buf, options) = (Vec::new(), EncodeOptions::default());
    /// Encoder::new(&mut buf, &options).write_integer(1.5f64).unwrap();
    /// ```
    pub fn write_integer<I: Integer>(&mut self, n: I) -> Result<(), BencodeError> {
        write!(self.buf, "i{}e", n)?;
        Ok(())
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), BencodeError> {
        write!(self.buf, "{}", data.len())?;
        self.buf.push(LENGTH_SEPARATOR);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Writes a symbol's name, or fails under strict conversion.
    pub fn write_symbol(&mut self, symbol: &Symbol) -> Result<(), BencodeError> {
        if self.options.strict_conversion {
            return Err(unwritable_symbol(symbol));
        }
        self.write_bytes(symbol.as_str().as_bytes())
    }

    pub fn write_list<'v, T, I>(&mut self, items: I) -> Result<(), BencodeError>
    where
        T: Encode + ?Sized + 'v,
        I: IntoIterator<Item = &'v T>,
    {
        self.buf.push(LIST_START);
        if self.options.sort_lists {
            let mut encoded = items
                .into_iter()
                .map(|item| {
                    let mut scratch = Vec::new();
                    item.encode(&mut Encoder::new(&mut scratch, self.options))?;
                    Ok::<_, BencodeError>(scratch)
                })
                .collect::<Result<Vec<_>, BencodeError>>()?;
            encoded.sort();
            for item in encoded {
                self.buf.extend_from_slice(&item);
            }
        } else {
            for item in items {
                item.encode(self)?;
            }
        }
        self.buf.push(TERMINATOR);
        Ok(())
    }

    /// Writes a dictionary with its entries in ascending key-byte order.
    pub fn write_dict<'v, K, V, I>(&mut self, entries: I) -> Result<(), BencodeError>
    where
        K: EncodeKey + ?Sized + 'v,
        V: Encode + ?Sized + 'v,
        I: IntoIterator<Item = (&'v K, &'v V)>,
    {
        let strict = self.options.strict_conversion;
        let mut sorted = entries
            .into_iter()
            .map(|(k, v)| Ok::<_, BencodeError>((k.key_bytes(strict)?, v)))
            .collect::<Result<Vec<_>, BencodeError>>()?;
        sorted.sort_by(|a, b| a.0.cmp(&b.0));

        self.buf.push(DICT_START);
        for (key, value) in sorted {
            self.write_bytes(&key)?;
            value.encode(self)?;
        }
        self.buf.push(TERMINATOR);
        Ok(())
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Primitive integer types accepted by [`Encoder::write_integer`].
///
/// Sealed: the `Display` output of every implementor is a valid bencode
/// integer body.
pub trait Integer: std::fmt::Display + sealed::Sealed {}

/// Types that have a bencode representation.
///
/// Implemented for [`Value`], [`ValueMut`], integers, strings, byte
/// containers, vectors, slices and maps. Types with no representation
/// (`bool`, floats, `()`, `None`) implement it by returning
/// [`BencodeError::Write`].
///
/// `Vec<u8>` and `[u8]` are byte strings, as they are when used as keys.
/// Vectors and slices of any other [`ListItem`] are lists.
pub trait Encode {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError>;
}

/// Element types of native lists: every [`Encode`] type except `u8`.
///
/// `u8` is left out so that `Vec<u8>` and `[u8]` stay byte strings.
pub trait ListItem: Encode {}

/// Types usable as dictionary keys.
pub trait EncodeKey {
    /// The bytes written for this key.
    fn key_bytes(&self, strict: bool) -> Result<Cow<'_, [u8]>, BencodeError>;
}

/// Encodes a value to a byte vector with default options.
///
/// The output follows the canonical bencode format:
/// - Integers: `i<number>e`
/// - Byte strings: `<length>:<data>`
/// - Lists: `l<items>e`
/// - Dictionaries: `d<key><value>...e` (keys sorted lexicographically)
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{encode, Value};
/// use std::collections::HashMap;
///
/// assert_eq!(encode(&Value::Integer(42)).unwrap(), b"i42e");
/// assert_eq!(encode("hello").unwrap(), b"5:hello");
///
/// let list = Value::list(vec![Value::Integer(1), Value::string("two")]);
/// assert_eq!(encode(&list).unwrap(), b"li1e3:twoe");
///
/// let mut dict = HashMap::new();
/// dict.insert("spam", "eggs");
/// dict.insert("cow", "moo");
/// assert_eq!(encode(&dict).unwrap(), b"d3:cow3:moo4:spam4:eggse");
/// ```
pub fn encode<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>, BencodeError> {
    encode_with(value, &EncodeOptions::default())
}

/// Encodes a value to a byte vector.
pub fn encode_with<T: Encode + ?Sized>(
    value: &T,
    options: &EncodeOptions,
) -> Result<Vec<u8>, BencodeError> {
    let mut buf = Vec::new();
    value.encode(&mut Encoder::new(&mut buf, options))?;
    Ok(buf)
}

/// Appends the encoding of `value` to `buf`.
///
/// Nothing is appended if encoding fails.
///
/// # Examples
///
/// ```
/// use rbenc::bencode::{encode_into, EncodeOptions, Symbol};
/// use bytes::BytesMut;
///
/// let mut buf = BytesMut::from(&b"prefix:"[..]);
/// encode_into(&mut buf, &7i64, &EncodeOptions::default()).unwrap();
/// assert_eq!(&buf[..], b"prefix:i7e");
///
/// let err = encode_into(&mut buf, &Symbol::new("name"), &EncodeOptions::strict());
/// assert!(err.is_err());
/// assert_eq!(&buf[..], b"prefix:i7e");
/// ```
pub fn encode_into<B: BufMut, T: Encode + ?Sized>(
    buf: &mut B,
    value: &T,
    options: &EncodeOptions,
) -> Result<(), BencodeError> {
    let encoded = encode_with(value, options)?;
    buf.put_slice(&encoded);
    Ok(())
}

fn unwritable_symbol(symbol: &Symbol) -> BencodeError {
    BencodeError::write(
        format!("symbol {:?} rejected by strict conversion", symbol.as_str()),
        "symbol",
    )
}

impl Encode for Value {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        match self {
            Value::Integer(i) => encoder.write_integer(*i),
            Value::Bytes(b) => encoder.write_bytes(b),
            Value::List(l) => encoder.write_list(l.iter()),
            Value::Dict(d) => encoder.write_dict(d.iter()),
        }
    }
}

impl Encode for ValueMut {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        match self {
            ValueMut::Integer(i) => encoder.write_integer(*i),
            ValueMut::Bytes(b) => encoder.write_bytes(b),
            ValueMut::List(l) => encoder.write_list(l.iter()),
            ValueMut::Dict(d) => encoder.write_dict(d.iter()),
        }
    }
}

impl Encode for Symbol {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_symbol(self)
    }
}

impl Encode for Key {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        match self {
            Key::Bytes(b) => encoder.write_bytes(b),
            Key::Symbol(s) => encoder.write_symbol(s),
        }
    }
}

macro_rules! encode_integer {
    ($($t:ty),*) => {
        $(
            impl sealed::Sealed for $t {}
            impl Integer for $t {}

            impl Encode for $t {
                fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
                    encoder.write_integer(*self)
                }
            }
        )*
    };
}

encode_integer!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

impl Encode for str {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self.as_bytes())
    }
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self.as_bytes())
    }
}

impl Encode for [u8] {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self)
    }
}

impl Encode for Bytes {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self)
    }
}

impl Encode for BytesMut {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self)
    }
}

impl Encode for Vec<u8> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_bytes(self)
    }
}

impl<T: ListItem> Encode for Vec<T> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_list(self.iter())
    }
}

impl<T: ListItem> Encode for [T] {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_list(self.iter())
    }
}

impl<K: EncodeKey, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_dict(self.iter())
    }
}

impl<K: EncodeKey, V: Encode, S: BuildHasher> Encode for HashMap<K, V, S> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        encoder.write_dict(self.iter())
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        match self {
            Some(value) => value.encode(encoder),
            None => Err(BencodeError::write("no bencode representation", "none")),
        }
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        (**self).encode(encoder)
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
        (**self).encode(encoder)
    }
}

macro_rules! encode_unwritable {
    ($($t:ty => $kind:expr),*) => {
        $(
            impl Encode for $t {
                fn encode(&self, _encoder: &mut Encoder<'_>) -> Result<(), BencodeError> {
                    Err(BencodeError::write("no bencode representation", $kind))
                }
            }
        )*
    };
}

encode_unwritable!(bool => "boolean", f32 => "float", f64 => "float", () => "unit");

macro_rules! list_item {
    ($($t:ty),*) => {
        $(impl ListItem for $t {})*
    };
}

list_item!(
    Value, ValueMut, Key, Symbol, i8, i16, i32, i64, i128, isize, u16, u32, u64, u128, usize,
    str, String, [u8], Vec<u8>, Bytes, BytesMut, bool, f32, f64, ()
);

impl<T: ListItem> ListItem for Vec<T> {}
impl<T: ListItem> ListItem for [T] {}
impl<K: EncodeKey, V: Encode> ListItem for BTreeMap<K, V> {}
impl<K: EncodeKey, V: Encode, S: BuildHasher> ListItem for HashMap<K, V, S> {}
impl<T: Encode> ListItem for Option<T> {}
impl<T: ListItem + ?Sized> ListItem for &T {}
impl<T: ListItem + ?Sized> ListItem for Box<T> {}

impl EncodeKey for Key {
    fn key_bytes(&self, strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        match self {
            Key::Bytes(b) => Ok(Cow::Borrowed(b)),
            Key::Symbol(s) => s.key_bytes(strict),
        }
    }
}

impl EncodeKey for Symbol {
    fn key_bytes(&self, strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        if strict {
            return Err(unwritable_symbol(self));
        }
        Ok(Cow::Borrowed(self.as_str().as_bytes()))
    }
}

impl EncodeKey for str {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self.as_bytes()))
    }
}

impl EncodeKey for String {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self.as_bytes()))
    }
}

impl EncodeKey for [u8] {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self))
    }
}

impl EncodeKey for Vec<u8> {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self))
    }
}

impl EncodeKey for Bytes {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self))
    }
}

impl EncodeKey for BytesMut {
    fn key_bytes(&self, _strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        Ok(Cow::Borrowed(self))
    }
}

impl<K: EncodeKey + ?Sized> EncodeKey for &K {
    fn key_bytes(&self, strict: bool) -> Result<Cow<'_, [u8]>, BencodeError> {
        (**self).key_bytes(strict)
    }
}
