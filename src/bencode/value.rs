use bytes::{Bytes, BytesMut};
use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// A decoded bencode value.
///
/// `Value` is an immutable snapshot: byte strings are frozen [`Bytes`], and
/// lists and dictionaries sit behind an [`Arc`], so cloning a value never
/// copies its contents. Decode with [`Decoder::mutable`](super::Decoder::mutable)
/// to get growable containers instead (see [`ValueMut`]).
///
/// # Examples
///
/// ```
/// use rbenc::bencode::Value;
///
/// // Creating values directly
/// let int = Value::Integer(42);
/// let string = Value::string("hello");
/// let list = Value::list(vec![Value::Integer(1), Value::Integer(2)]);
///
/// // Using From implementations
/// let int: Value = 42i64.into();
/// let string: Value = "hello".into();
///
/// // Accessing values
/// assert_eq!(int.as_integer(), Some(42));
/// assert_eq!(string.as_str(), Some("hello"));
/// assert_eq!(list.as_list().map(|l| l.len()), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed 64-bit integer.
    Integer(i64),
    /// A byte string (may or may not be valid UTF-8).
    Bytes(Bytes),
    /// An ordered list of values.
    List(Arc<[Value]>),
    /// A dictionary, iterated in ascending key-byte order.
    Dict(Arc<BTreeMap<Key, Value>>),
}

impl Value {
    /// Creates a byte string value from a UTF-8 string.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbenc::bencode::Value;
    ///
    /// let value = Value::string("hello");
    /// assert_eq!(value.as_str(), Some("hello"));
    /// ```
    pub fn string(s: &str) -> Self {
        Value::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }

    /// Creates a list value.
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(items.into())
    }

    /// Creates a dictionary value.
    pub fn dict(entries: BTreeMap<Key, Value>) -> Self {
        Value::Dict(Arc::new(entries))
    }

    /// Returns the value as an integer, if it is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbenc::bencode::Value;
    ///
    /// let int = Value::Integer(42);
    /// assert_eq!(int.as_integer(), Some(42));
    ///
    /// let string = Value::string("hello");
    /// assert_eq!(string.as_integer(), None);
    /// ```
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the value as a byte string, if it is one.
    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the value as a UTF-8 string, if it is a valid UTF-8 byte string.
    ///
    /// Returns `None` if the value is not a byte string or if the bytes are not valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    /// Returns the value as a list, if it is one.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(l) => Some(l),
            _ => None,
        }
    }

    /// Returns the value as a dictionary reference, if it is one.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbenc::bencode::decode;
    ///
    /// let value = decode(&b"d3:foo3:bare"[..]).unwrap();
    /// let dict = value.as_dict().unwrap();
    /// assert!(dict.contains_key(b"foo".as_slice()));
    /// ```
    pub fn as_dict(&self) -> Option<&BTreeMap<Key, Value>> {
        match self {
            Value::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Consumes the value and returns the dictionary, if it is one.
    ///
    /// The map is only cloned if other snapshots still share it.
    pub fn into_dict(self) -> Option<BTreeMap<Key, Value>> {
        match self {
            Value::Dict(d) => Some(Arc::unwrap_or_clone(d)),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    ///
    /// Returns `None` if the value is not a dictionary or if the key is not present.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbenc::bencode::decode;
    ///
    /// let value = decode(&b"d3:foo3:bare"[..]).unwrap();
    /// assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
    /// assert_eq!(value.get(b"missing"), None);
    /// ```
    pub fn get(&self, key: &[u8]) -> Option<&Value> {
        self.as_dict()?.get(key)
    }

    /// Name of this value's variant, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::Bytes(_) => "byte string",
            Value::List(_) => "list",
            Value::Dict(_) => "dictionary",
        }
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Bytes(Bytes::from(s))
    }
}

impl From<Bytes> for Value {
    fn from(b: Bytes) -> Self {
        Value::Bytes(b)
    }
}

impl From<Vec<Value>> for Value {
    fn from(l: Vec<Value>) -> Self {
        Value::list(l)
    }
}

impl From<BTreeMap<Key, Value>> for Value {
    fn from(d: BTreeMap<Key, Value>) -> Self {
        Value::dict(d)
    }
}

impl From<ValueMut> for Value {
    fn from(v: ValueMut) -> Self {
        v.freeze()
    }
}

/// A decoded bencode value backed by growable containers.
///
/// Produced by [`Decoder::mutable`](super::Decoder::mutable) and the `_mut`
/// entry points. Call [`freeze`](ValueMut::freeze) to turn it into a [`Value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueMut {
    Integer(i64),
    Bytes(BytesMut),
    List(Vec<ValueMut>),
    Dict(BTreeMap<Key, ValueMut>),
}

impl ValueMut {
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            ValueMut::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bytes_mut(&mut self) -> Option<&mut BytesMut> {
        match self {
            ValueMut::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ValueMut::Bytes(b) => std::str::from_utf8(b).ok(),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut Vec<ValueMut>> {
        match self {
            ValueMut::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut BTreeMap<Key, ValueMut>> {
        match self {
            ValueMut::Dict(d) => Some(d),
            _ => None,
        }
    }

    /// Looks up a key in this value if it is a dictionary.
    pub fn get(&self, key: &[u8]) -> Option<&ValueMut> {
        match self {
            ValueMut::Dict(d) => d.get(key),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ValueMut::Integer(_) => "integer",
            ValueMut::Bytes(_) => "byte string",
            ValueMut::List(_) => "list",
            ValueMut::Dict(_) => "dictionary",
        }
    }

    /// Converts this tree into an immutable [`Value`] snapshot.
    ///
    /// # Examples
    ///
    /// ```
    /// use rbenc::bencode::{decode_from_buffer_mut, DecodeOptions, Value};
    ///
    /// let mut value = decode_from_buffer_mut(&b"li1ee"[..], &DecodeOptions::default())
    ///     .unwrap()
    ///     .unwrap();
    /// value.as_list_mut().unwrap().push(2i64.into());
    /// assert_eq!(
    ///     value.freeze(),
    ///     Value::list(vec![Value::Integer(1), Value::Integer(2)])
    /// );
    /// ```
    pub fn freeze(self) -> Value {
        match self {
            ValueMut::Integer(i) => Value::Integer(i),
            ValueMut::Bytes(b) => Value::Bytes(b.freeze()),
            ValueMut::List(l) => Value::List(l.into_iter().map(ValueMut::freeze).collect()),
            ValueMut::Dict(d) => {
                Value::dict(d.into_iter().map(|(k, v)| (k, v.freeze())).collect())
            }
        }
    }
}

impl From<i64> for ValueMut {
    fn from(i: i64) -> Self {
        ValueMut::Integer(i)
    }
}

impl From<&str> for ValueMut {
    fn from(s: &str) -> Self {
        ValueMut::Bytes(BytesMut::from(s.as_bytes()))
    }
}

/// An interned identifier used for dictionary keys in keyword mode.
///
/// Symbols produced by one [`Decoder`](super::Decoder) share storage for equal
/// names. They encode as their name, or are rejected under
/// [`EncodeOptions::strict_conversion`](super::EncodeOptions::strict_conversion).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    pub fn new(name: &str) -> Self {
        Symbol(Arc::from(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if both symbols point at the same interned name.
    pub fn ptr_eq(a: &Symbol, b: &Symbol) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A dictionary key: raw bytes or an interned [`Symbol`].
///
/// Keys compare, order and hash by their bytes, so `Key::Symbol("cow")` and
/// `Key::Bytes("cow")` are the same key and maps iterate in canonical order.
#[derive(Debug, Clone)]
pub enum Key {
    Bytes(Bytes),
    Symbol(Symbol),
}

impl Key {
    pub fn symbol(name: &str) -> Self {
        Key::Symbol(Symbol::new(name))
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Key::Bytes(b) => b,
            Key::Symbol(s) => s.as_str().as_bytes(),
        }
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Key::Symbol(s) => Some(s),
            Key::Bytes(_) => None,
        }
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Key::Symbol(_))
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for Key {}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_bytes().cmp(other.as_bytes())
    }
}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_bytes().hash(state)
    }
}

impl Borrow<[u8]> for Key {
    fn borrow(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Bytes(b) => write!(f, "{}", String::from_utf8_lossy(b)),
            Key::Symbol(s) => write!(f, ":{}", s),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Bytes(Bytes::copy_from_slice(s.as_bytes()))
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Key::Bytes(Bytes::copy_from_slice(b))
    }
}

impl From<Bytes> for Key {
    fn from(b: Bytes) -> Self {
        Key::Bytes(b)
    }
}

impl From<Symbol> for Key {
    fn from(s: Symbol) -> Self {
        Key::Symbol(s)
    }
}
