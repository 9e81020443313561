//! Bencode encoding and decoding ([BEP-3]).
//!
//! Bencode is the serialization format BitTorrent uses for `.torrent` files,
//! tracker responses and DHT messages.
//!
//! # Data Types
//!
//! Bencode supports four data types:
//!
//! | Type | Format | Example |
//! |------|--------|---------|
//! | Integer | `i<number>e` | `i42e` → 42 |
//! | Byte String | `<length>:<data>` | `4:spam` → "spam" |
//! | List | `l<items>e` | `l4:spami42ee` → ["spam", 42] |
//! | Dictionary | `d<key><value>...e` | `d3:foo3:bare` → {"foo": "bar"} |
//!
//! # Examples
//!
//! ## Decoding from a buffer
//!
//! ```
//! use rbenc::bencode::{decode_from_buffer, DecodeOptions, Value};
//!
//! let options = DecodeOptions::default();
//!
//! let value = decode_from_buffer(&b"i42e"[..], &options).unwrap().unwrap();
//! assert_eq!(value.as_integer(), Some(42));
//!
//! let value = decode_from_buffer(&b"d3:foo3:bare"[..], &options).unwrap().unwrap();
//! assert_eq!(value.get(b"foo").and_then(|v| v.as_str()), Some("bar"));
//!
//! // Empty input is not an error: there is simply no value.
//! assert_eq!(decode_from_buffer(&b""[..], &options).unwrap(), None);
//! ```
//!
//! ## Decoding consecutive values from a stream
//!
//! ```
//! use rbenc::bencode::{Decoder, DecodeOptions, StreamReader, Value};
//! use std::io::Cursor;
//!
//! let mut reader = StreamReader::new(Cursor::new(b"i1e\ni2e\n".to_vec())).unwrap();
//! let mut decoder = Decoder::new(DecodeOptions::default().with_ignore_newlines(true));
//!
//! let values: Vec<Value> = decoder
//!     .values(&mut reader)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(values, vec![Value::Integer(1), Value::Integer(2)]);
//! ```
//!
//! ## Encoding
//!
//! ```
//! use rbenc::bencode::{encode, encode_with, EncodeOptions, Key, Value};
//! use std::collections::BTreeMap;
//!
//! let mut dict = BTreeMap::new();
//! dict.insert(Key::from("spam"), Value::string("eggs"));
//! dict.insert(Key::from("cow"), Value::string("moo"));
//! assert_eq!(encode(&Value::dict(dict)).unwrap(), b"d3:cow3:moo4:spam4:eggse");
//!
//! // Symbols are written by name unless strict conversion is on.
//! let mut dict = BTreeMap::new();
//! dict.insert(Key::symbol("name"), Value::Integer(1));
//! let value = Value::dict(dict);
//! assert_eq!(encode(&value).unwrap(), b"d4:namei1ee");
//! assert!(encode_with(&value, &EncodeOptions::strict()).is_err());
//! ```
//!
//! # Error Handling
//!
//! - [`BencodeError::Parse`] - Grammar violation, with the byte position and
//!   the enclosing context (`dictionary key: ...`, `list element: ...`)
//! - [`BencodeError::StreamClosed`] - A stream closed in the middle of a value
//! - [`BencodeError::Write`] - A value has no bencode representation
//! - [`BencodeError::TrailingData`] - Extra data after the value in [`decode`]
//! - [`BencodeError::Io`] - The underlying stream failed
//!
//! [BEP-3]: http://bittorrent.org/beps/bep_0003.html

mod builder;
mod decode;
mod encode;
mod error;
mod reader;
mod value;

pub use builder::{Builder, Frozen, Growable};
pub use decode::{
    decode, decode_from_buffer, decode_from_buffer_mut, decode_from_stream,
    decode_from_stream_mut, DecodeOptions, Decoder, Values,
};
pub use encode::{
    encode, encode_into, encode_with, Encode, EncodeKey, EncodeOptions, Encoder, Integer, ListItem,
};
pub use error::BencodeError;
pub use reader::{BufferReader, ByteReader, StreamReader};
pub use value::{Key, Symbol, Value, ValueMut};
