//! rbenc - Bencode for buffers and blocking streams
//!
//! Decodes bencode from an in-memory buffer or from a stream whose bytes
//! arrive over time, and encodes value trees back into canonical bytes.
//!
//! # Modules
//!
//! - [`bencode`] - BEP-3 value model, readers, decoder and encoder
//! - [`constants`] - Grammar bytes and default limits

pub mod bencode;
pub mod constants;

pub use bencode::{
    decode, decode_from_buffer, decode_from_stream, encode, encode_into, encode_with,
    BencodeError, BufferReader, ByteReader, DecodeOptions, Decoder, EncodeOptions, Key,
    StreamReader, Symbol, Value, ValueMut,
};
