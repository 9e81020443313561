//! Container construction strategies for the decoder.
//!
//! The decoder never names a concrete container type; it goes through a
//! [`Builder`], picked once when the [`Decoder`](super::Decoder) is created.

use super::value::{Key, Symbol, Value, ValueMut};
use crate::constants::MAX_INTERNED_KEYS;
use bytes::{Bytes, BytesMut};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use tracing::trace;

/// Builds decoded values bottom-up.
pub trait Builder {
    type Value;
    type List;
    type Dict;

    fn integer(n: i64) -> Self::Value;
    fn bytes(data: Bytes) -> Self::Value;

    fn list() -> Self::List;
    fn push(list: &mut Self::List, item: Self::Value);
    fn finish_list(list: Self::List) -> Self::Value;

    fn dict() -> Self::Dict;
    /// Inserts an entry; a repeated key replaces the earlier value.
    fn insert(dict: &mut Self::Dict, key: Key, value: Self::Value);
    fn finish_dict(dict: Self::Dict) -> Self::Value;
}

/// Builds immutable [`Value`] snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct Frozen;

impl Builder for Frozen {
    type Value = Value;
    type List = Vec<Value>;
    type Dict = BTreeMap<Key, Value>;

    fn integer(n: i64) -> Value {
        Value::Integer(n)
    }

    fn bytes(data: Bytes) -> Value {
        Value::Bytes(data)
    }

    fn list() -> Vec<Value> {
        Vec::new()
    }

    fn push(list: &mut Vec<Value>, item: Value) {
        list.push(item);
    }

    fn finish_list(list: Vec<Value>) -> Value {
        Value::list(list)
    }

    fn dict() -> BTreeMap<Key, Value> {
        BTreeMap::new()
    }

    fn insert(dict: &mut BTreeMap<Key, Value>, key: Key, value: Value) {
        dict.insert(key, value);
    }

    fn finish_dict(dict: BTreeMap<Key, Value>) -> Value {
        Value::dict(dict)
    }
}

/// Builds growable [`ValueMut`] trees.
#[derive(Debug, Clone, Copy, Default)]
pub struct Growable;

impl Builder for Growable {
    type Value = ValueMut;
    type List = Vec<ValueMut>;
    type Dict = BTreeMap<Key, ValueMut>;

    fn integer(n: i64) -> ValueMut {
        ValueMut::Integer(n)
    }

    fn bytes(data: Bytes) -> ValueMut {
        ValueMut::Bytes(BytesMut::from(&data[..]))
    }

    fn list() -> Vec<ValueMut> {
        Vec::new()
    }

    fn push(list: &mut Vec<ValueMut>, item: ValueMut) {
        list.push(item);
    }

    fn finish_list(list: Vec<ValueMut>) -> ValueMut {
        ValueMut::List(list)
    }

    fn dict() -> BTreeMap<Key, ValueMut> {
        BTreeMap::new()
    }

    fn insert(dict: &mut BTreeMap<Key, ValueMut>, key: Key, value: ValueMut) {
        dict.insert(key, value);
    }

    fn finish_dict(dict: BTreeMap<Key, ValueMut>) -> ValueMut {
        ValueMut::Dict(dict)
    }
}

/// Turns raw dictionary keys into [`Symbol`]s, reusing earlier allocations.
#[derive(Debug, Default)]
pub(crate) struct Interner {
    symbols: FxHashMap<Bytes, Symbol>,
}

impl Interner {
    /// Returns a symbol key for UTF-8 input and a byte key otherwise.
    pub(crate) fn key(&mut self, raw: Bytes) -> Key {
        if let Some(symbol) = self.symbols.get(&raw[..]) {
            return Key::Symbol(symbol.clone());
        }

        match std::str::from_utf8(&raw) {
            Ok(name) => {
                let symbol = Symbol::new(name);
                if self.symbols.len() < MAX_INTERNED_KEYS {
                    self.symbols.insert(raw, symbol.clone());
                }
                Key::Symbol(symbol)
            }
            Err(_) => {
                trace!(len = raw.len(), "dictionary key is not UTF-8, keeping raw bytes");
                Key::Bytes(raw)
            }
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.symbols.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interner_reuses_symbols() {
        let mut interner = Interner::default();
        let a = interner.key(Bytes::from_static(b"info"));
        let b = interner.key(Bytes::from_static(b"info"));

        match (a, b) {
            (Key::Symbol(a), Key::Symbol(b)) => assert!(Symbol::ptr_eq(&a, &b)),
            other => panic!("expected symbols, got {:?}", other),
        }
        assert_eq!(interner.len(), 1);
    }

    #[test]
    fn test_interner_keeps_invalid_utf8_as_bytes() {
        let mut interner = Interner::default();
        let key = interner.key(Bytes::from_static(&[0xff, 0xfe]));
        assert!(!key.is_symbol());
        assert_eq!(key.as_bytes(), &[0xff, 0xfe]);
        assert_eq!(interner.len(), 0);
    }

    #[test]
    fn test_interner_is_bounded() {
        let mut interner = Interner::default();
        for i in 0..MAX_INTERNED_KEYS + 10 {
            let key = interner.key(Bytes::from(format!("k{}", i)));
            assert!(key.is_symbol());
        }
        assert_eq!(interner.len(), MAX_INTERNED_KEYS);
    }

    #[test]
    fn test_duplicate_insert_replaces_value() {
        let mut dict = Frozen::dict();
        Frozen::insert(&mut dict, Key::from("a"), Frozen::integer(1));
        Frozen::insert(&mut dict, Key::symbol("a"), Frozen::integer(2));
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(b"a".as_slice()), Some(&Value::Integer(2)));
    }

    #[test]
    fn test_growable_bytes_are_mutable() {
        let mut value = Growable::bytes(Bytes::from_static(b"spa"));
        value.as_bytes_mut().unwrap().extend_from_slice(b"m");
        assert_eq!(value.as_str(), Some("spam"));
    }
}
