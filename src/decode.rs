//! The decoder.
//!
//! A single left-to-right cursor over an in-memory byte slice. Every failure
//! reports the byte offset at which the cursor stopped, and the produced
//! tree owns all of its data — nothing borrows from the input buffer.

use std::cmp::Ordering;

use num_bigint::{BigInt, Sign};

use crate::dict::{ContentDict, Dictionary};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::integer::Integer;
use crate::key::Key;
use crate::marker::{DELIM, DICT, END, FALSE, INT, LIST, MINUS, NULL, TEXT, TRUE};
use crate::natural;
use crate::value::Value;

/// Whether the decoder enforces canonical dictionary key order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InvalidKeyOrder {
    /// Reject unordered keys with
    /// [`UnorderedDictionaryKeys`](DecodeErrorKind::UnorderedDictionaryKeys)
    /// and repeated keys with
    /// [`DuplicateDictionaryKeys`](DecodeErrorKind::DuplicateDictionaryKeys).
    #[default]
    Error,
    /// Accept the entries as they come. With the default backing, repeated
    /// keys resolve to the last-seen value.
    Ignore,
}

/// Builds the backing store for a decoded dictionary.
pub type DictionaryBuilder = fn(Vec<(Key, Value)>) -> Box<dyn Dictionary>;

/// Decoder configuration.
#[derive(Clone, Copy, Debug)]
pub struct DecodeOptions {
    /// Canonical key-order enforcement.
    pub on_invalid_key_order: InvalidKeyOrder,
    /// Constructor for decoded dictionaries. Defaults to
    /// [`ContentDict`].
    pub dictionary: DictionaryBuilder,
}

fn build_content_dict(entries: Vec<(Key, Value)>) -> Box<dyn Dictionary> {
    Box::new(ContentDict::from_entries(entries))
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            on_invalid_key_order: InvalidKeyOrder::default(),
            dictionary: build_content_dict,
        }
    }
}

/// Decode a buffer holding exactly one value, with default options.
pub fn decode(buf: &[u8]) -> Result<Value, DecodeError> {
    decode_with(buf, &DecodeOptions::default())
}

/// Decode a buffer holding exactly one value.
///
/// Trailing bytes fail with
/// [`UnexpectedByte`](DecodeErrorKind::UnexpectedByte) at the offset of the
/// first byte past the value.
pub fn decode_with(buf: &[u8], options: &DecodeOptions) -> Result<Value, DecodeError> {
    let (read, value) = decode_value(buf, options)?;
    if read < buf.len() {
        return Err(DecodeError {
            kind: DecodeErrorKind::UnexpectedByte,
            position: read,
        });
    }
    Ok(value)
}

/// Decode one value from the front of a buffer.
///
/// Returns the bytes consumed alongside the value; the input need not be
/// exhausted.
pub fn decode_value(buf: &[u8], options: &DecodeOptions) -> Result<(usize, Value), DecodeError> {
    let mut parser = Parser { buf, pos: 0 };
    let value = parser.value(options)?;
    Ok((parser.pos, value))
}

/// Decode one dictionary key from the front of a buffer.
pub fn decode_key(buf: &[u8]) -> Result<(usize, Key), DecodeError> {
    let mut parser = Parser { buf, pos: 0 };
    let key = parser.key()?;
    Ok((parser.pos, key))
}

struct Parser<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<u8> {
        self.buf.get(self.pos).copied()
    }

    fn fail(&self, kind: DecodeErrorKind) -> DecodeError {
        DecodeError {
            kind,
            position: self.pos,
        }
    }

    fn value(&mut self, options: &DecodeOptions) -> Result<Value, DecodeError> {
        let Some(byte) = self.peek() else {
            return Err(self.fail(DecodeErrorKind::UnexpectedEndOfInput));
        };
        match byte {
            NULL => {
                self.pos += 1;
                Ok(Value::Null)
            }
            TRUE => {
                self.pos += 1;
                Ok(Value::Bool(true))
            }
            FALSE => {
                self.pos += 1;
                Ok(Value::Bool(false))
            }
            INT => {
                self.pos += 1;
                self.integer().map(Value::Int)
            }
            TEXT => {
                self.pos += 1;
                self.text().map(Value::Text)
            }
            b'0'..=b'9' => self.binary().map(Value::Bin),
            LIST => {
                self.pos += 1;
                let mut items = Vec::new();
                loop {
                    match self.peek() {
                        None => return Err(self.fail(DecodeErrorKind::NoListSuffix)),
                        Some(END) => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => items.push(self.value(options)?),
                    }
                }
                Ok(Value::List(items))
            }
            DICT => {
                self.pos += 1;
                self.dict(options)
            }
            _ => Err(self.fail(DecodeErrorKind::UnexpectedByte)),
        }
    }

    fn key(&mut self) -> Result<Key, DecodeError> {
        match self.peek() {
            None => Err(self.fail(DecodeErrorKind::UnexpectedEndOfInput)),
            Some(TEXT) => {
                self.pos += 1;
                self.text().map(Key::Text)
            }
            Some(_) => self.binary().map(Key::Bin),
        }
    }

    /// Digits and suffix of an integer; the `i` marker is already consumed.
    fn integer(&mut self) -> Result<Integer, DecodeError> {
        let negative = if self.peek() == Some(MINUS) {
            self.pos += 1;
            true
        } else {
            false
        };
        let (read, magnitude) = natural::parse_big(&self.buf[self.pos..])
            .ok_or_else(|| self.fail(DecodeErrorKind::InvalidInteger))?;
        self.pos += read;
        if self.peek() != Some(END) {
            return Err(self.fail(DecodeErrorKind::NoIntegerSuffix));
        }
        self.pos += 1;
        // `i-0e` normalizes to zero rather than failing.
        let sign = if negative { Sign::Minus } else { Sign::Plus };
        Ok(Integer::from(BigInt::from_biguint(sign, magnitude)))
    }

    /// A length-prefixed binary value, starting at its first length digit.
    fn binary(&mut self) -> Result<Vec<u8>, DecodeError> {
        let (read, len) = natural::parse_u64(&self.buf[self.pos..])
            .ok_or_else(|| self.fail(DecodeErrorKind::NoBinaryLength))?;
        self.pos += read;
        if self.peek() != Some(DELIM) {
            return Err(self.fail(DecodeErrorKind::NoBinaryDelimiter));
        }
        self.pos += 1;
        self.raw(len, DecodeErrorKind::OverRunBinaryLength)
    }

    /// Length, delimiter, and payload of a text value; the `u` marker is
    /// already consumed. Invalid UTF-8 decodes lossily, the way a non-fatal
    /// platform text decoder would.
    fn text(&mut self) -> Result<String, DecodeError> {
        let (read, len) = natural::parse_u64(&self.buf[self.pos..])
            .ok_or_else(|| self.fail(DecodeErrorKind::NoTextLength))?;
        self.pos += read;
        if self.peek() != Some(DELIM) {
            return Err(self.fail(DecodeErrorKind::NoTextDelimiter));
        }
        self.pos += 1;
        let bytes = self.raw(len, DecodeErrorKind::OverRunTextLength)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn raw(&mut self, len: u64, overrun: DecodeErrorKind) -> Result<Vec<u8>, DecodeError> {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if self.buf.len() - self.pos < len {
            return Err(self.fail(overrun));
        }
        let bytes = self.buf[self.pos..self.pos + len].to_vec();
        self.pos += len;
        Ok(bytes)
    }

    /// Entries and suffix of a dictionary; the `d` marker is already
    /// consumed.
    fn dict(&mut self, options: &DecodeOptions) -> Result<Value, DecodeError> {
        let mut entries: Vec<(Key, Value)> = Vec::new();
        let mut prev: Option<Key> = None;
        loop {
            match self.peek() {
                None => return Err(self.fail(DecodeErrorKind::NoDictionarySuffix)),
                Some(END) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {}
            }
            let key = self.key()?;
            if options.on_invalid_key_order == InvalidKeyOrder::Error {
                if let Some(prev) = &prev {
                    match prev.cmp(&key) {
                        Ordering::Greater => {
                            return Err(self.fail(DecodeErrorKind::UnorderedDictionaryKeys))
                        }
                        Ordering::Equal => {
                            return Err(self.fail(DecodeErrorKind::DuplicateDictionaryKeys))
                        }
                        Ordering::Less => {}
                    }
                }
            }
            let value = self.value(options)?;
            prev = Some(key.clone());
            entries.push((key, value));
        }
        Ok(Value::Dict((options.dictionary)(entries)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode::{encode, encode_with, DuplicateKeys, EncodeOptions};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::BTreeMap;

    fn kind_at(buf: &[u8]) -> (DecodeErrorKind, usize) {
        let err = decode(buf).unwrap_err();
        (err.kind, err.position)
    }

    #[test]
    fn atoms() {
        assert_eq!(decode(b"n").unwrap(), Value::Null);
        assert_eq!(decode(b"t").unwrap(), Value::Bool(true));
        assert_eq!(decode(b"f").unwrap(), Value::Bool(false));
    }

    #[test]
    fn integers() {
        assert_eq!(decode(b"i123e").unwrap(), Value::from(123));
        assert_eq!(decode(b"i-456e").unwrap(), Value::from(-456));
        assert_eq!(decode(b"i0e").unwrap(), Value::from(0));
        assert_eq!(
            decode(b"i18446744073709551616e").unwrap().as_int().unwrap(),
            &Integer::from(u128::from(u64::MAX) + 1)
        );
    }

    #[test]
    fn lenient_integer_spellings() {
        // Leading zeros and negative zero are accepted on decode and
        // normalize; only the encoder promises canonical spelling.
        assert_eq!(decode(b"i007e").unwrap(), Value::from(7));
        assert_eq!(decode(b"i-0e").unwrap(), Value::from(0));
    }

    #[test]
    fn text_and_binary() {
        assert_eq!(decode(b"u3:foo").unwrap(), Value::from("foo"));
        assert_eq!(
            decode(b"u6:\xeb\x8b\xa8\xed\x8c\xa5").unwrap(),
            Value::from("단팥")
        );
        assert_eq!(decode(b"u0:").unwrap(), Value::from(""));
        assert_eq!(decode(b"4:spam").unwrap(), Value::from(b"spam".as_slice()));
        assert_eq!(decode(b"0:").unwrap(), Value::from(Vec::<u8>::new()));
        // Leading zeros in a length are tolerated.
        assert_eq!(decode(b"u03:abc").unwrap(), Value::from("abc"));
    }

    #[test]
    fn invalid_utf8_decodes_lossily() {
        let value = decode(b"u2:\xff\xfe").unwrap();
        assert_eq!(value.as_str(), Some("\u{fffd}\u{fffd}"));
    }

    #[test]
    fn containers() {
        assert_eq!(decode(b"le").unwrap(), Value::List(Vec::new()));
        assert_eq!(
            decode(b"li1ei2ee").unwrap(),
            Value::from(vec![Value::from(1), Value::from(2)])
        );
        let dict = decode(b"de").unwrap();
        assert_eq!(dict.as_dict().unwrap().len(), 0);
    }

    #[test]
    fn mixed_key_dictionary() {
        let bytes = b"d4:spamt4:spannu6:\xeb\x8b\xa8\xed\x8c\xa5i123ee";
        let value = decode(bytes).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(
            dict.get(&Key::Bin(b"spam".to_vec())),
            Some(&Value::Bool(true))
        );
        assert_eq!(dict.get(&Key::Bin(b"span".to_vec())), Some(&Value::Null));
        assert_eq!(dict.get(&Key::from("단팥")), Some(&Value::from(123)));
    }

    #[test]
    fn error_positions() {
        assert_eq!(kind_at(b""), (DecodeErrorKind::UnexpectedEndOfInput, 0));
        assert_eq!(kind_at(b"x"), (DecodeErrorKind::UnexpectedByte, 0));
        assert_eq!(kind_at(b"ie"), (DecodeErrorKind::InvalidInteger, 1));
        assert_eq!(kind_at(b"i-e"), (DecodeErrorKind::InvalidInteger, 2));
        assert_eq!(kind_at(b"i12"), (DecodeErrorKind::NoIntegerSuffix, 3));
        assert_eq!(kind_at(b"i12x"), (DecodeErrorKind::NoIntegerSuffix, 3));
        assert_eq!(kind_at(b"l"), (DecodeErrorKind::NoListSuffix, 1));
        assert_eq!(kind_at(b"li1e"), (DecodeErrorKind::NoListSuffix, 4));
        assert_eq!(kind_at(b"d"), (DecodeErrorKind::NoDictionarySuffix, 1));
        assert_eq!(
            kind_at(b"du1:an"),
            (DecodeErrorKind::NoDictionarySuffix, 6)
        );
        assert_eq!(kind_at(b"4spam"), (DecodeErrorKind::NoBinaryDelimiter, 1));
        assert_eq!(kind_at(b"4:spa"), (DecodeErrorKind::OverRunBinaryLength, 2));
        assert_eq!(kind_at(b"u3"), (DecodeErrorKind::NoTextDelimiter, 2));
        assert_eq!(kind_at(b"u3:ab"), (DecodeErrorKind::OverRunTextLength, 3));
        // A dictionary key that starts with neither a digit nor `u`.
        let err = decode(b"dxe").unwrap_err();
        assert_eq!((err.kind, err.position), (DecodeErrorKind::NoBinaryLength, 1));
        // A text value with no digits after `u`.
        let err = decode(b"u:ab").unwrap_err();
        assert_eq!((err.kind, err.position), (DecodeErrorKind::NoTextLength, 1));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let err = decode(b"i1en").unwrap_err();
        assert_eq!((err.kind, err.position), (DecodeErrorKind::UnexpectedByte, 3));
        // decode_value stops at the value boundary instead.
        let (read, value) = decode_value(b"i1en", &DecodeOptions::default()).unwrap();
        assert_eq!((read, value), (3, Value::from(1)));
    }

    #[test]
    fn unordered_keys_are_rejected() {
        let bytes = b"d4:spann4:spamte";
        let err = decode(bytes).unwrap_err();
        assert_eq!(
            (err.kind, err.position),
            (DecodeErrorKind::UnorderedDictionaryKeys, 14)
        );
    }

    #[test]
    fn unordered_keys_can_be_ignored() {
        let options = DecodeOptions {
            on_invalid_key_order: InvalidKeyOrder::Ignore,
            ..DecodeOptions::default()
        };
        let value = decode_with(b"d4:spann4:spamte", &options).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(&Key::Bin(b"span".to_vec())), Some(&Value::Null));
        assert_eq!(
            dict.get(&Key::Bin(b"spam".to_vec())),
            Some(&Value::Bool(true))
        );
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let err = decode(b"du1:anu1:ate").unwrap_err();
        assert_eq!(
            (err.kind, err.position),
            (DecodeErrorKind::DuplicateDictionaryKeys, 10)
        );
    }

    #[test]
    fn ignored_duplicates_keep_the_last_value() {
        let options = DecodeOptions {
            on_invalid_key_order: InvalidKeyOrder::Ignore,
            ..DecodeOptions::default()
        };
        let value = decode_with(b"du1:ai1eu1:ai2ee", &options).unwrap();
        let dict = value.as_dict().unwrap();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.get(&Key::from("a")), Some(&Value::from(2)));
    }

    #[test]
    fn pluggable_dictionary_backing() {
        fn build_tree(entries: Vec<(Key, Value)>) -> Box<dyn Dictionary> {
            Box::new(entries.into_iter().collect::<BTreeMap<Key, Value>>())
        }
        let options = DecodeOptions {
            dictionary: build_tree,
            ..DecodeOptions::default()
        };
        let value = decode_with(b"du1:ai1ee", &options).unwrap();
        assert_eq!(value.as_dict().unwrap().get(&Key::from("a")), Some(&Value::from(1)));
        // Equal to the same tree decoded into the default backing.
        assert_eq!(value, decode(b"du1:ai1ee").unwrap());
    }

    #[test]
    fn key_decoding() {
        assert_eq!(decode_key(b"u3:foo").unwrap(), (6, Key::from("foo")));
        assert_eq!(
            decode_key(b"4:spam").unwrap(),
            (6, Key::Bin(b"spam".to_vec()))
        );
        assert_eq!(decode_key(b"0:").unwrap(), (2, Key::Bin(Vec::new())));
        let err = decode_key(b"").unwrap_err();
        assert_eq!(
            (err.kind, err.position),
            (DecodeErrorKind::UnexpectedEndOfInput, 0)
        );
        let err = decode_key(b"nope").unwrap_err();
        assert_eq!((err.kind, err.position), (DecodeErrorKind::NoBinaryLength, 0));
    }

    #[test]
    fn canonical_bytes_round_trip() {
        let canon: &[&[u8]] = &[
            b"n",
            b"t",
            b"f",
            b"i0e",
            b"i-456e",
            b"le",
            b"de",
            b"0:",
            b"u0:",
            b"l4:spamu3:fooi7ee",
            b"d4:spamt4:spannu6:\xeb\x8b\xa8\xed\x8c\xa5i123ee",
        ];
        for bytes in canon {
            let value = decode(bytes).unwrap();
            assert_eq!(encode(&value).unwrap().as_slice(), *bytes);
        }
    }

    fn arb_value(rng: &mut StdRng, depth: u32) -> Value {
        let pick = if depth == 0 {
            rng.gen_range(0..5)
        } else {
            rng.gen_range(0..7)
        };
        match pick {
            0 => Value::Null,
            1 => Value::Bool(rng.gen()),
            2 => {
                let n: i64 = rng.gen();
                Value::from(n)
            }
            3 => {
                let len = rng.gen_range(0..40);
                Value::Bin((0..len).map(|_| rng.gen()).collect())
            }
            4 => {
                let len = rng.gen_range(0..12);
                Value::Text(
                    (0..len)
                        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
                        .collect(),
                )
            }
            5 => {
                let len = rng.gen_range(0..5usize);
                Value::List((0..len).map(|_| arb_value(rng, depth - 1)).collect())
            }
            _ => {
                let len = rng.gen_range(0..5usize);
                Value::from(ContentDict::from_entries((0..len).map(|i| {
                    let key = if rng.gen() {
                        Key::Text(format!("k{}", i))
                    } else {
                        Key::Bin(vec![rng.gen(); i + 1])
                    };
                    (key, arb_value(rng, depth - 1))
                })))
            }
        }
    }

    #[test]
    fn random_trees_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x42);
        for _ in 0..64 {
            let value = arb_value(&mut rng, 3);
            let bytes = encode(&value).unwrap();
            let decoded = decode(&bytes).unwrap();
            assert_eq!(decoded, value);
            // Canonical bytes re-encode to themselves.
            assert_eq!(encode(&decoded).unwrap(), bytes);
        }
    }

    #[test]
    fn decoded_values_reencode_with_any_policy() {
        let bytes = b"du1:ai1eu1:bi2ee";
        let value = decode(bytes).unwrap();
        let options = EncodeOptions {
            on_duplicate_keys: DuplicateKeys::UseLast,
            ..EncodeOptions::default()
        };
        assert_eq!(encode_with(&value, &options).unwrap().as_slice(), bytes);
    }
}
