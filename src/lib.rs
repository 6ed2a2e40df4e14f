//! Bencodex serialization and deserialization.
//!
//! Bencodex is an ordered, canonical relative of Bencode with explicit
//! text/binary discrimination, booleans, null, arbitrary-precision
//! integers, and dictionaries whose keys sort in a fixed canonical order.
//! Every value has exactly one encoding, so equal trees always produce
//! equal bytes.
//!
//! The wire format:
//!
//! | Value     | Bytes                                                  |
//! |-----------|--------------------------------------------------------|
//! | null      | `n`                                                    |
//! | false     | `f`                                                    |
//! | true      | `t`                                                    |
//! | integer   | `i` decimal, `-` first when negative, then `e`         |
//! | binary    | decimal byte length, `:`, the raw bytes                |
//! | text      | `u`, decimal UTF-8 byte length, `:`, the UTF-8 bytes   |
//! | list      | `l`, the encoded items in order, `e`                   |
//! | dict      | `d`, the encoded pairs in canonical key order, `e`     |
//!
//! Dictionary keys sort with all binary keys first (bytewise, a prefix
//! before its extensions), then text keys in ordinal code-unit order.
//!
//! ```
//! use bencodex::{decode, encode, ContentDict, Key, Value};
//!
//! let dict = ContentDict::from_entries([(Key::from("foo"), Value::Bool(true))]);
//! let bytes = encode(&Value::from(dict)).unwrap();
//! assert_eq!(bytes, b"du3:foote");
//!
//! let value = decode(&bytes).unwrap();
//! assert_eq!(
//!     value.as_dict().and_then(|d| d.get(&Key::from("foo"))),
//!     Some(&Value::Bool(true))
//! );
//! ```
//!
//! Everything works on in-memory byte slices: the encoder writes into a
//! caller-supplied buffer (or allocates one sized by [`estimate_size`]),
//! and the decoder consumes a slice and reports the exact byte offset of
//! any failure. No global state is involved; encoding and decoding may run
//! concurrently from any number of threads on disjoint inputs.

mod decode;
mod dict;
mod encode;
mod error;
mod integer;
mod key;
mod marker;
mod natural;
mod size;
mod value;

pub use self::decode::{
    decode, decode_key, decode_value, decode_with, DecodeOptions, DictionaryBuilder,
    InvalidKeyOrder,
};
pub use self::dict::{ContentDict, Dictionary, Entries};
pub use self::encode::{
    encode, encode_into, encode_key_into, encode_with, DuplicateKeys, EncodeOptions, WriteOutcome,
};
pub use self::error::{DecodeError, DecodeErrorKind, EncodeError};
pub use self::integer::Integer;
pub use self::key::Key;
pub use self::size::{estimate_size, SizeAccuracy};
pub use self::value::Value;
