//! Library error types.

use crate::key::Key;
use std::fmt;

/// An error raised while encoding a value.
///
/// The value grammar itself is a closed enum, so the only invariant a caller
/// can break at runtime is feeding the encoder a dictionary whose backing
/// store yields two entries with the same key while the duplicate-key policy
/// is [`DuplicateKeys::Error`](crate::DuplicateKeys::Error).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodeError {
    /// Two dictionary entries compared equal under key equality.
    DuplicateKey(Key),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EncodeError::DuplicateKey(key) => {
                write!(f, "duplicate dictionary key: {}", key)
            }
        }
    }
}

impl std::error::Error for EncodeError {}

/// What kind of malformed input the decoder ran into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DecodeErrorKind {
    /// A value was expected but the input ended.
    UnexpectedEndOfInput,
    /// A byte that cannot begin (or follow) a value at this offset.
    UnexpectedByte,
    /// An integer with no digits, e.g. `ie` or `i-e`.
    InvalidInteger,
    /// An integer's digits were not terminated by `e`.
    NoIntegerSuffix,
    /// A list was not terminated by `e`.
    NoListSuffix,
    /// A dictionary was not terminated by `e`.
    NoDictionarySuffix,
    /// A dictionary key sorted before the key emitted just prior to it.
    UnorderedDictionaryKeys,
    /// A dictionary key repeated the key emitted just prior to it.
    DuplicateDictionaryKeys,
    /// A binary value with no length digits.
    NoBinaryLength,
    /// A binary length that was not followed by `:`.
    NoBinaryDelimiter,
    /// A binary length larger than the remaining input.
    OverRunBinaryLength,
    /// A text value with no length digits.
    NoTextLength,
    /// A text length that was not followed by `:`.
    NoTextDelimiter,
    /// A text length larger than the remaining input.
    OverRunTextLength,
}

impl DecodeErrorKind {
    /// A short human-readable description of the failure.
    pub fn message(self) -> &'static str {
        use DecodeErrorKind::*;
        match self {
            UnexpectedEndOfInput => "unexpected end of input",
            UnexpectedByte => "unexpected byte",
            InvalidInteger => "integer has no digits",
            NoIntegerSuffix => "integer is missing its 'e' suffix",
            NoListSuffix => "list is missing its 'e' suffix",
            NoDictionarySuffix => "dictionary is missing its 'e' suffix",
            UnorderedDictionaryKeys => "dictionary keys are not in canonical order",
            DuplicateDictionaryKeys => "dictionary has duplicate keys",
            NoBinaryLength => "binary value has no length",
            NoBinaryDelimiter => "binary length is missing its ':' delimiter",
            OverRunBinaryLength => "binary length is larger than the remaining input",
            NoTextLength => "text value has no length",
            NoTextDelimiter => "text length is missing its ':' delimiter",
            OverRunTextLength => "text length is larger than the remaining input",
        }
    }
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// A decoding failure, carrying the byte offset at which the decoder stopped.
///
/// `position` is always within `0..=input.len()`, and the input up to
/// `position` is the prefix the decoder consumed before failing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeError {
    /// The failure classification.
    pub kind: DecodeErrorKind,
    /// Byte offset at which decoding stopped.
    pub position: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at offset {}", self.kind.message(), self.position)
    }
}

impl std::error::Error for DecodeError {}
