use std::cmp::Ordering;
use std::fmt;

/// A Bencodex dictionary key: either Unicode text or a binary blob.
///
/// Two keys are equal only when they are the same variant with the same
/// contents; a text key never equals a binary key, even when their byte
/// representations coincide. Equality and hashing go by content, so keys
/// behave content-addressed in any std map.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// A binary key. Sorts before every text key.
    Bin(Vec<u8>),
    /// A text key.
    Text(String),
}

impl Key {
    /// Returns `true` if this is a text key.
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self, Key::Text(_))
    }

    /// Returns `true` if this is a binary key.
    #[inline]
    pub fn is_bin(&self) -> bool {
        matches!(self, Key::Bin(_))
    }

    /// Returns the text contents, if this is a text key.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Key::Text(v) => Some(v),
            Key::Bin(_) => None,
        }
    }

    /// Returns the binary contents, if this is a binary key.
    #[inline]
    pub fn as_bin(&self) -> Option<&[u8]> {
        match self {
            Key::Bin(v) => Some(v),
            Key::Text(_) => None,
        }
    }
}

/// The canonical Bencodex key order.
///
/// Binary keys sort before text keys. Binary keys compare bytewise, a
/// shorter prefix sorting before its extensions. Text keys compare by their
/// UTF-16 code unit sequences, the ordinal string order of the format; this
/// differs from `str`'s own ordering for supplementary-plane characters,
/// whose surrogate pairs sort below the code units `U+E000..=U+FFFF`.
impl Ord for Key {
    fn cmp(&self, other: &Key) -> Ordering {
        match (self, other) {
            (Key::Bin(lhs), Key::Bin(rhs)) => lhs.cmp(rhs),
            (Key::Bin(_), Key::Text(_)) => Ordering::Less,
            (Key::Text(_), Key::Bin(_)) => Ordering::Greater,
            (Key::Text(lhs), Key::Text(rhs)) => lhs.encode_utf16().cmp(rhs.encode_utf16()),
        }
    }
}

impl PartialOrd for Key {
    fn partial_cmp(&self, other: &Key) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Key::Text(v) => write!(f, "\"{}\"", v),
            Key::Bin(v) => {
                f.write_str("b\"")?;
                for byte in v {
                    write!(f, "\\x{:02x}", byte)?;
                }
                f.write_str("\"")
            }
        }
    }
}

impl From<&str> for Key {
    fn from(v: &str) -> Self {
        Key::Text(v.to_string())
    }
}

impl From<String> for Key {
    fn from(v: String) -> Self {
        Key::Text(v)
    }
}

impl From<&[u8]> for Key {
    fn from(v: &[u8]) -> Self {
        Key::Bin(v.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(v: Vec<u8>) -> Self {
        Key::Bin(v)
    }
}

impl serde::Serialize for Key {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Key::Text(v) => serializer.serialize_str(v),
            Key::Bin(v) => serializer.serialize_bytes(v),
        }
    }
}

impl<'de> serde::Deserialize<'de> for Key {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct KeyVisitor;
        impl<'de> serde::de::Visitor<'de> for KeyVisitor {
            type Value = Key;

            fn expecting(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
                fmt.write_str("a text or binary dictionary key")
            }

            fn visit_str<E: serde::de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Key::Text(v.to_string()))
            }

            fn visit_string<E: serde::de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(Key::Text(v))
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Ok(Key::Bin(v.to_vec()))
            }

            fn visit_byte_buf<E: serde::de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                Ok(Key::Bin(v))
            }
        }

        deserializer.deserialize_any(KeyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_and_binary_never_equal() {
        let text = Key::from("foo");
        let bin = Key::from(b"foo".as_slice());
        assert_ne!(text, bin);
        assert_eq!(text, Key::Text("foo".into()));
        assert_eq!(bin, Key::Bin(b"foo".to_vec()));
    }

    #[test]
    fn binary_sorts_before_text() {
        assert!(Key::from(b"zzz".as_slice()) < Key::from("aaa"));
        // Shared prefix bytes don't matter; the variant decides.
        assert!(Key::from(b"foo".as_slice()) < Key::from("foo"));
        assert!(Key::from(b"".as_slice()) < Key::from(""));
    }

    #[test]
    fn binary_prefix_sorts_first() {
        assert!(Key::from(b"spam".as_slice()) < Key::from(b"span".as_slice()));
        assert!(Key::from(b"spa".as_slice()) < Key::from(b"spam".as_slice()));
        assert!(Key::from(b"".as_slice()) < Key::from(b"\x00".as_slice()));
    }

    #[test]
    fn text_order_is_code_unit_order() {
        assert!(Key::from("spam") < Key::from("span"));
        assert!(Key::from("단팥") > Key::from("span"));
        // U+10000 encodes as the surrogate pair D800 DC00, which sorts below
        // the single code unit E000 even though its scalar value is higher.
        assert!("\u{10000}" > "\u{e000}");
        assert!(Key::from("\u{10000}") < Key::from("\u{e000}"));
    }

    #[test]
    fn order_is_total() {
        let mut keys = vec![
            Key::from("단팥"),
            Key::from(b"span".as_slice()),
            Key::from("a"),
            Key::from(b"spam".as_slice()),
            Key::from(b"".as_slice()),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                Key::from(b"".as_slice()),
                Key::from(b"spam".as_slice()),
                Key::from(b"span".as_slice()),
                Key::from("a"),
                Key::from("단팥"),
            ]
        );
    }
}
