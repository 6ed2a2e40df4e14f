use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::key::Key;
use crate::value::Value;

/// Binary keys shorter than this live in the digest-keyed bucket.
pub(crate) const SHORT_BIN_LIMIT: usize = 32;

/// A borrowing iterator over a dictionary's entries.
///
/// Keys are yielded by value: backings store key material in whatever shape
/// suits their lookup structure, so a uniform borrowed key cannot be offered.
pub type Entries<'a> = Box<dyn Iterator<Item = (Key, &'a Value)> + 'a>;

/// The capability set a Bencodex dictionary backing must provide.
///
/// The encoder and decoder accept any implementation; the crate ships
/// [`ContentDict`] (the default) and an impl for `BTreeMap<Key, Value>`.
/// A backing is read-only once constructed. Implementations may iterate in
/// any order; the encoder re-sorts into canonical key order on every emit.
pub trait Dictionary: fmt::Debug + Send + Sync {
    /// Number of entries.
    fn len(&self) -> usize;

    /// Look up a value. Implementations must honor content equality for
    /// binary keys, not identity.
    fn get(&self, key: &Key) -> Option<&Value>;

    /// Iterate over all entries, in the backing's own order.
    fn iter(&self) -> Entries<'_>;

    /// Clone the backing behind a fresh box.
    fn clone_dict(&self) -> Box<dyn Dictionary>;

    /// Returns `true` if there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the key maps to a value.
    fn contains_key(&self, key: &Key) -> bool {
        self.get(key).is_some()
    }

    /// Iterate over all keys.
    fn keys(&self) -> Box<dyn Iterator<Item = Key> + '_> {
        Box::new(self.iter().map(|(key, _)| key))
    }

    /// Iterate over all values.
    fn values(&self) -> Box<dyn Iterator<Item = &Value> + '_> {
        Box::new(self.iter().map(|(_, value)| value))
    }

    /// Call `f` once per entry.
    fn for_each(&self, f: &mut dyn FnMut(&Key, &Value)) {
        for (key, value) in self.iter() {
            f(&key, value);
        }
    }
}

impl Clone for Box<dyn Dictionary> {
    fn clone(&self) -> Self {
        self.clone_dict()
    }
}

/// Deep dictionary equality across arbitrary backings.
///
/// Same size, and every entry of `a` has a key-equal entry in `b` with an
/// equal value. When `b.get` misses — a backing whose lookup doesn't honor
/// content equality for binary keys — fall back to a linear scan of `b`.
pub(crate) fn dict_eq(a: &dyn Dictionary, b: &dyn Dictionary) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().all(|(key, value)| match b.get(&key) {
        Some(found) => *value == *found,
        None => b.iter().any(|(bk, bv)| bk == key && *bv == *value),
    })
}

/// The default dictionary backing: a content-addressed store.
///
/// Entries live in three buckets. Text keys map through their string form.
/// Binary keys shorter than 32 bytes are keyed by a base64 digest of their
/// contents, so the map's native string comparison gives content-equal
/// lookups. Longer binary keys go to a linear-scan list; they are rare
/// enough that the scan is the pragmatic fallback.
///
/// Construction is the only mutation: build one with
/// [`from_entries`](Self::from_entries) or `collect()`. A key that repeats
/// during construction replaces the earlier value and does not grow the
/// dictionary — last write wins.
#[derive(Clone, Debug, Default)]
pub struct ContentDict {
    texts: BTreeMap<String, Value>,
    short_bins: BTreeMap<String, Value>,
    long_bins: Vec<(Vec<u8>, Value)>,
}

fn digest(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn undigest(digest: &str) -> Key {
    // Digests are produced by `digest` above and nowhere else.
    Key::Bin(
        STANDARD
            .decode(digest)
            .expect("short-key digests are valid base64"),
    )
}

impl ContentDict {
    /// Create an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from key-value pairs, resolving repeated keys by
    /// last insertion.
    pub fn from_entries(entries: impl IntoIterator<Item = (Key, Value)>) -> Self {
        let mut dict = Self::new();
        for (key, value) in entries {
            dict.insert(key, value);
        }
        dict
    }

    pub(crate) fn insert(&mut self, key: Key, value: Value) {
        match key {
            Key::Text(text) => {
                self.texts.insert(text, value);
            }
            Key::Bin(bytes) if bytes.len() < SHORT_BIN_LIMIT => {
                self.short_bins.insert(digest(&bytes), value);
            }
            Key::Bin(bytes) => {
                match self.long_bins.iter_mut().find(|(b, _)| *b == bytes) {
                    Some(slot) => slot.1 = value,
                    None => self.long_bins.push((bytes, value)),
                }
            }
        }
    }
}

impl Dictionary for ContentDict {
    fn len(&self) -> usize {
        self.texts.len() + self.short_bins.len() + self.long_bins.len()
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        match key {
            Key::Text(text) => self.texts.get(text),
            Key::Bin(bytes) if bytes.len() < SHORT_BIN_LIMIT => {
                self.short_bins.get(&digest(bytes))
            }
            Key::Bin(bytes) => self
                .long_bins
                .iter()
                .find(|(b, _)| b == bytes)
                .map(|(_, value)| value),
        }
    }

    fn iter(&self) -> Entries<'_> {
        Box::new(
            self.texts
                .iter()
                .map(|(text, value)| (Key::Text(text.clone()), value))
                .chain(
                    self.short_bins
                        .iter()
                        .map(|(digest, value)| (undigest(digest), value)),
                )
                .chain(
                    self.long_bins
                        .iter()
                        .map(|(bytes, value)| (Key::Bin(bytes.clone()), value)),
                ),
        )
    }

    fn clone_dict(&self) -> Box<dyn Dictionary> {
        Box::new(self.clone())
    }
}

impl PartialEq for ContentDict {
    fn eq(&self, other: &Self) -> bool {
        dict_eq(self, other)
    }
}

impl FromIterator<(Key, Value)> for ContentDict {
    fn from_iter<I: IntoIterator<Item = (Key, Value)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

/// A plain ordered-map backing. Iterates in canonical key order for free,
/// since `Key: Ord` is the canonical order.
impl Dictionary for BTreeMap<Key, Value> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn get(&self, key: &Key) -> Option<&Value> {
        BTreeMap::get(self, key)
    }

    fn iter(&self) -> Entries<'_> {
        Box::new(BTreeMap::iter(self).map(|(key, value)| (key.clone(), value)))
    }

    fn clone_dict(&self) -> Box<dyn Dictionary> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(len: usize) -> Key {
        Key::Bin(vec![0xab; len])
    }

    #[test]
    fn text_lookup() {
        let dict = ContentDict::from_entries([
            (Key::from("foo"), Value::Bool(true)),
            (Key::from("bar"), Value::Null),
        ]);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get(&Key::from("foo")), Some(&Value::Bool(true)));
        assert_eq!(dict.get(&Key::from("bar")), Some(&Value::Null));
        assert_eq!(dict.get(&Key::from("baz")), None);
        // A binary key with the same bytes is a different key.
        assert_eq!(dict.get(&Key::from(b"foo".as_slice())), None);
    }

    #[test]
    fn binary_lookup_is_by_content() {
        let dict = ContentDict::from_entries([
            (Key::Bin(b"spam".to_vec()), Value::Bool(true)),
            (Key::Bin(vec![0x11; 1024]), Value::Null),
        ]);
        // Fresh allocations with equal contents must hit.
        assert_eq!(
            dict.get(&Key::Bin(b"spam".to_vec())),
            Some(&Value::Bool(true))
        );
        assert_eq!(dict.get(&Key::Bin(vec![0x11; 1024])), Some(&Value::Null));
        assert_eq!(dict.get(&Key::Bin(vec![0x11; 1023])), None);
    }

    #[test]
    fn bucket_threshold_boundary() {
        let dict = ContentDict::from_entries([
            (bin(31), Value::from(31)),
            (bin(32), Value::from(32)),
            (bin(33), Value::from(33)),
        ]);
        assert_eq!(dict.len(), 3);
        for len in [31usize, 32, 33] {
            assert_eq!(dict.get(&bin(len)), Some(&Value::from(len)));
        }
        assert_eq!(dict.keys().count(), 3);
    }

    #[test]
    fn last_write_wins_in_every_bucket() {
        let dict = ContentDict::from_entries([
            (Key::from("k"), Value::from(1)),
            (bin(4), Value::from(2)),
            (bin(100), Value::from(3)),
            (Key::from("k"), Value::from(10)),
            (bin(4), Value::from(20)),
            (bin(100), Value::from(30)),
        ]);
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.get(&Key::from("k")), Some(&Value::from(10)));
        assert_eq!(dict.get(&bin(4)), Some(&Value::from(20)));
        assert_eq!(dict.get(&bin(100)), Some(&Value::from(30)));
    }

    #[test]
    fn iteration_covers_all_buckets() {
        let dict = ContentDict::from_entries([
            (Key::from("text"), Value::Null),
            (bin(3), Value::Null),
            (bin(64), Value::Null),
            (Key::Bin(Vec::new()), Value::Null),
        ]);
        let mut keys: Vec<Key> = dict.keys().collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![Key::Bin(Vec::new()), bin(3), bin(64), Key::from("text")]
        );
        assert_eq!(dict.values().count(), 4);
    }

    #[test]
    fn for_each_visits_every_entry() {
        let dict = ContentDict::from_entries([
            (Key::from("a"), Value::from(1)),
            (Key::from("b"), Value::from(2)),
        ]);
        let mut seen = Vec::new();
        dict.for_each(&mut |key, value| seen.push((key.clone(), value.clone())));
        seen.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            seen,
            vec![
                (Key::from("a"), Value::from(1)),
                (Key::from("b"), Value::from(2)),
            ]
        );
    }

    #[test]
    fn equality_across_backings() {
        let content = ContentDict::from_entries([
            (Key::from("text"), Value::from(1)),
            (Key::Bin(b"bin".to_vec()), Value::from(2)),
        ]);
        let mut tree: BTreeMap<Key, Value> = BTreeMap::new();
        tree.insert(Key::from("text"), Value::from(1));
        tree.insert(Key::Bin(b"bin".to_vec()), Value::from(2));
        assert!(dict_eq(&content, &tree));
        assert!(dict_eq(&tree, &content));

        tree.insert(Key::Bin(b"bin".to_vec()), Value::from(9));
        assert!(!dict_eq(&content, &tree));
    }

    #[test]
    fn size_mismatch_is_unequal() {
        let a = ContentDict::from_entries([(Key::from("x"), Value::Null)]);
        let b = ContentDict::new();
        assert!(!dict_eq(&a, &b));
        assert!(b.is_empty());
    }
}
