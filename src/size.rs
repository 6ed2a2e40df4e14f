//! Pre-flight byte counts for encoded values.

use crate::key::Key;
use crate::value::Value;

/// How tight the estimate has to be.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SizeAccuracy {
    /// Exact byte count, provided no dictionary carries duplicate keys.
    /// Big integers are rendered to count their decimal digits.
    #[default]
    BestEffort,
    /// Bound big-integer digit counts from their bit length instead of
    /// rendering them. Still an upper bound, just a looser one.
    FastGuess,
}

/// Number of bytes `value` encodes to, or an upper bound on it.
///
/// The result is always `>= encode(value).len()`, and with
/// [`SizeAccuracy::BestEffort`] it is exact unless a dictionary backing
/// yields duplicate keys (the skip-or-fail duplicate policies can only
/// shrink the output). The one-shot encoder sizes its allocation with this.
pub fn estimate_size(value: &Value, accuracy: SizeAccuracy) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 1,
        Value::Int(int) => {
            let digits = match accuracy {
                SizeAccuracy::BestEffort => int.decimal_digits(),
                SizeAccuracy::FastGuess => int.decimal_digits_bound(),
            };
            1 + usize::from(int.is_negative()) + digits + 1
        }
        Value::Bin(bytes) => decimal_len(bytes.len()) + 1 + bytes.len(),
        Value::Text(text) => 1 + decimal_len(text.len()) + 1 + text.len(),
        Value::List(items) => {
            2 + items
                .iter()
                .map(|item| estimate_size(item, accuracy))
                .sum::<usize>()
        }
        Value::Dict(dict) => {
            2 + dict
                .iter()
                .map(|(key, value)| key_size(&key) + estimate_size(value, accuracy))
                .sum::<usize>()
        }
    }
}

/// Exact byte count of an encoded key.
pub(crate) fn key_size(key: &Key) -> usize {
    match key {
        Key::Bin(bytes) => decimal_len(bytes.len()) + 1 + bytes.len(),
        Key::Text(text) => 1 + decimal_len(text.len()) + 1 + text.len(),
    }
}

fn decimal_len(n: usize) -> usize {
    if n == 0 {
        1
    } else {
        (n.ilog10() + 1) as usize
    }
}
