//! The canonical encoder.
//!
//! Encoding always emits the canonical form: minimal decimal integers,
//! UTF-8 byte lengths for text, and dictionary entries sorted into the
//! canonical key order no matter how the backing store iterates.

use crate::dict::Dictionary;
use crate::error::EncodeError;
use crate::integer::Integer;
use crate::key::Key;
use crate::marker::{DELIM, DICT, END, FALSE, INT, LIST, MINUS, NULL, TEXT, TRUE};
use crate::size::{estimate_size, SizeAccuracy};
use crate::value::Value;

/// What to do when a dictionary backing yields two entries with equal keys.
///
/// The shipped backings deduplicate at construction, so this only fires for
/// custom [`Dictionary`] implementations that don't.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DuplicateKeys {
    /// Fail the encode with [`EncodeError::DuplicateKey`].
    #[default]
    Error,
    /// Keep the entry that was yielded first.
    UseFirst,
    /// Keep the entry that was yielded last.
    UseLast,
}

/// Encoder configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Duplicate-key policy for dictionary emission.
    pub on_duplicate_keys: DuplicateKeys,
    /// Permit tentative text length prefixes that are patched once the
    /// UTF-8 byte length is known. Strings here know that length up front,
    /// so both settings take the exact path and emit identical bytes; the
    /// flag is accepted for options-surface compatibility.
    pub speculative: bool,
}

/// How far a buffer write got.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Bytes written, starting at offset 0.
    pub written: usize,
    /// `false` when the buffer was too small to hold the full encoding.
    pub complete: bool,
}

/// Encode a value into a freshly allocated buffer, with default options.
pub fn encode(value: &Value) -> Result<Vec<u8>, EncodeError> {
    encode_with(value, &EncodeOptions::default())
}

/// Encode a value into a freshly allocated buffer.
///
/// Sizes the allocation with [`estimate_size`], writes once, and trims to
/// the bytes actually written.
pub fn encode_with(value: &Value, options: &EncodeOptions) -> Result<Vec<u8>, EncodeError> {
    let mut buf = vec![0u8; estimate_size(value, SizeAccuracy::BestEffort)];
    let outcome = encode_into(value, &mut buf, options)?;
    debug_assert!(outcome.complete);
    buf.truncate(outcome.written);
    Ok(buf)
}

/// Encode a value into a caller-supplied buffer, starting at offset 0.
///
/// Writes as much as fits and never past `buf.len()`. When the outcome
/// reports `complete: false`, the first `written` bytes are a valid prefix
/// of the full encoding; retry from scratch with a buffer of at least
/// [`estimate_size`] bytes to finish.
pub fn encode_into(
    value: &Value,
    buf: &mut [u8],
    options: &EncodeOptions,
) -> Result<WriteOutcome, EncodeError> {
    let mut writer = Writer::new(buf);
    put_value(&mut writer, value, options)?;
    Ok(writer.outcome())
}

/// Encode a lone key into a caller-supplied buffer.
///
/// Same truncation contract as [`encode_into`]. The options are accepted
/// for parity; no current option affects key emission.
pub fn encode_key_into(key: &Key, buf: &mut [u8], _options: &EncodeOptions) -> WriteOutcome {
    let mut writer = Writer::new(buf);
    put_key(&mut writer, key);
    writer.outcome()
}

/// Tracks how much of the output buffer is filled. Once the buffer runs
/// out, further writes are dropped and the writer reports incomplete.
struct Writer<'a> {
    buf: &'a mut [u8],
    written: usize,
    complete: bool,
}

impl<'a> Writer<'a> {
    fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            written: 0,
            complete: true,
        }
    }

    fn put(&mut self, bytes: &[u8]) {
        if !self.complete {
            return;
        }
        let room = self.buf.len() - self.written;
        let fits = bytes.len().min(room);
        self.buf[self.written..self.written + fits].copy_from_slice(&bytes[..fits]);
        self.written += fits;
        if fits < bytes.len() {
            self.complete = false;
        }
    }

    fn put_u8(&mut self, byte: u8) {
        if !self.complete {
            return;
        }
        if self.written < self.buf.len() {
            self.buf[self.written] = byte;
            self.written += 1;
        } else {
            self.complete = false;
        }
    }

    fn outcome(&self) -> WriteOutcome {
        WriteOutcome {
            written: self.written,
            complete: self.complete,
        }
    }
}

fn put_value(writer: &mut Writer, value: &Value, options: &EncodeOptions) -> Result<(), EncodeError> {
    if !writer.complete {
        return Ok(());
    }
    match value {
        Value::Null => writer.put_u8(NULL),
        Value::Bool(true) => writer.put_u8(TRUE),
        Value::Bool(false) => writer.put_u8(FALSE),
        Value::Int(int) => put_int(writer, int),
        Value::Bin(bytes) => put_bin(writer, bytes),
        Value::Text(text) => put_text(writer, text),
        Value::List(items) => {
            writer.put_u8(LIST);
            for item in items {
                put_value(writer, item, options)?;
                if !writer.complete {
                    return Ok(());
                }
            }
            writer.put_u8(END);
        }
        Value::Dict(dict) => put_dict(writer, dict.as_ref(), options)?,
    }
    Ok(())
}

fn put_int(writer: &mut Writer, int: &Integer) {
    writer.put_u8(INT);
    if int.is_negative() {
        writer.put_u8(MINUS);
    }
    writer.put(int.abs_decimal().as_bytes());
    writer.put_u8(END);
}

fn put_bin(writer: &mut Writer, bytes: &[u8]) {
    writer.put(bytes.len().to_string().as_bytes());
    writer.put_u8(DELIM);
    writer.put(bytes);
}

fn put_text(writer: &mut Writer, text: &str) {
    writer.put_u8(TEXT);
    writer.put(text.len().to_string().as_bytes());
    writer.put_u8(DELIM);
    writer.put(text.as_bytes());
}

fn put_key(writer: &mut Writer, key: &Key) {
    match key {
        Key::Bin(bytes) => put_bin(writer, bytes),
        Key::Text(text) => put_text(writer, text),
    }
}

fn put_dict(
    writer: &mut Writer,
    dict: &dyn Dictionary,
    options: &EncodeOptions,
) -> Result<(), EncodeError> {
    writer.put_u8(DICT);

    let mut entries: Vec<(Key, &Value, usize)> = dict
        .iter()
        .enumerate()
        .map(|(index, (key, value))| (key, value, index))
        .collect();
    // Canonical key order; ties (duplicate keys) ordered so the entry the
    // policy keeps comes first.
    entries.sort_by(|a, b| {
        a.0.cmp(&b.0).then_with(|| match options.on_duplicate_keys {
            DuplicateKeys::UseLast => b.2.cmp(&a.2),
            _ => a.2.cmp(&b.2),
        })
    });

    let mut prev: Option<&Key> = None;
    for (key, value, _) in entries.iter() {
        if prev == Some(key) {
            match options.on_duplicate_keys {
                DuplicateKeys::Error => {
                    return Err(EncodeError::DuplicateKey(key.clone()));
                }
                DuplicateKeys::UseFirst | DuplicateKeys::UseLast => continue,
            }
        }
        put_key(writer, key);
        put_value(writer, *value, options)?;
        if !writer.complete {
            return Ok(());
        }
        prev = Some(key);
    }
    writer.put_u8(END);
    Ok(())
}
