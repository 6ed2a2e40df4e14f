//! Byte markers of the Bencodex wire format. For internal use only.

pub(crate) const NULL: u8 = b'n';
pub(crate) const TRUE: u8 = b't';
pub(crate) const FALSE: u8 = b'f';
pub(crate) const INT: u8 = b'i';
pub(crate) const TEXT: u8 = b'u';
pub(crate) const LIST: u8 = b'l';
pub(crate) const DICT: u8 = b'd';
pub(crate) const END: u8 = b'e';
pub(crate) const DELIM: u8 = b':';
pub(crate) const MINUS: u8 = b'-';
