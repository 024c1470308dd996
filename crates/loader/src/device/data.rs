//! Literal data codec.
//!
//! A literal is stored as the 8-byte in-memory image of the configured value in the
//! requested byte order, together with the number of leading bytes that are written.

use std::fmt;

/// An endianness-converted literal ready to be replayed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct LiteralData {
    bytes: [u8; 8],
    len: u8,
}

impl LiteralData {
    /// Converts `value` to the selected byte order and keeps the first `len` bytes for writing.
    ///
    /// `len` must not exceed 8; the validator guarantees it for data writes.
    pub const fn encode(value: u64, len: u8, big_endian: bool) -> Self {
        let bytes = if big_endian {
            value.to_be_bytes()
        } else {
            value.to_le_bytes()
        };
        let len = if len > 8 { 8 } else { len };
        Self { bytes, len }
    }

    /// The bytes written to memory: only the first `len` bytes of the converted value.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The full converted 8-byte image, used as a register default.
    pub const fn word(&self) -> [u8; 8] {
        self.bytes
    }

    /// Number of bytes written to memory.
    pub const fn len(&self) -> u8 {
        self.len
    }

    /// True when nothing would be written.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for LiteralData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LiteralData(")?;
        for byte in self.as_slice() {
            write!(f, "{byte:02x}")?;
        }
        write!(f, ")")
    }
}
