//! Length-prefixed record framing.
//!
//! A record is a little-endian length prefix followed by the payload. Records of
//! different sizes share one ring without side bookkeeping. Unlike raw transfers,
//! record operations are all-or-nothing: a record that does not fit is rejected
//! whole, since a truncated record could not be parsed back.

/// Width of the length prefix stored ahead of each record.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PrefixWidth {
    /// No prefix; records are opaque byte runs.
    None,
    /// One byte, payloads up to 255 bytes.
    #[default]
    U8,
    /// Two bytes little-endian, payloads up to 65535 bytes.
    U16,
}

impl PrefixWidth {
    /// Prefix size in bytes.
    #[inline]
    pub const fn bytes(self) -> usize {
        match self {
            PrefixWidth::None => 0,
            PrefixWidth::U8 => 1,
            PrefixWidth::U16 => 2,
        }
    }

    /// Largest payload the prefix can describe.
    #[inline]
    pub const fn max_len(self) -> usize {
        match self {
            PrefixWidth::None => usize::MAX,
            PrefixWidth::U8 => u8::MAX as usize,
            PrefixWidth::U16 => u16::MAX as usize,
        }
    }

    /// Prefix bytes for `len`, low byte first. Only the first `bytes()` are meaningful.
    #[inline]
    pub(crate) const fn encode(self, len: usize) -> [u8; 2] {
        [len as u8, (len >> 8) as u8]
    }

    #[inline]
    pub(crate) const fn decode(self, prefix: [u8; 2]) -> usize {
        match self {
            PrefixWidth::None => 0,
            PrefixWidth::U8 => prefix[0] as usize,
            PrefixWidth::U16 => u16::from_le_bytes(prefix) as usize,
        }
    }
}
