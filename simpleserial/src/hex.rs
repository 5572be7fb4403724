//! ASCII hex helpers for protocol 1.x frames.

const DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Encode a byte as two uppercase hex digits.
#[inline]
pub const fn encode(byte: u8) -> [u8; 2] {
    [DIGITS[(byte >> 4) as usize], DIGITS[(byte & 0x0f) as usize]]
}

/// Value of a single hex digit of either case.
#[inline]
pub const fn digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decode a pair of hex digits, high nibble first.
#[inline]
pub fn decode([high, low]: [u8; 2]) -> Option<u8> {
    Some((digit(high)? << 4) | digit(low)?)
}
