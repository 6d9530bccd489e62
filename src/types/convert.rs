//! Conversions between byte buffers and their textual forms.
//!
//! - hex: lowercase, no prefix on output; an optional `0x` is accepted on input
//! - UTF-8: strict on decode
//! - raw byte strings: one `char` per byte (code points `0..=255`)

/// Prefix used for hex text throughout the crate.
pub const HEX_PREFIX: &str = "0x";

/// Encodes bytes as lowercase hex without a prefix.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Encodes bytes as lowercase hex with the `0x` prefix.
pub fn bytes_to_prefixed_hex(bytes: &[u8]) -> String {
    format!("{HEX_PREFIX}{}", hex::encode(bytes))
}

/// Decodes hex text, with or without the `0x` prefix.
///
/// Returns `None` for odd-length input or non-hex digits.
pub fn hex_to_bytes(text: &str) -> Option<Vec<u8>> {
    hex::decode(strip_hex_prefix(text)).ok()
}

/// Removes a leading `0x`/`0X`, if any.
pub fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

/// Returns true if `text` (prefix optional) decodes as hex.
pub fn is_hex(text: &str) -> bool {
    let digits = strip_hex_prefix(text);
    digits.len() % 2 == 0 && digits.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Returns true if `text` is exactly `0x` followed by an even number of
/// lowercase hex digits, i.e. the form [`bytes_to_prefixed_hex`] produces.
pub fn is_canonical_hex(text: &str) -> bool {
    match text.strip_prefix(HEX_PREFIX) {
        Some(digits) => {
            digits.len() % 2 == 0
                && digits
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        }
        None => false,
    }
}

/// Returns the UTF-8 bytes of a string.
pub fn utf8_to_bytes(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

/// Decodes UTF-8 bytes, returning `None` on invalid sequences.
pub fn bytes_to_utf8(bytes: &[u8]) -> Option<String> {
    String::from_utf8(bytes.to_vec()).ok()
}

/// Converts a raw byte string (one char per byte) into bytes.
///
/// Returns `None` if any char is above `U+00FF`.
pub fn raw_to_bytes(text: &str) -> Option<Vec<u8>> {
    text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect()
}

/// Converts bytes into a raw byte string (one char per byte).
pub fn bytes_to_raw(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Returns a copy of `bytes` in reverse order.
pub fn swap_endianness(bytes: &[u8]) -> Vec<u8> {
    bytes.iter().rev().copied().collect()
}

/// Reverses `bytes` in place.
pub fn swap_endianness_in_place(bytes: &mut [u8]) {
    bytes.reverse();
}

/// Byte-wise equality. Not constant time.
pub fn bytes_equal(a: &[u8], b: &[u8]) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip_with_and_without_prefix() {
        let bytes = vec![0x00, 0xab, 0xff];
        assert_eq!(bytes_to_hex(&bytes), "00abff");
        assert_eq!(bytes_to_prefixed_hex(&bytes), "0x00abff");
        assert_eq!(hex_to_bytes("00abff"), Some(bytes.clone()));
        assert_eq!(hex_to_bytes("0x00ABFF"), Some(bytes));
    }

    #[test]
    fn hex_rejects_odd_length_and_bad_digits() {
        assert_eq!(hex_to_bytes("abc"), None);
        assert_eq!(hex_to_bytes("0xzz"), None);
        assert!(!is_hex("0x123"));
        assert!(is_hex(""));
    }

    #[test]
    fn canonical_hex_requires_lowercase_and_prefix() {
        assert!(is_canonical_hex("0x"));
        assert!(is_canonical_hex("0xdeadbeef"));
        assert!(!is_canonical_hex("deadbeef"));
        assert!(!is_canonical_hex("0xDEADBEEF"));
        assert!(!is_canonical_hex("0xabc"));
    }

    #[test]
    fn utf8_conversions() {
        assert_eq!(utf8_to_bytes("h\u{e9}"), vec![0x68, 0xc3, 0xa9]);
        assert_eq!(bytes_to_utf8(&[0x68, 0xc3, 0xa9]).as_deref(), Some("h\u{e9}"));
        assert_eq!(bytes_to_utf8(&[0xff, 0xfe]), None);
    }

    #[test]
    fn raw_byte_strings_map_chars_to_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let raw = bytes_to_raw(&bytes);
        assert_eq!(raw.chars().count(), 256);
        assert_eq!(raw_to_bytes(&raw), Some(bytes));
        assert_eq!(raw_to_bytes("\u{100}"), None);
    }

    #[test]
    fn endianness_swap() {
        assert_eq!(swap_endianness(&[1, 2, 3]), vec![3, 2, 1]);
        let mut buf = [1u8, 2, 3, 4];
        swap_endianness_in_place(&mut buf);
        assert_eq!(buf, [4, 3, 2, 1]);
    }

    #[test]
    fn equality() {
        assert!(bytes_equal(b"abc", b"abc"));
        assert!(!bytes_equal(b"abc", b"abd"));
        assert!(!bytes_equal(b"abc", b"ab"));
    }
}
