//! Archive-local text helpers.
//!
//! TEX archives store file names in the Windows ANSI code page and type tags
//! as byte-reversed four-character codes.

/// Decode archive-local bytes as Latin-1 (each byte maps to one code point).
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Encode a string back to archive-local bytes.
///
/// Code points above U+00FF cannot be represented and become `?`.
pub fn encode_latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Reverse a four-character code as stored in the archive.
#[inline]
pub fn reverse_tag(raw: [u8; 4]) -> [u8; 4] {
    [raw[3], raw[2], raw[1], raw[0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latin1_roundtrip() {
        let bytes = [b'a', 0xE9, b'b', 0xFF];
        let text = decode_latin1(&bytes);
        assert_eq!(text, "a\u{e9}b\u{ff}");
        assert_eq!(encode_latin1(&text), bytes);
    }

    #[test]
    fn test_unrepresentable_char() {
        assert_eq!(encode_latin1("x\u{263a}"), b"x?");
    }

    #[test]
    fn test_reverse_tag() {
        assert_eq!(&reverse_tag(*b"1TXD"), b"DXT1");
        assert_eq!(&reverse_tag(*b"  8I"), b"I8  ");
    }
}
