//! Best-effort ASCII mapping at the transport boundary.
//!
//! None of these functions fail: unmappable input becomes the placeholder
//! byte on the way out and is dropped on the way in.

use crate::transport::PLACEHOLDER;

/// Transliterates a message to its nearest ASCII representation.
///
/// Characters without a reasonable mapping become `?`.
pub fn transliterate(message: &str) -> String {
    deunicode::deunicode_with_tofu(message, "?")
}

/// Encodes one character for the wire, substituting the placeholder.
pub fn encode_char(c: char) -> u8 {
    if c.is_ascii() { c as u8 } else { PLACEHOLDER }
}

/// Encodes a string for the wire, one byte per character.
pub fn encode_lossy(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

/// Decodes received bytes as ASCII, dropping anything outside the range.
pub fn decode_lenient(bytes: &[u8]) -> String {
    bytes
        .iter()
        .filter(|b| b.is_ascii())
        .map(|&b| char::from(b))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transliterate_accents_and_quotes() {
        assert_eq!(transliterate("café “olé”"), "cafe \"ole\"");
    }

    #[test]
    fn test_transliterate_keeps_ascii_control_bytes() {
        assert_eq!(transliterate("a\r     b"), "a\r     b");
    }

    #[test]
    fn test_encode_substitutes_placeholder() {
        assert_eq!(encode_lossy("a→b"), b"a?b".to_vec());
        assert_eq!(encode_char('\u{8}'), 0x08);
    }

    #[test]
    fn test_decode_drops_high_bytes() {
        assert_eq!(decode_lenient(&[b'h', 0xff, b'i', 0x80]), "hi");
        assert_eq!(decode_lenient(&[]), "");
    }
}
