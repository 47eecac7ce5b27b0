//! Byte-order-mark aware decoding of raw robots.txt bodies

use std::borrow::Cow;

const BOM_UTF8: &[u8] = &[0xEF, 0xBB, 0xBF];
const BOM_UTF16_LE: &[u8] = &[0xFF, 0xFE];
const BOM_UTF16_BE: &[u8] = &[0xFE, 0xFF];

/// Decodes a robots.txt body into text
///
/// # Examples
///
/// ```
/// use robotgate::robots::decode_body;
///
/// assert_eq!(decode_body(b"\xEF\xBB\xBFUser-agent: *"), "User-agent: *");
/// assert_eq!(decode_body(b"Disallow: /\xFF"), "Disallow: /\u{FFFD}");
/// ```
pub fn decode_body(bytes: &[u8]) -> Cow<'_, str> {
    if let Some(rest) = bytes.strip_prefix(BOM_UTF8) {
        String::from_utf8_lossy(rest)
    } else if let Some(rest) = bytes.strip_prefix(BOM_UTF16_LE) {
        Cow::Owned(decode_utf16(rest, u16::from_le_bytes))
    } else if let Some(rest) = bytes.strip_prefix(BOM_UTF16_BE) {
        Cow::Owned(decode_utf16(rest, u16::from_be_bytes))
    } else {
        String::from_utf8_lossy(bytes)
    }
}

fn decode_utf16(bytes: &[u8], unit: fn([u8; 2]) -> u16) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| unit([pair[0], pair[1]]))
        .collect();

    // A dangling odd byte cannot form a code unit
    if bytes.len() % 2 == 1 {
        units.push(0xFFFD);
    }

    char::decode_utf16(units)
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
