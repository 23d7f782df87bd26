//! Character reference decoding and attribute escaping
//!
//! Decoding goes one `&...;` unit at a time through `html_escape`'s HTML5
//! table so every decoded byte keeps the raw offset of the unit behind it.

use std::borrow::Cow;

/// Longest HTML5 reference name, plus the `;`
const MAX_REFERENCE_LEN: usize = 32;

/// Decoded text with a map back into the raw markup.
///
/// `offsets[i]` is the raw byte index where the unit producing decoded byte
/// `i` starts; `offsets[text.len()]` is the raw length.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub text: String,
    pub offsets: Vec<usize>,
}

impl Decoded {
    /// Map a decoded byte range to the raw byte range that produced it.
    pub fn raw_range(&self, start: usize, end: usize) -> (usize, usize) {
        (self.offsets[start], self.offsets[end])
    }
}

pub fn decode_with_offsets(raw: &str) -> Decoded {
    let mut text = String::with_capacity(raw.len());
    let mut offsets = Vec::with_capacity(raw.len() + 1);
    let mut pos = 0;

    while pos < raw.len() {
        let rest = &raw[pos..];
        if let Some(len) = reference_len(rest) {
            let unit = &rest[..len];
            let decoded = html_escape::decode_html_entities(unit);
            if decoded != unit {
                for _ in 0..decoded.len() {
                    offsets.push(pos);
                }
                text.push_str(&decoded);
                pos += len;
                continue;
            }
        }
        let ch = rest.chars().next().unwrap_or('\u{fffd}');
        for _ in 0..ch.len_utf8() {
            offsets.push(pos);
        }
        text.push(ch);
        pos += ch.len_utf8();
    }
    offsets.push(raw.len());

    Decoded { text, offsets }
}

/// Decode character references in a text fragment.
pub fn decode(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    decode_with_offsets(raw).text
}

/// Byte length of a `&name;` or `&#num;` unit at the start of `s`.
fn reference_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix('&')?;
    let end = body
        .char_indices()
        .take(MAX_REFERENCE_LEN)
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '#'))
        .filter(|(_, c)| *c == ';')
        .map(|(i, _)| i)?;
    (end > 0).then_some(end + 2)
}

/// Escape text for use inside a double-quoted attribute value.
pub fn escape_attribute(value: &str) -> Cow<'_, str> {
    html_escape::encode_double_quoted_attribute(value)
}
