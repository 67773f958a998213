//! Text decoding for uploaded price tables of unknown encoding.
//!
//! Encodings are tried in a fixed order: UTF-8 (BOM stripped), Latin-1, then
//! Windows-1252. Latin-1 accepts every byte, so decoding never fails; the
//! cp1252 pass only runs when the Latin-1 result contains C1 control
//! characters, which real Latin-1 tables never do.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Latin1,
    Windows1252,
}

/// Code points for bytes 0x80..=0x9F under Windows-1252. Undefined slots map to
/// the Latin-1 control character of the same value.
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{0081}', '\u{201A}', '\u{0192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{02C6}', '\u{2030}', '\u{0160}', '\u{2039}', '\u{0152}', '\u{008D}', '\u{017D}', '\u{008F}',
    '\u{0090}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{02DC}', '\u{2122}', '\u{0161}', '\u{203A}', '\u{0153}', '\u{009D}', '\u{017E}', '\u{0178}',
];

/// Decode raw bytes into text, reporting which encoding succeeded.
pub fn decode_text(bytes: &[u8]) -> (String, TextEncoding) {
    let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(body) {
        return (text.to_string(), TextEncoding::Utf8);
    }

    let has_c1 = body.iter().any(|b| (0x80..=0x9F).contains(b));
    if !has_c1 {
        return (body.iter().map(|&b| b as char).collect(), TextEncoding::Latin1);
    }

    let text = body
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize],
            _ => b as char,
        })
        .collect();
    (text, TextEncoding::Windows1252)
}
