//! Charset conversion for analyzers that meet legacy text encodings.
//!
//! Binary formats of the era this pipeline parses store text as Latin-1,
//! UTF-16 with or without a BOM, or (rarely, and only in newer revisions)
//! UTF-8.  Analyzers hand the raw field bytes plus the charset label they
//! found to [`convert_to_utf8`] and always get a usable `String` back;
//! undecodable sequences degrade to replacement characters rather than
//! failing the whole record.

/// Convert `data` from `charset` to UTF-8, lossily.
///
/// Recognized labels (case-insensitive): `UTF-8`, `ISO-8859-1` / `latin1`,
/// `UTF-16` (BOM-sniffed, little-endian default), `UTF-16LE`, `UTF-16BE`.
/// Unrecognized labels fall back to Latin-1, which maps every byte to some
/// character and therefore never loses length information.
pub fn convert_to_utf8(data: &[u8], charset: &str) -> String {
    match charset.to_ascii_lowercase().as_str() {
        "utf-8" | "utf8" => String::from_utf8_lossy(data).into_owned(),
        "utf-16" | "utf16" => utf16_with_bom(data),
        "utf-16le" => utf16(data, false),
        "utf-16be" => utf16(data, true),
        _ => latin1(data),
    }
}

fn latin1(data: &[u8]) -> String {
    data.iter().map(|&b| b as char).collect()
}

fn utf16_with_bom(data: &[u8]) -> String {
    match data {
        [0xFF, 0xFE, rest @ ..] => utf16(rest, false),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, true),
        _ => utf16(data, false),
    }
}

fn utf16(data: &[u8], big_endian: bool) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .take_while(|&u| u != 0)
        .collect();
    String::from_utf16_lossy(&units)
}

/// Trim trailing NUL padding and surrounding whitespace from a fixed-width
/// text field.
pub fn trim_field(s: &str) -> &str {
    s.trim_matches('\0').trim()
}
