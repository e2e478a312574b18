//! Marker-byte escaping for smuggling binary payloads through string
//! records.
//!
//! The encoded form never contains the value zero except as its final
//! terminator: input is processed in chunks of at most 254 bytes, each
//! chunk is prefixed with a marker value that does not occur in it, and any
//! zero byte inside the chunk is rewritten to the marker.  Decoding reverses
//! the substitution per 255-value segment.
//!
//! A Rust `String` must be valid UTF-8, so each byte value of the encoded
//! stream is stored as the corresponding `char` in `U+0001..=U+00FF`.  The
//! scheme stays exact at the byte-value level and the round-trip law
//! `binary_decode(binary_encode(x)) == x` holds for every input.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    /// A chunk used every value in `1..=255`, leaving no marker candidate.
    /// A 254-byte chunk has at most 254 distinct non-zero values, so this
    /// cannot happen for well-formed chunk sizes; the variant exists so the
    /// search failure is still a checked error rather than a panic.
    #[error("no unused marker value available for chunk")]
    MarkerExhausted,
    /// The encoded string contains a character outside `U+0000..=U+00FF`,
    /// which no encoder output can contain.
    #[error("encoded data contains non-byte character {0:?}")]
    NonByteChar(char),
}

const CHUNK: usize = 254;

/// Encode arbitrary bytes as a printable, terminator-delimited string.
pub fn binary_encode(data: &[u8]) -> Result<String, CodecError> {
    let mut out = String::with_capacity(data.len() + data.len() / CHUNK + 2);
    for chunk in data.chunks(CHUNK) {
        let mut present = [false; 256];
        for &b in chunk {
            present[b as usize] = true;
        }
        let marker = (1u16..=255)
            .find(|&m| !present[m as usize])
            .ok_or(CodecError::MarkerExhausted)? as u8;
        out.push(marker as char);
        for &b in chunk {
            out.push(if b == 0 { marker as char } else { b as char });
        }
    }
    out.push('\0');
    Ok(out)
}

/// Decode a string produced by [`binary_encode`].
///
/// Total over arbitrary input: truncated or corrupt encodings yield an
/// error or a short result, never a panic or an out-of-bounds read.
pub fn binary_decode(encoded: &str) -> Result<Vec<u8>, CodecError> {
    let mut values = Vec::with_capacity(encoded.len());
    for c in encoded.chars() {
        if c == '\0' {
            break;
        }
        let v = u32::from(c);
        if v > 0xFF {
            return Err(CodecError::NonByteChar(c));
        }
        values.push(v as u8);
    }

    let mut out = Vec::with_capacity(values.len());
    for segment in values.chunks(CHUNK + 1) {
        let marker = segment[0];
        for &v in &segment[1..] {
            out.push(if v == marker { 0 } else { v });
        }
    }
    Ok(out)
}
