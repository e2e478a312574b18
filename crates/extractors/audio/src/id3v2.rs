//! ID3v2 frame-table walk, parameterized by major revision.
//!
//! Revision differences that matter here:
//!   v2.2 — 3-byte frame IDs, 24-bit big-endian frame sizes, no flags;
//!   v2.3 — 4-byte IDs, plain 32-bit sizes, 2 flag bytes;
//!   v2.4 — 4-byte IDs, syncsafe sizes, 2 flag bytes.
//! Every size field is attacker-controlled and is validated against the
//! remaining tag body before any slice is taken.

use sift_core::convert::convert_to_utf8;
use sift_core::KeywordType;

use crate::id3v1::GENRES;

const HEADER_LEN: usize = 10;

struct FrameMap {
    v22: &'static str,
    v23: &'static str,
    keyword_type: KeywordType,
}

const FRAME_MAP: &[FrameMap] = &[
    FrameMap { v22: "TT2", v23: "TIT2", keyword_type: KeywordType::Title },
    FrameMap { v22: "TP1", v23: "TPE1", keyword_type: KeywordType::Artist },
    FrameMap { v22: "TAL", v23: "TALB", keyword_type: KeywordType::Album },
    FrameMap { v22: "TYE", v23: "TYER", keyword_type: KeywordType::Date },
    FrameMap { v22: "TCO", v23: "TCON", keyword_type: KeywordType::Genre },
    FrameMap { v22: "TCR", v23: "TCOP", keyword_type: KeywordType::Copyright },
    FrameMap { v22: "TPB", v23: "TPUB", keyword_type: KeywordType::Publisher },
    FrameMap { v22: "TLA", v23: "TLAN", keyword_type: KeywordType::Language },
    FrameMap { v22: "TCM", v23: "TCOM", keyword_type: KeywordType::Creator },
    FrameMap { v22: "TEN", v23: "TENC", keyword_type: KeywordType::Producer },
    FrameMap { v22: "TSS", v23: "TSSE", keyword_type: KeywordType::Software },
    // v2.4 moved the recording date to TDRC; there is no v2.2 form.
    FrameMap { v22: "", v23: "TDRC", keyword_type: KeywordType::Date },
];

fn syncsafe(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 4 || bytes.iter().any(|&b| b & 0x80 != 0) {
        return None;
    }
    Some(
        (u32::from(bytes[0]) << 21)
            | (u32::from(bytes[1]) << 14)
            | (u32::from(bytes[2]) << 7)
            | u32::from(bytes[3]),
    )
}

/// Decode a text frame payload: one encoding byte, then the text.
fn decode_text(payload: &[u8]) -> Option<String> {
    let (&encoding, text) = payload.split_first()?;
    let charset = match encoding {
        0 => "ISO-8859-1",
        1 => "UTF-16",
        2 => "UTF-16BE",
        3 => "UTF-8",
        _ => return None,
    };
    let value = convert_to_utf8(text, charset);
    let value = value.trim_matches('\0').trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Resolve `(nn)` genre references against the ID3v1 table.
fn resolve_genre(value: &str) -> String {
    let inner = value.strip_prefix('(').and_then(|rest| rest.strip_suffix(')'));
    if let Some(index) = inner.and_then(|s| s.parse::<usize>().ok()) {
        if let Some(name) = GENRES.get(index) {
            return (*name).to_string();
        }
    }
    value.to_string()
}

/// Parse an ID3v2 tag of exactly `major` revision into `(type, value)`
/// pairs.  Any structural violation ends the walk with what was collected
/// up to the last fully validated frame.
pub fn parse(data: &[u8], major: u8) -> Vec<(KeywordType, String)> {
    let mut found = Vec::new();
    if data.len() < HEADER_LEN || &data[..3] != b"ID3" || data[3] != major {
        return found;
    }
    let flags = data[5];
    let Some(tag_size) = syncsafe(&data[6..10]) else {
        return found;
    };
    let mut pos = HEADER_LEN;
    let end = data.len().min(HEADER_LEN + tag_size as usize);

    // Skip the extended header when present (v2.3+).
    if flags & 0x40 != 0 && major >= 3 {
        let Some(ext) = data.get(pos..pos + 4) else {
            return found;
        };
        let ext_len = if major == 4 {
            match syncsafe(ext) {
                Some(n) => n as usize,
                None => return found,
            }
        } else {
            u32::from_be_bytes([ext[0], ext[1], ext[2], ext[3]]) as usize + 4
        };
        match pos.checked_add(ext_len) {
            Some(next) if next <= end => pos = next,
            _ => return found,
        }
    }

    let (id_len, header_len) = if major == 2 { (3, 6) } else { (4, 10) };

    while pos + header_len <= end {
        let id = &data[pos..pos + id_len];
        if id[0] == 0 {
            break; // padding
        }
        if !id.iter().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) {
            break;
        }
        let frame_size = match major {
            2 => Some(
                (u32::from(data[pos + 3]) << 16)
                    | (u32::from(data[pos + 4]) << 8)
                    | u32::from(data[pos + 5]),
            ),
            3 => Some(u32::from_be_bytes([
                data[pos + 4],
                data[pos + 5],
                data[pos + 6],
                data[pos + 7],
            ])),
            _ => syncsafe(&data[pos + 4..pos + 8]),
        };
        let Some(frame_size) = frame_size else { break };
        let Some(payload_start) = pos.checked_add(header_len) else { break };
        let Some(frame_end) = payload_start.checked_add(frame_size as usize) else { break };
        if frame_end > end {
            break;
        }
        let payload = &data[payload_start..frame_end];

        let id_str = String::from_utf8_lossy(id);
        let mapped = FRAME_MAP.iter().find(|m| {
            if major == 2 {
                m.v22 == id_str
            } else {
                m.v23 == id_str
            }
        });
        if let Some(map) = mapped {
            if let Some(text) = decode_text(payload) {
                let value = if map.keyword_type == KeywordType::Genre {
                    resolve_genre(&text)
                } else {
                    text
                };
                found.push((map.keyword_type, value));
            }
        } else if id_str == "COM" || id_str == "COMM" {
            // Comment frames: encoding byte, 3-byte language, NUL-terminated
            // short description, then the comment itself.
            if let Some(text) = decode_comment(payload) {
                found.push((KeywordType::Comment, text));
            }
        }

        pos = frame_end;
    }
    found
}

fn decode_comment(payload: &[u8]) -> Option<String> {
    if payload.len() < 5 {
        return None;
    }
    let encoding = payload[0];
    let body = &payload[4..];
    // Skip the short description: NUL-terminated, two bytes wide for UTF-16.
    let text = if encoding == 1 || encoding == 2 {
        let mut i = 0;
        while i + 2 <= body.len() && (body[i] != 0 || body[i + 1] != 0) {
            i += 2;
        }
        body.get(i + 2..)?
    } else {
        let i = body.iter().position(|&b| b == 0)?;
        body.get(i + 1..)?
    };
    let mut framed = Vec::with_capacity(text.len() + 1);
    framed.push(encoding);
    framed.extend_from_slice(text);
    decode_text(&framed)
}
