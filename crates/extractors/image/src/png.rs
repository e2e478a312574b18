//! PNG chunk walker: IHDR dimensions, tEXt/zTXt metadata, tIME.

use std::io::Read;

use sift_core::convert::convert_to_utf8;
use sift_core::{KeywordList, KeywordType};
use tracing::debug;

const SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// A zTXt chunk is tiny on disk; cap what it may inflate to.
const MAX_ZTXT_INFLATE: u64 = 64 * 1024;

/// tEXt/zTXt keywords with a defined meaning, per the PNG specification.
const TEXT_KEY_MAP: &[(&str, KeywordType)] = &[
    ("Title", KeywordType::Title),
    ("Author", KeywordType::Author),
    ("Description", KeywordType::Description),
    ("Copyright", KeywordType::Copyright),
    ("Creation Time", KeywordType::CreationDate),
    ("Software", KeywordType::Software),
    ("Disclaimer", KeywordType::Disclaimer),
    ("Warning", KeywordType::Warning),
    ("Source", KeywordType::Source),
    ("Comment", KeywordType::Comment),
];

fn keyword_type_for(key: &str) -> KeywordType {
    TEXT_KEY_MAP
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, t)| *t)
        .unwrap_or(KeywordType::Unknown)
}

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    if !data.starts_with(SIGNATURE) {
        return previous;
    }
    previous.prepend(KeywordType::Mimetype, "image/png");

    let mut pos = SIGNATURE.len();
    loop {
        // length (4) + type (4); the CRC behind the payload is not verified,
        // but its 4 bytes must exist for the chunk to be structurally whole.
        let Some(header) = data.get(pos..pos + 8) else { break };
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let chunk_type = &header[4..8];
        let Some(payload_start) = pos.checked_add(8) else { break };
        let Some(payload_end) = payload_start.checked_add(length) else { break };
        let Some(chunk_end) = payload_end.checked_add(4) else { break };
        if chunk_end > data.len() {
            break;
        }
        let payload = &data[payload_start..payload_end];

        match chunk_type {
            b"IHDR" => {
                if payload.len() >= 8 {
                    let width = u32::from_be_bytes([payload[0], payload[1], payload[2], payload[3]]);
                    let height =
                        u32::from_be_bytes([payload[4], payload[5], payload[6], payload[7]]);
                    previous.prepend(KeywordType::Size, format!("{width}x{height}"));
                }
            }
            b"tEXt" => {
                if let Some((key, text)) = split_keyword(payload) {
                    push_text(&mut previous, key, text);
                }
            }
            b"zTXt" => {
                if let Some((key, rest)) = split_keyword(payload) {
                    // One method byte (0 = deflate), then the stream.
                    if let Some((&0, compressed)) = rest.split_first() {
                        match inflate_capped(compressed) {
                            Some(text) => push_text(&mut previous, key, &text),
                            None => debug!("undecodable zTXt chunk skipped"),
                        }
                    }
                }
            }
            b"tIME" => {
                if payload.len() == 7 {
                    let year = u16::from_be_bytes([payload[0], payload[1]]);
                    previous.prepend(
                        KeywordType::ModificationDate,
                        format!(
                            "{year:04}-{:02}-{:02} {:02}:{:02}:{:02}",
                            payload[2], payload[3], payload[4], payload[5], payload[6]
                        ),
                    );
                }
            }
            b"IEND" => break,
            _ => {}
        }
        pos = chunk_end;
    }
    previous
}

/// Split a text-chunk payload at the keyword's NUL terminator.
fn split_keyword(payload: &[u8]) -> Option<(&[u8], &[u8])> {
    let nul = payload.iter().position(|&b| b == 0)?;
    // PNG keywords are 1–79 Latin-1 characters.
    if nul == 0 || nul > 79 {
        return None;
    }
    Some((&payload[..nul], &payload[nul + 1..]))
}

fn push_text(list: &mut KeywordList, key: &[u8], text: &[u8]) {
    let key = convert_to_utf8(key, "ISO-8859-1");
    let value = convert_to_utf8(text, "ISO-8859-1");
    if !value.trim().is_empty() {
        list.prepend(keyword_type_for(&key), value.trim());
    }
}

fn inflate_capped(compressed: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    flate2::read::ZlibDecoder::new(compressed)
        .take(MAX_ZTXT_INFLATE)
        .read_to_end(&mut out)
        .ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn chunk(chunk_type: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(chunk_type);
        out.extend_from_slice(payload);
        out.extend_from_slice(&[0, 0, 0, 0]); // CRC, unverified
        out
    }

    fn minimal_png(extra_chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&640u32.to_be_bytes());
        ihdr.extend_from_slice(&480u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
        let mut data = SIGNATURE.to_vec();
        data.extend_from_slice(&chunk(b"IHDR", &ihdr));
        for c in extra_chunks {
            data.extend_from_slice(c);
        }
        data.extend_from_slice(&chunk(b"IEND", b""));
        data
    }

    #[test]
    fn dimensions_and_mimetype() {
        let list = analyze(&minimal_png(&[]), KeywordList::new());
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("image/png"));
        assert_eq!(list.extract_last(KeywordType::Size), Some("640x480"));
    }

    #[test]
    fn text_chunks_map_to_types() {
        let png = minimal_png(&[
            chunk(b"tEXt", b"Title\0A Picture"),
            chunk(b"tEXt", b"Software\0sift test"),
            chunk(b"tEXt", b"UserKey\0misc"),
        ]);
        let list = analyze(&png, KeywordList::new());
        assert_eq!(list.extract_last(KeywordType::Title), Some("A Picture"));
        assert_eq!(list.extract_last(KeywordType::Software), Some("sift test"));
        assert_eq!(list.extract_last(KeywordType::Unknown), Some("misc"));
    }

    #[test]
    fn ztxt_is_inflated() {
        let mut enc =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(b"compressed comment").unwrap();
        let compressed = enc.finish().unwrap();
        let mut payload = b"Comment\0\0".to_vec();
        payload.extend_from_slice(&compressed);
        let png = minimal_png(&[chunk(b"zTXt", &payload)]);
        let list = analyze(&png, KeywordList::new());
        assert_eq!(
            list.extract_last(KeywordType::Comment),
            Some("compressed comment")
        );
    }

    #[test]
    fn time_chunk_formats() {
        let payload = [0x07u8, 0xD6, 8, 6, 12, 30, 5];
        let png = minimal_png(&[chunk(b"tIME", &payload)]);
        let list = analyze(&png, KeywordList::new());
        assert_eq!(
            list.extract_last(KeywordType::ModificationDate),
            Some("2006-08-06 12:30:05")
        );
    }

    #[test]
    fn oversized_chunk_length_stops_the_walk() {
        let mut png = SIGNATURE.to_vec();
        png.extend_from_slice(&0xFFFF_FFF0u32.to_be_bytes());
        png.extend_from_slice(b"IHDR");
        png.extend_from_slice(&[0u8; 16]);
        let list = analyze(&png, KeywordList::new());
        // Mimetype was established from the signature; nothing else.
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn non_png_is_untouched() {
        let list = analyze(b"\x89PNX not a png", KeywordList::new());
        assert!(list.is_empty());
    }
}
