//! ASF (Windows Media) analyzer.
//!
//! ASF files are a sequence of GUID-tagged objects: 16 bytes of GUID, a
//! 64-bit little-endian object size (which includes the 24-byte object
//! header itself), then the payload.  The metadata of interest lives in the
//! content-description object (five UTF-16 strings with a length table up
//! front) and the file-properties object (play duration).  Object sizes are
//! attacker-controlled 64-bit values and are range-checked before use.

use sift_core::convert::convert_to_utf8;
use sift_core::{Analyzer, KeywordList, KeywordType};

pub struct AsfAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(AsfAnalyzer)
}

// GUIDs in wire order (the first three groups are little-endian).
const HEADER_OBJECT: [u8; 16] = [
    0x30, 0x26, 0xb2, 0x75, 0x8e, 0x66, 0xcf, 0x11,
    0xa6, 0xd9, 0x00, 0xaa, 0x00, 0x62, 0xce, 0x6c,
];
const CONTENT_DESCRIPTION: [u8; 16] = [
    0x33, 0x26, 0xb2, 0x75, 0x8e, 0x66, 0xcf, 0x11,
    0xa6, 0xd9, 0x00, 0xaa, 0x00, 0x62, 0xce, 0x6c,
];
const FILE_PROPERTIES: [u8; 16] = [
    0xa1, 0xdc, 0xab, 0x8c, 0x47, 0xa9, 0xcf, 0x11,
    0x8e, 0xe4, 0x00, 0xc0, 0x0c, 0x20, 0x53, 0x65,
];

const OBJECT_HEADER: usize = 24;
const MAX_OBJECTS: usize = 64;

fn u16le(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u64le(data: &[u8], at: usize) -> Option<u64> {
    data.get(at..at + 8).map(|b| {
        u64::from_le_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]])
    })
}

/// The content-description payload: five u16 lengths (title, author,
/// copyright, description, rating), then the five UTF-16LE strings
/// back-to-back.
fn content_description(payload: &[u8], previous: &mut KeywordList) {
    const FIELDS: [Option<KeywordType>; 5] = [
        Some(KeywordType::Title),
        Some(KeywordType::Author),
        Some(KeywordType::Copyright),
        Some(KeywordType::Description),
        None, // rating: not worth a record
    ];
    if payload.len() < 10 {
        return;
    }
    let mut lengths = [0usize; 5];
    for (i, len) in lengths.iter_mut().enumerate() {
        *len = u16le(payload, i * 2).unwrap_or(0) as usize;
    }
    let mut pos = 10usize;
    for (len, keyword_type) in lengths.into_iter().zip(FIELDS) {
        let Some(end) = pos.checked_add(len) else { return };
        if end > payload.len() {
            return; // the length table lies about the payload
        }
        if let Some(keyword_type) = keyword_type {
            let value = convert_to_utf8(&payload[pos..end], "UTF-16LE");
            let value = value.trim();
            if !value.is_empty() {
                previous.prepend(keyword_type, value);
            }
        }
        pos = end;
    }
}

/// The file-properties payload: play duration in 100 ns units at offset 40.
fn file_properties(payload: &[u8], previous: &mut KeywordList) {
    if let Some(duration) = u64le(payload, 40) {
        let seconds = duration / 10_000_000;
        if seconds > 0 {
            previous.prepend(
                KeywordType::Format,
                format!("{}m{:02}", seconds / 60, seconds % 60),
            );
        }
    }
}

impl Analyzer for AsfAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        // Top-level header object wraps everything we care about.
        if data.len() < OBJECT_HEADER * 2 || data[..16] != HEADER_OBJECT {
            return previous;
        }
        let Some(header_size) = u64le(data, 16) else {
            return previous;
        };
        if header_size < OBJECT_HEADER as u64 * 2 || header_size > data.len() as u64 {
            return previous;
        }
        previous.prepend(KeywordType::Mimetype, "video/asf");

        // Nested objects start after the header object's own header plus
        // the 6-byte object count/reserved block.
        let end = header_size as usize;
        let mut pos = OBJECT_HEADER + 6;
        let mut objects = 0usize;
        while pos + OBJECT_HEADER <= end && objects < MAX_OBJECTS {
            objects += 1;
            let guid: &[u8] = &data[pos..pos + 16];
            let Some(size) = u64le(data, pos + 16) else { break };
            if size < OBJECT_HEADER as u64 {
                break; // sizes include the header; anything smaller is lies
            }
            let Some(object_end) = (pos as u64).checked_add(size) else { break };
            if object_end > end as u64 {
                break;
            }
            let payload = &data[pos + OBJECT_HEADER..object_end as usize];

            if guid == CONTENT_DESCRIPTION.as_slice() {
                content_description(payload, &mut previous);
            } else if guid == FILE_PROPERTIES.as_slice() {
                file_properties(payload, &mut previous);
            }
            pos = object_end as usize;
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utf16le(s: &str) -> Vec<u8> {
        s.encode_utf16().flat_map(|u| u.to_le_bytes()).collect()
    }

    fn object(guid: &[u8; 16], payload: &[u8]) -> Vec<u8> {
        let mut out = guid.to_vec();
        out.extend_from_slice(&((payload.len() + OBJECT_HEADER) as u64).to_le_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn asf_with(objects: &[Vec<u8>]) -> Vec<u8> {
        let body: Vec<u8> = objects.concat();
        let mut data = HEADER_OBJECT.to_vec();
        data.extend_from_slice(
            &((body.len() + OBJECT_HEADER + 6) as u64).to_le_bytes(),
        );
        data.extend_from_slice(&(objects.len() as u32).to_le_bytes());
        data.extend_from_slice(&[0x01, 0x02]); // reserved
        data.extend_from_slice(&body);
        data
    }

    fn content_payload(title: &str, author: &str) -> Vec<u8> {
        let title = utf16le(title);
        let author = utf16le(author);
        let mut payload = Vec::new();
        payload.extend_from_slice(&(title.len() as u16).to_le_bytes());
        payload.extend_from_slice(&(author.len() as u16).to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&0u16.to_le_bytes());
        payload.extend_from_slice(&title);
        payload.extend_from_slice(&author);
        payload
    }

    #[test]
    fn content_description_strings() {
        let data = asf_with(&[object(
            &CONTENT_DESCRIPTION,
            &content_payload("Stream Title", "Someone"),
        )]);
        let list = AsfAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("video/asf"));
        assert_eq!(list.extract_last(KeywordType::Title), Some("Stream Title"));
        assert_eq!(list.extract_last(KeywordType::Author), Some("Someone"));
    }

    #[test]
    fn duration_from_file_properties() {
        let mut payload = vec![0u8; 48];
        let ticks = 185u64 * 10_000_000; // 3m05
        payload[40..48].copy_from_slice(&ticks.to_le_bytes());
        let data = asf_with(&[object(&FILE_PROPERTIES, &payload)]);
        let list = AsfAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.extract_last(KeywordType::Format), Some("3m05"));
    }

    #[test]
    fn lying_length_table_is_rejected() {
        let mut payload = content_payload("T", "A");
        // Title length now reaches past the payload.
        payload[0..2].copy_from_slice(&0x7FFFu16.to_le_bytes());
        let data = asf_with(&[object(&CONTENT_DESCRIPTION, &payload)]);
        let list = AsfAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.extract_last(KeywordType::Title), None);
        // Mimetype is still established by the validated outer header.
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("video/asf"));
    }

    #[test]
    fn undersized_object_stops_the_walk() {
        let mut bad = CONTENT_DESCRIPTION.to_vec();
        bad.extend_from_slice(&3u64.to_le_bytes()); // smaller than its own header
        let data = asf_with(&[bad]);
        let list = AsfAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn non_asf_passes_through() {
        assert!(AsfAnalyzer
            .analyze(None, b"not an asf stream at all, nothing here", KeywordList::new(), None)
            .is_empty());
    }
}
