//! JPEG marker-segment walker: dimensions, comments, EXIF hand-off.

use sift_core::convert::convert_to_utf8;
use sift_core::{KeywordList, KeywordType};

use crate::exif;

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return previous;
    }
    previous.prepend(KeywordType::Mimetype, "image/jpeg");

    let mut pos = 2usize;
    loop {
        // Seek the next marker; fill bytes (0xFF) may repeat.
        let Some(&byte) = data.get(pos) else { break };
        if byte != 0xFF {
            break; // lost sync
        }
        while data.get(pos) == Some(&0xFF) {
            pos += 1;
        }
        let Some(&marker) = data.get(pos) else { break };
        pos += 1;

        match marker {
            0xD8 | 0x01 | 0xD0..=0xD7 => continue, // standalone markers
            0xD9 | 0xDA => break, // EOI, or SOS: entropy-coded data follows
            _ => {}
        }

        // Everything else carries a big-endian length that includes itself.
        let Some(len_bytes) = data.get(pos..pos + 2) else { break };
        let seg_len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
        if seg_len < 2 {
            break;
        }
        let Some(seg_end) = pos.checked_add(seg_len) else { break };
        if seg_end > data.len() {
            break;
        }
        let payload = &data[pos + 2..seg_end];

        match marker {
            // SOF segments (baseline through progressive) carry dimensions.
            0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF => {
                if payload.len() >= 5 {
                    let height = u16::from_be_bytes([payload[1], payload[2]]);
                    let width = u16::from_be_bytes([payload[3], payload[4]]);
                    previous.prepend(KeywordType::Size, format!("{width}x{height}"));
                }
            }
            0xFE => {
                let comment = convert_to_utf8(payload, "ISO-8859-1");
                if !comment.trim().is_empty() {
                    previous.prepend(KeywordType::Comment, comment.trim());
                }
            }
            0xE1 => {
                if let Some(tiff) = payload.strip_prefix(b"Exif\0\0") {
                    previous = exif::analyze(tiff, previous);
                }
            }
            _ => {}
        }
        pos = seg_end;
    }
    previous
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, marker];
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }

    fn jpeg_with(segments: &[Vec<u8>]) -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        for s in segments {
            data.extend_from_slice(s);
        }
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn sof_dimensions() {
        let sof = segment(0xC0, &[8, 0x01, 0xE0, 0x02, 0x80, 3]); // 480 high, 640 wide
        let list = analyze(&jpeg_with(&[sof]), KeywordList::new());
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("image/jpeg"));
        assert_eq!(list.extract_last(KeywordType::Size), Some("640x480"));
    }

    #[test]
    fn comment_segment() {
        let com = segment(0xFE, b"shot on film");
        let list = analyze(&jpeg_with(&[com]), KeywordList::new());
        assert_eq!(list.extract_last(KeywordType::Comment), Some("shot on film"));
    }

    #[test]
    fn truncated_segment_stops_cleanly() {
        let mut data = vec![0xFF, 0xD8, 0xFF, 0xFE, 0x40, 0x00, b'x'];
        data.push(b'y');
        let list = analyze(&data, KeywordList::new());
        assert_eq!(list.count(), 1); // only the mimetype
    }

    #[test]
    fn sos_ends_the_walk() {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDA]);
        data.extend_from_slice(b"entropy coded bytes \xFF\xFE do not parse");
        let list = analyze(&data, KeywordList::new());
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn non_jpeg_is_untouched() {
        assert!(analyze(b"\x89PNG", KeywordList::new()).is_empty());
        assert!(analyze(&[0xFF], KeywordList::new()).is_empty());
    }
}
