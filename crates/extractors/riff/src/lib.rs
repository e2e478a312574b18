//! RIFF container analyzer: WAV stream parameters and AVI headers.
//!
//! RIFF is a chunk soup — fourcc, little-endian size, payload, 2-byte
//! alignment — with the actual format named by the form type at offset 8.
//! Only `WAVE` and `AVI ` forms are handled; everything else (WebP, CDR,
//! …) passes through untouched.

use sift_core::{Analyzer, KeywordList, KeywordType};

pub struct RiffAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(RiffAnalyzer)
}

fn u16le(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32le(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

/// Nested LIST chunks deeper than this are not a real AVI, they are an
/// attack on the stack.
const MAX_LIST_DEPTH: usize = 8;

/// Iterate top-level chunks (and LIST bodies transparently), calling `f`
/// with each fourcc and payload until it returns false.
fn walk_chunks(data: &[u8], mut pos: usize, depth: usize, f: &mut impl FnMut(&[u8; 4], &[u8]) -> bool) {
    if depth > MAX_LIST_DEPTH {
        return;
    }
    while pos + 8 <= data.len() {
        let fourcc = [data[pos], data[pos + 1], data[pos + 2], data[pos + 3]];
        let Some(size) = u32le(data, pos + 4) else { return };
        let Some(payload_end) = pos.checked_add(8).and_then(|s| s.checked_add(size as usize))
        else {
            return;
        };
        if payload_end > data.len() {
            return;
        }
        if &fourcc == b"LIST" {
            // Descend into the list body, past its 4-byte type tag.
            if size >= 4 {
                walk_chunks(&data[..payload_end], pos + 12, depth + 1, f);
            }
        } else if !f(&fourcc, &data[pos + 8..payload_end]) {
            return;
        }
        // Chunks are word-aligned.
        pos = payload_end + (size as usize & 1);
    }
}

fn analyze_wave(data: &[u8], mut previous: KeywordList) -> KeywordList {
    previous.prepend(KeywordType::Mimetype, "audio/x-wav");
    let mut format = None;
    walk_chunks(data, 12, 0, &mut |fourcc, payload| {
        if fourcc == b"fmt " && payload.len() >= 16 {
            let channels = u16le(payload, 2).unwrap_or(0);
            let sample_rate = u32le(payload, 4).unwrap_or(0);
            let bits = u16le(payload, 14).unwrap_or(0);
            format = Some(format!(
                "{} Hz, {} bit, {}",
                sample_rate,
                bits,
                if channels == 1 { "mono" } else { "stereo" },
            ));
            return false;
        }
        true
    });
    if let Some(format) = format {
        previous.prepend(KeywordType::Format, format);
    }
    previous
}

fn analyze_avi(data: &[u8], mut previous: KeywordList) -> KeywordList {
    previous.prepend(KeywordType::Mimetype, "video/x-msvideo");
    let mut summary = None;
    walk_chunks(data, 12, 0, &mut |fourcc, payload| {
        // The main AVI header: frame timing at 0, frame count at 16,
        // dimensions at 32/36.
        if fourcc == b"avih" && payload.len() >= 40 {
            let micros_per_frame = u32le(payload, 0).unwrap_or(0);
            let frames = u32le(payload, 16).unwrap_or(0);
            let width = u32le(payload, 32).unwrap_or(0);
            let height = u32le(payload, 36).unwrap_or(0);
            let fps = if micros_per_frame > 0 {
                1_000_000 / micros_per_frame
            } else {
                0
            };
            summary = Some((format!("{width}x{height}"), format!("{fps} fps, {frames} frames")));
            return false;
        }
        true
    });
    if let Some((size, format)) = summary {
        previous.prepend(KeywordType::Size, size);
        previous.prepend(KeywordType::Format, format);
    }
    previous
}

impl Analyzer for RiffAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if data.len() < 12 || &data[..4] != b"RIFF" {
            return previous;
        }
        match &data[8..12] {
            b"WAVE" => analyze_wave(data, previous),
            b"AVI " => analyze_avi(data, previous),
            _ => previous,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(fourcc);
        out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        out.extend_from_slice(payload);
        if payload.len() & 1 == 1 {
            out.push(0);
        }
        out
    }

    fn riff(form: &[u8; 4], body: &[u8]) -> Vec<u8> {
        let mut out = b"RIFF".to_vec();
        out.extend_from_slice(&((body.len() + 4) as u32).to_le_bytes());
        out.extend_from_slice(form);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn wav_fmt_chunk() {
        let mut fmt = Vec::new();
        fmt.extend_from_slice(&1u16.to_le_bytes()); // PCM
        fmt.extend_from_slice(&2u16.to_le_bytes()); // stereo
        fmt.extend_from_slice(&44100u32.to_le_bytes());
        fmt.extend_from_slice(&176400u32.to_le_bytes());
        fmt.extend_from_slice(&4u16.to_le_bytes());
        fmt.extend_from_slice(&16u16.to_le_bytes());
        let data = riff(b"WAVE", &chunk(b"fmt ", &fmt));
        let list = RiffAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("audio/x-wav"));
        assert_eq!(
            list.extract_last(KeywordType::Format),
            Some("44100 Hz, 16 bit, stereo")
        );
    }

    #[test]
    fn avi_header_inside_list() {
        let mut avih = vec![0u8; 40];
        avih[0..4].copy_from_slice(&33333u32.to_le_bytes()); // ~30 fps
        avih[16..20].copy_from_slice(&900u32.to_le_bytes());
        avih[32..36].copy_from_slice(&640u32.to_le_bytes());
        avih[36..40].copy_from_slice(&480u32.to_le_bytes());
        let mut hdrl = b"hdrl".to_vec();
        hdrl.extend_from_slice(&chunk(b"avih", &avih));
        let data = riff(b"AVI ", &chunk(b"LIST", &hdrl));
        let list = RiffAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("video/x-msvideo"));
        assert_eq!(list.extract_last(KeywordType::Size), Some("640x480"));
        assert_eq!(list.extract_last(KeywordType::Format), Some("30 fps, 900 frames"));
    }

    #[test]
    fn oversized_chunk_is_rejected() {
        let mut data = riff(b"WAVE", &[]);
        data.extend_from_slice(b"fmt ");
        data.extend_from_slice(&0xFFFF_FFF0u32.to_le_bytes());
        let list = RiffAnalyzer.analyze(None, &data, KeywordList::new(), None);
        // Mimetype from the form type, nothing else.
        assert_eq!(list.count(), 1);
    }

    #[test]
    fn foreign_forms_pass_through() {
        let data = riff(b"WEBP", b"VP8 ");
        let list = RiffAnalyzer.analyze(None, &data, KeywordList::new(), None);
        assert!(list.is_empty());
    }

    #[test]
    fn short_buffers_pass_through() {
        assert!(RiffAnalyzer
            .analyze(None, b"RIFF\x04\x00", KeywordList::new(), None)
            .is_empty());
    }
}
