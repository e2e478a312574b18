//! GIF block walker: screen descriptor dimensions and comment extensions.

use sift_core::convert::convert_to_utf8;
use sift_core::{KeywordList, KeywordType};

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    if !(data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a")) || data.len() < 13 {
        return previous;
    }
    previous.prepend(KeywordType::Mimetype, "image/gif");

    let width = u16::from_le_bytes([data[6], data[7]]);
    let height = u16::from_le_bytes([data[8], data[9]]);
    previous.prepend(KeywordType::Size, format!("{width}x{height}"));

    // Skip the global color table when the flag announces one.
    let flags = data[10];
    let mut pos = 13usize;
    if flags & 0x80 != 0 {
        let entries = 2usize << (flags & 0x07);
        let Some(next) = pos.checked_add(3 * entries) else {
            return previous;
        };
        pos = next;
    }

    // Block loop: images, extensions, trailer.
    while pos < data.len() {
        match data[pos] {
            0x3B => break, // trailer
            0x2C => {
                // Image descriptor: 10 bytes, optional local color table,
                // one LZW code-size byte, then data sub-blocks.
                if pos + 10 > data.len() {
                    break;
                }
                let local_flags = data[pos + 9];
                pos += 10;
                if local_flags & 0x80 != 0 {
                    let entries = 2usize << (local_flags & 0x07);
                    match pos.checked_add(3 * entries) {
                        Some(next) if next <= data.len() => pos = next,
                        _ => break,
                    }
                }
                if pos >= data.len() {
                    break;
                }
                pos += 1; // LZW minimum code size
                let Some(next) = skip_sub_blocks(data, pos) else { break };
                pos = next;
            }
            0x21 => {
                // Extension: label byte, then sub-blocks.
                if pos + 2 > data.len() {
                    break;
                }
                let label = data[pos + 1];
                pos += 2;
                if label == 0xFE {
                    let Some((comment, next)) = read_sub_blocks(data, pos) else { break };
                    let text = convert_to_utf8(&comment, "ISO-8859-1");
                    if !text.trim().is_empty() {
                        previous.prepend(KeywordType::Comment, text.trim());
                    }
                    pos = next;
                } else {
                    let Some(next) = skip_sub_blocks(data, pos) else { break };
                    pos = next;
                }
            }
            _ => break, // unknown block type: structure lost, stop
        }
    }
    previous
}

/// Walk `len`-prefixed sub-blocks to their zero terminator, collecting
/// nothing.  Returns the position past the terminator.
fn skip_sub_blocks(data: &[u8], mut pos: usize) -> Option<usize> {
    loop {
        let len = *data.get(pos)? as usize;
        pos = pos.checked_add(1 + len)?;
        if len == 0 {
            return Some(pos);
        }
        if pos > data.len() {
            return None;
        }
    }
}

/// Like [`skip_sub_blocks`], but collects the block contents (capped: a
/// comment longer than 4 KiB is truncated, not trusted).
fn read_sub_blocks(data: &[u8], mut pos: usize) -> Option<(Vec<u8>, usize)> {
    const CAP: usize = 4096;
    let mut out = Vec::new();
    loop {
        let len = *data.get(pos)? as usize;
        if len == 0 {
            return Some((out, pos + 1));
        }
        let start = pos.checked_add(1)?;
        let end = start.checked_add(len)?;
        if end > data.len() {
            return None;
        }
        if out.len() < CAP {
            out.extend_from_slice(&data[start..end.min(start + (CAP - out.len()))]);
        }
        pos = end;
    }
}
