//! ZIP central-directory walker.
//!
//! Self-extracting executables put arbitrary stub code before the archive,
//! so the walk starts from the end: find the end-of-central-directory
//! record within its 64 KiB comment window, then jump to the central
//! directory it points at.  Local file headers are never trusted.

use sift_core::convert::convert_to_utf8;
use sift_core::{KeywordList, KeywordType};
use tracing::debug;

const EOCD_LEN: usize = 22;
const CDH_LEN: usize = 46;
/// EOCD comment length field is 16-bit, so the record sits within the last
/// 64 KiB + 22 bytes of the file.
const EOCD_WINDOW: usize = 65536 + 20;

fn u16le(data: &[u8], at: usize) -> Option<u16> {
    data.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
}

fn u32le(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    if let Some(mime) = previous.extract_last(KeywordType::Mimetype) {
        if mime != "application/zip" && mime != "application/x-zip" {
            return previous;
        }
    }
    // Smaller than any real archive, or no local-header magic up front.
    if data.len() < 100 || !data.starts_with(b"PK\x03\x04") {
        return previous;
    }

    // Backward scan for the end-of-central-directory signature.
    let stop = data.len().saturating_sub(EOCD_WINDOW);
    let mut eocd = None;
    let mut offset = data.len() - EOCD_LEN;
    loop {
        if data[offset..].starts_with(b"PK\x05\x06") {
            eocd = Some(offset);
            break;
        }
        if offset == stop {
            break;
        }
        offset -= 1;
    }
    let Some(eocd) = eocd else {
        debug!("zip: end-of-central-directory record not found");
        return previous;
    };

    let Some(comment_len) = u16le(data, eocd + 20) else {
        return previous;
    };
    let comment_len = comment_len as usize;
    let Some(comment_end) = eocd.checked_add(EOCD_LEN).and_then(|e| e.checked_add(comment_len))
    else {
        return previous;
    };
    if comment_end > data.len() {
        return previous; // comment length lies about the file size
    }

    let Some(cd_offset) = u32le(data, eocd + 16) else {
        return previous;
    };
    let mut pos = cd_offset as usize;
    if pos.checked_add(CDH_LEN).map_or(true, |end| end > data.len()) {
        return previous;
    }
    if !data[pos..].starts_with(b"PK\x01\x02") {
        debug!("zip: central directory offset does not point at a header");
        return previous;
    }

    previous.prepend(KeywordType::Mimetype, "application/zip");
    if comment_len > 0 {
        let comment = convert_to_utf8(&data[eocd + EOCD_LEN..comment_end], "ISO-8859-1");
        if !comment.trim().is_empty() {
            previous.prepend(KeywordType::Comment, comment.trim());
        }
    }

    let entry_total = u16le(data, eocd + 10).unwrap_or(0) as usize;
    let mut entries = 0usize;

    while data.get(pos..pos + 4).is_some_and(|sig| sig == b"PK\x01\x02") {
        let (Some(name_len), Some(extra_len), Some(entry_comment_len)) = (
            u16le(data, pos + 28),
            u16le(data, pos + 30),
            u16le(data, pos + 32),
        ) else {
            break;
        };
        let name_len = name_len as usize;
        let variable = name_len + extra_len as usize + entry_comment_len as usize;
        let Some(entry_end) = pos.checked_add(CDH_LEN).and_then(|e| e.checked_add(variable))
        else {
            break;
        };
        if entry_end > data.len() {
            break; // entry extends past the buffer: stop at what we have
        }

        let name = convert_to_utf8(&data[pos + CDH_LEN..pos + CDH_LEN + name_len], "ISO-8859-1");
        if !name.is_empty() {
            previous.prepend(KeywordType::Filename, name);
        }
        if entry_comment_len > 0 {
            let comment_start = pos + CDH_LEN + name_len + extra_len as usize;
            let comment = convert_to_utf8(&data[comment_start..entry_end], "ISO-8859-1");
            if !comment.trim().is_empty() {
                previous.prepend(KeywordType::Comment, comment.trim());
            }
        }

        entries += 1;
        pos = entry_end;
    }

    if entries != entry_total {
        debug!("zip: walked {entries} central-directory entries, record claims {entry_total}");
    }
    previous
}
