//! Magic-byte mimetype sniffer.
//!
//! Runs early in the default chain so that later analyzers can gate their
//! (expensive) parsing on the detected type.  Matching is a pure pattern
//! walk over a fixed table; a handful of container formats need a second
//! look past the outer magic (RIFF carries WAVE and AVI payloads, an `ar`
//! archive may really be a Debian package).  When the table misses, the
//! `infer` database gets the final word.

use sift_core::{Analyzer, KeywordList, KeywordType};

pub struct MimeAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(MimeAnalyzer)
}

/// `(offset, pattern, mimetype)` — checked in order, first hit wins.
const MAGIC_TABLE: &[(usize, &[u8], &str)] = &[
    (0, b"\x89PNG\r\n\x1a\n", "image/png"),
    (0, b"GIF87a", "image/gif"),
    (0, b"GIF89a", "image/gif"),
    (0, b"\xFF\xD8\xFF", "image/jpeg"),
    (0, b"II*\x00", "image/tiff"),
    (0, b"MM\x00*", "image/tiff"),
    (0, b"%PDF-", "application/pdf"),
    (0, b"%!", "application/postscript"),
    (0, b"PK\x03\x04", "application/zip"),
    (0, b"\x1f\x8b", "application/x-gzip"),
    (0, b"BZh", "application/bz2"),
    (0, b"\x7fELF", "application/x-executable"),
    (0, b"\xed\xab\xee\xdb", "application/x-rpm"),
    (0, b"OggS", "application/ogg"),
    (0, b"MThd", "audio/midi"),
    (0, b".RMF", "video/real"),
    (0, b".ra\xfd", "audio/real"),
    (
        0,
        b"\x30\x26\xb2\x75\x8e\x66\xcf\x11\xa6\xd9\x00\xaa\x00\x62\xce\x6c",
        "video/asf",
    ),
    (0, b"\xd0\xcf\x11\xe0\xa1\xb1\x1a\xe1", "application/vnd.ms-office"),
    (0, b"ID3", "audio/mpeg"),
    (257, b"ustar", "application/x-tar"),
];

fn match_at(data: &[u8], offset: usize, pattern: &[u8]) -> bool {
    offset
        .checked_add(pattern.len())
        .is_some_and(|end| end <= data.len() && &data[offset..end] == pattern)
}

/// Sniff `data` against the table, `None` when nothing matches.
pub fn sniff(data: &[u8]) -> Option<&'static str> {
    // RIFF before the generic table: the outer magic alone says nothing.
    if match_at(data, 0, b"RIFF") {
        if match_at(data, 8, b"WAVE") {
            return Some("audio/x-wav");
        }
        if match_at(data, 8, b"AVI ") {
            return Some("video/x-msvideo");
        }
        return None;
    }
    // An ar archive holding a `debian-binary` member first is a .deb.
    if match_at(data, 0, b"!<arch>\n") {
        return if match_at(data, 8, b"debian-binary") {
            Some("application/x-debian-package")
        } else {
            Some("application/x-archive")
        };
    }

    for &(offset, pattern, mime) in MAGIC_TABLE {
        if match_at(data, offset, pattern) {
            return Some(mime);
        }
    }

    // Bare MPEG audio: frame sync without an ID3 prefix.
    if data.len() >= 2 && data[0] == 0xFF && data[1] & 0xE0 == 0xE0 {
        return Some("audio/mpeg");
    }
    None
}

impl Analyzer for MimeAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if previous.extract_last(KeywordType::Mimetype).is_some() {
            // An earlier analyzer already pinned the type down.
            return previous;
        }
        if let Some(mime) = sniff(data) {
            previous.prepend(KeywordType::Mimetype, mime);
            return previous;
        }
        if let Some(kind) = infer::get(data) {
            previous.prepend(KeywordType::Mimetype, kind.mime_type());
        }
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(data: &[u8]) -> KeywordList {
        MimeAnalyzer.analyze(None, data, KeywordList::new(), None)
    }

    #[test]
    fn table_hits() {
        assert_eq!(sniff(b"\x89PNG\r\n\x1a\n....."), Some("image/png"));
        assert_eq!(sniff(b"%PDF-1.4"), Some("application/pdf"));
        assert_eq!(sniff(b"\x7fELF\x01\x01"), Some("application/x-executable"));
        assert_eq!(sniff(b"ID3\x03\x00"), Some("audio/mpeg"));
    }

    #[test]
    fn riff_needs_the_inner_tag() {
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WAVEfmt "), Some("audio/x-wav"));
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00AVI LIST"), Some("video/x-msvideo"));
        assert_eq!(sniff(b"RIFF\x10\x00\x00\x00WEBP"), None);
        // Truncated before the inner tag: no match, no panic.
        assert_eq!(sniff(b"RIFF\x10\x00"), None);
    }

    #[test]
    fn ar_vs_deb() {
        assert_eq!(sniff(b"!<arch>\ndebian-binary   123"), Some("application/x-debian-package"));
        assert_eq!(sniff(b"!<arch>\nfoo.o/       "), Some("application/x-archive"));
    }

    #[test]
    fn tar_magic_sits_at_offset_257() {
        let mut buf = vec![0u8; 512];
        buf[257..262].copy_from_slice(b"ustar");
        assert_eq!(sniff(&buf), Some("application/x-tar"));
        assert_eq!(sniff(&buf[..200]), None);
    }

    #[test]
    fn existing_mimetype_wins() {
        let mut previous = KeywordList::new();
        previous.prepend(KeywordType::Mimetype, "text/html");
        let result = MimeAnalyzer.analyze(None, b"%PDF-1.4", previous, None);
        assert_eq!(result.count(), 1);
        assert_eq!(result.extract_last(KeywordType::Mimetype), Some("text/html"));
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(run(b"").is_empty());
        assert!(run(b"plain text, nothing to see").is_empty());
    }

    #[test]
    fn detected_type_is_prepended() {
        let result = run(b"GIF89a\x01\x00\x01\x00");
        assert_eq!(result.extract_last(KeywordType::Mimetype), Some("image/gif"));
    }
}
