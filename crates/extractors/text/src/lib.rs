//! The trivial analyzers: filename, split, lowercase, and the generic
//! printable-strings extractor.
//!
//! The first three don't parse the buffer at all — they derive records from
//! the filename or rewrite records produced by earlier chain entries.  None
//! of them belong in the default chain; callers append them explicitly when
//! they want keyword-style post-processing.

use sift_core::{Analyzer, KeywordList, KeywordType};

/// Mimetypes the printable-strings extractor refuses to chew on: structured
/// binary formats where a strings scan produces only noise.
const PRINTABLE_BLACKLIST: &[&str] = &[
    "image/jpeg",
    "image/gif",
    "image/png",
    "image/tiff",
    "application/zip",
    "application/x-gzip",
    "application/bz2",
    "application/x-rpm",
    "application/x-tar",
    "application/x-debian-package",
    "application/x-archive",
    "application/ogg",
    "audio/mpeg",
    "audio/x-wav",
    "audio/real",
    "video/x-msvideo",
    "video/asf",
    "video/real",
];

// ── filename ─────────────────────────────────────────────────────────────────

/// Emits the basename of the input path as a `Filename` record.
pub struct FilenameAnalyzer;

pub fn filename() -> Box<dyn Analyzer> {
    Box::new(FilenameAnalyzer)
}

impl Analyzer for FilenameAnalyzer {
    fn analyze(
        &self,
        filename: Option<&str>,
        _data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if let Some(name) = filename {
            let base = name.rsplit('/').next().unwrap_or(name);
            if !base.is_empty() {
                previous.prepend(KeywordType::Filename, base);
            }
        }
        previous
    }
}

// ── split ────────────────────────────────────────────────────────────────────

/// Tokenizes every existing record's value on non-alphanumeric separators
/// and prepends each distinct token as an `Unknown`-typed keyword.  The
/// originals stay in the list.
pub struct SplitAnalyzer;

pub fn split() -> Box<dyn Analyzer> {
    Box::new(SplitAnalyzer)
}

impl Analyzer for SplitAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        _data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        let mut tokens: Vec<String> = Vec::new();
        for record in previous.iter() {
            if record.keyword_type.is_binary() {
                continue;
            }
            for token in record
                .value
                .split(|c: char| !c.is_alphanumeric())
                .filter(|t| t.len() >= 2 && *t != record.value)
            {
                if !tokens.iter().any(|t| t == token) {
                    tokens.push(token.to_string());
                }
            }
        }
        for token in tokens {
            previous.prepend(KeywordType::Unknown, token);
        }
        previous
    }
}

// ── lowercase ────────────────────────────────────────────────────────────────

/// Prepends a lowercased duplicate (same type) of every record whose value
/// isn't already lowercase.
pub struct LowercaseAnalyzer;

pub fn lowercase() -> Box<dyn Analyzer> {
    Box::new(LowercaseAnalyzer)
}

impl Analyzer for LowercaseAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        _data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        let lowered: Vec<(KeywordType, String)> = previous
            .iter()
            .filter(|r| !r.keyword_type.is_binary())
            .filter_map(|r| {
                let lower = r.value.to_lowercase();
                (lower != r.value).then_some((r.keyword_type, lower))
            })
            .collect();
        for (keyword_type, value) in lowered {
            previous.prepend(keyword_type, value);
        }
        previous
    }
}

// ── printable ────────────────────────────────────────────────────────────────

/// How much of the buffer the strings scan looks at.
const PRINTABLE_SCAN_LIMIT: usize = 32 * 1024;
/// Upper bound on emitted words, so hostile input cannot balloon the list.
const PRINTABLE_MAX_WORDS: usize = 64;
const PRINTABLE_MAX_WORD_LEN: usize = 40;

/// Generic printable-strings extractor, strings(1)-style.
///
/// Scans the head of the buffer for runs of printable ASCII and emits the
/// distinct words as `Unknown` keywords.  The minimum word length comes
/// from the options string (default 4); buffers that sniff as text get the
/// friendlier minimum of 2 since they are words already.
pub struct PrintableAnalyzer;

pub fn printable() -> Box<dyn Analyzer> {
    Box::new(PrintableAnalyzer)
}

impl Analyzer for PrintableAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        options: Option<&str>,
    ) -> KeywordList {
        if let Some(mime) = previous.extract_last(KeywordType::Mimetype) {
            if PRINTABLE_BLACKLIST.contains(&mime) {
                return previous;
            }
        }
        if data.is_empty() {
            return previous;
        }

        let head = &data[..data.len().min(PRINTABLE_SCAN_LIMIT)];
        let is_text = content_inspector::inspect(head).is_text();
        let min_len = options
            .and_then(|o| o.trim().parse::<usize>().ok())
            .unwrap_or(if is_text { 2 } else { 4 });

        let mut words: Vec<String> = Vec::new();
        for run in head.split(|&b| !(b.is_ascii_alphanumeric() || b == b'_' || b == b'-')) {
            if run.len() < min_len || run.len() > PRINTABLE_MAX_WORD_LEN {
                continue;
            }
            // Pure digit runs are offsets and sizes, not words.
            if run.iter().all(u8::is_ascii_digit) {
                continue;
            }
            let word = String::from_utf8_lossy(run).into_owned();
            if !words.iter().any(|w| w == &word) {
                words.push(word);
                if words.len() >= PRINTABLE_MAX_WORDS {
                    break;
                }
            }
        }
        for word in words {
            previous.prepend(KeywordType::Unknown, word);
        }
        previous
    }
}
