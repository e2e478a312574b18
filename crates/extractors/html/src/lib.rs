//! HTML head-metadata analyzer.
//!
//! Scans the first 32 KiB of the buffer for `<title>` and `<meta>` tags and
//! maps the well-known `name=`/`content=` pairs (including the Dublin Core
//! `dc.*` family) onto keyword records.  The scan is a byte-level state
//! machine over untrusted input: no allocation is proportional to claimed
//! lengths, and any malformed structure simply ends the scan with whatever
//! was collected so far.
//!
//! Values are converted with the charset announced by an `http-equiv`
//! content-type meta tag when present, defaulting to ISO-8859-1.

use sift_core::convert::convert_to_utf8;
use sift_core::{Analyzer, KeywordList, KeywordType};

/// Only the head of the document is interesting.
const SCAN_LIMIT: usize = 32 * 1024;

/// Mimetypes there is no point probing for HTML metadata.
const BLACKLIST: &[&str] = &[
    "image/jpeg",
    "image/gif",
    "image/png",
    "image/tiff",
    "application/java",
    "application/pdf",
    "application/postscript",
    "application/x-gzip",
    "application/bz2",
    "application/x-rpm",
    "application/zip",
    "application/x-tar",
    "application/x-debian-package",
    "application/x-archive",
    "application/x-executable",
    "application/ogg",
    "application/vnd.ms-office",
    "audio/real",
    "audio/x-wav",
    "audio/midi",
    "audio/mpeg",
    "video/real",
    "video/asf",
    "video/x-msvideo",
];

/// `<meta name="…">` values worth keeping, and the record type each maps to.
const TAG_MAP: &[(&str, KeywordType)] = &[
    ("author", KeywordType::Author),
    ("title", KeywordType::Title),
    ("description", KeywordType::Description),
    ("language", KeywordType::Language),
    ("rights", KeywordType::Copyright),
    ("publisher", KeywordType::Publisher),
    ("formatter", KeywordType::Software),
    ("copyright", KeywordType::Copyright),
    ("abstract", KeywordType::Summary),
    ("subject", KeywordType::Subject),
    ("date", KeywordType::Date),
    ("keywords", KeywordType::Keywords),
    ("dc.author", KeywordType::Author),
    ("dc.title", KeywordType::Title),
    ("dc.description", KeywordType::Description),
    ("dc.subject", KeywordType::Subject),
    ("dc.creator", KeywordType::Creator),
    ("dc.publisher", KeywordType::Publisher),
    ("dc.date", KeywordType::Date),
    ("dc.format", KeywordType::Format),
    ("dc.identifier", KeywordType::ResourceIdentifier),
    ("dc.rights", KeywordType::Copyright),
];

pub struct HtmlAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(HtmlAnalyzer)
}

/// One collected tag: its lowercased name, the raw attribute region, and
/// the text up to the next tag (only meaningful for `<title>`).
struct Tag<'a> {
    name: String,
    attrs: &'a [u8],
    text: &'a [u8],
}

fn scan_tags(data: &[u8]) -> Vec<Tag<'_>> {
    let limit = data.len().min(SCAN_LIMIT);
    let mut tags = Vec::new();
    let mut pos = 0;

    while pos < limit {
        // Next tag opener.
        let Some(open) = find_byte(data, pos, b'<') else { break };
        let name_start = open + 1;
        let mut p = name_start;
        while p < data.len() && data[p].is_ascii_alphabetic() {
            p += 1;
        }
        if p == name_start {
            pos = name_start;
            continue;
        }
        let name = String::from_utf8_lossy(&data[name_start..p]).to_lowercase();

        // Attribute region up to the closing '>', skipping quoted spans so a
        // '>' inside an attribute value doesn't end the tag early.
        let attr_start = p;
        while p < data.len() && data[p] != b'>' {
            if data[p] == b'"' || data[p] == b'\'' {
                let quote = data[p];
                p += 1;
                while p < data.len() && data[p] != quote {
                    p += 1;
                }
            }
            if p < data.len() {
                p += 1;
            }
        }
        if p >= data.len() {
            break;
        }
        let attrs = &data[attr_start..p];
        p += 1;

        // Text run up to the next tag.
        let text_start = p;
        let text_end = find_byte(data, p, b'<').unwrap_or(data.len());
        let text = &data[text_start..text_end];
        pos = text_end;

        if name == "body" {
            // Metadata lives in the head; no point scanning further.
            break;
        }
        if name == "title" || name == "meta" {
            tags.push(Tag { name, attrs, text });
        }
    }
    tags
}

fn find_byte(data: &[u8], from: usize, needle: u8) -> Option<usize> {
    data.get(from..)
        .and_then(|rest| rest.iter().position(|&b| b == needle))
        .map(|i| from + i)
}

/// Pull `key="value"` out of a tag's attribute region.  Accepts single,
/// double, or no quotes; the key match is case-insensitive.
fn find_attr<'a>(attrs: &'a [u8], key: &str) -> Option<&'a [u8]> {
    let mut p = 0;
    while p < attrs.len() {
        while p < attrs.len() && !attrs[p].is_ascii_alphabetic() {
            p += 1;
        }
        let key_start = p;
        while p < attrs.len() && (attrs[p].is_ascii_alphanumeric() || attrs[p] == b'.' || attrs[p] == b'-') {
            p += 1;
        }
        let this_key = &attrs[key_start..p];
        while p < attrs.len() && attrs[p].is_ascii_whitespace() {
            p += 1;
        }
        if p >= attrs.len() || attrs[p] != b'=' {
            continue;
        }
        p += 1;
        while p < attrs.len() && attrs[p].is_ascii_whitespace() {
            p += 1;
        }
        let value = if p < attrs.len() && (attrs[p] == b'"' || attrs[p] == b'\'') {
            let quote = attrs[p];
            p += 1;
            let v_start = p;
            while p < attrs.len() && attrs[p] != quote {
                p += 1;
            }
            let v = &attrs[v_start..p];
            p += 1;
            v
        } else {
            let v_start = p;
            while p < attrs.len() && !attrs[p].is_ascii_whitespace() {
                p += 1;
            }
            &attrs[v_start..p]
        };
        if this_key.eq_ignore_ascii_case(key.as_bytes()) {
            return Some(value);
        }
    }
    None
}

/// The value of the first `<meta name=KEY content=…>` among `tags`.
fn meta_content<'a>(tags: &[Tag<'a>], name_attr: &str, wanted: &str) -> Option<&'a [u8]> {
    tags.iter()
        .filter(|t| t.name == "meta")
        .find(|t| {
            find_attr(t.attrs, name_attr)
                .is_some_and(|v| v.eq_ignore_ascii_case(wanted.as_bytes()))
        })
        .and_then(|t| find_attr(t.attrs, "content"))
}

impl Analyzer for HtmlAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if data.is_empty() {
            return previous;
        }
        if let Some(mime) = previous.extract_last(KeywordType::Mimetype) {
            if BLACKLIST.contains(&mime) {
                return previous;
            }
        }

        let tags = scan_tags(data);
        if tags.is_empty() {
            return previous;
        }

        // Charset and mimetype from <meta http-equiv="content-type">.
        let mut charset = "ISO-8859-1".to_string();
        if let Some(content) = meta_content(&tags, "http-equiv", "content-type") {
            let content = String::from_utf8_lossy(content).into_owned();
            if content.trim_start().starts_with("text/html") {
                previous.prepend(KeywordType::Mimetype, "text/html");
            }
            if let Some(cs) = content.split("charset=").nth(1) {
                let cs = cs.trim().trim_matches(|c| c == '"' || c == '\'');
                if !cs.is_empty() {
                    charset = cs.to_string();
                }
            }
        }

        for (name, keyword_type) in TAG_MAP {
            if let Some(content) = meta_content(&tags, "name", name) {
                let value = convert_to_utf8(content, &charset);
                if !value.trim().is_empty() {
                    previous.prepend(*keyword_type, value.trim());
                }
            }
        }

        if let Some(title) = tags.iter().find(|t| t.name == "title") {
            let value = convert_to_utf8(title.text, &charset);
            if !value.trim().is_empty() {
                previous.prepend(KeywordType::Title, value.trim());
            }
        }

        previous
    }
}
