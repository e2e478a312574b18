//! Debian package analyzer: an `ar` archive whose `control.tar.gz` member
//! carries the package's metadata fields.

use std::io::Read;

use sift_core::convert::{convert_to_utf8, trim_field};
use sift_core::{KeywordList, KeywordType};
use tracing::debug;

use crate::tar;

const AR_MAGIC: &[u8] = b"!<arch>\n";
const AR_HEADER: usize = 60;
const MAX_MEMBERS: usize = 256;

/// The control member is a few KiB of text; cap its decompression.
const MAX_CONTROL_INFLATE: u64 = 1024 * 1024;

/// Control-file fields worth keeping.
const FIELD_MAP: &[(&str, KeywordType)] = &[
    ("Package", KeywordType::Software),
    ("Version", KeywordType::VersionNumber),
    ("Section", KeywordType::Category),
    ("Priority", KeywordType::Priority),
    ("Architecture", KeywordType::CreatedFor),
    ("Maintainer", KeywordType::Packager),
    ("Installed-Size", KeywordType::Size),
    ("Depends", KeywordType::Dependency),
    ("Conflicts", KeywordType::Conflicts),
    ("Replaces", KeywordType::Replaces),
    ("Provides", KeywordType::Provides),
    ("Source", KeywordType::Source),
    ("Essential", KeywordType::Priority),
    ("Description", KeywordType::Description),
];

struct ArMember<'a> {
    name: String,
    content: &'a [u8],
}

fn ar_members(data: &[u8]) -> Vec<ArMember<'_>> {
    let mut members = Vec::new();
    let mut pos = AR_MAGIC.len();

    while members.len() < MAX_MEMBERS {
        let Some(header) = data.get(pos..pos + AR_HEADER) else { break };
        if &header[58..60] != b"`\n" {
            break;
        }
        let name = trim_field(&convert_to_utf8(&header[..16], "ISO-8859-1"))
            .trim_end_matches('/')
            .to_string();
        let size_text = convert_to_utf8(&header[48..58], "ISO-8859-1");
        let Ok(size) = size_text.trim().parse::<usize>() else { break };
        let Some(content_start) = pos.checked_add(AR_HEADER) else { break };
        let Some(content_end) = content_start.checked_add(size) else { break };
        if content_end > data.len() {
            break;
        }
        members.push(ArMember {
            name,
            content: &data[content_start..content_end],
        });
        // Members are 2-byte aligned.
        pos = content_end + (size & 1);
    }
    members
}

/// Map the key/value lines of a `control` file onto records.  Continuation
/// lines (leading space) extend the previous field and are folded in.
fn analyze_control(text: &str, mut previous: KeywordList) -> KeywordList {
    let mut current: Option<(KeywordType, String)> = None;
    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.as_mut() {
                let cont = line.trim();
                if cont != "." {
                    value.push(' ');
                    value.push_str(cont);
                }
            }
            continue;
        }
        if let Some((keyword_type, value)) = current.take() {
            previous.prepend(keyword_type, value);
        }
        let Some((key, value)) = line.split_once(':') else { continue };
        if let Some((_, keyword_type)) = FIELD_MAP.iter().find(|(name, _)| *name == key) {
            current = Some((*keyword_type, value.trim().to_string()));
        }
    }
    if let Some((keyword_type, value)) = current.take() {
        previous.prepend(keyword_type, value);
    }
    previous
}

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    if !data.starts_with(AR_MAGIC) {
        return previous;
    }
    let members = ar_members(data);
    if !members.iter().any(|m| m.name == "debian-binary") {
        return previous;
    }
    previous.prepend(KeywordType::Mimetype, "application/x-debian-package");

    for member in &members {
        let control_tar: Option<Vec<u8>> = match member.name.as_str() {
            "control.tar.gz" => {
                let mut out = Vec::new();
                match flate2::read::GzDecoder::new(member.content)
                    .take(MAX_CONTROL_INFLATE)
                    .read_to_end(&mut out)
                {
                    Ok(_) => Some(out),
                    Err(e) => {
                        debug!("deb: control.tar.gz does not decompress: {e}");
                        None
                    }
                }
            }
            "control.tar" => Some(member.content.to_vec()),
            _ => None,
        };
        let Some(control_tar) = control_tar else { continue };

        for entry in tar::entries(&control_tar) {
            if entry.name == "control" || entry.name == "./control" {
                let text = convert_to_utf8(entry.content, "UTF-8");
                return analyze_control(&text, previous);
            }
        }
    }
    previous
}
