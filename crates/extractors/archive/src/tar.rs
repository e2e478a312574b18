//! TAR/USTAR header-chain walker.

use sift_core::convert::{convert_to_utf8, trim_field};
use sift_core::{KeywordList, KeywordType};

const BLOCK: usize = 512;
/// Hostile archives can chain millions of tiny members; cap the walk.
const MAX_MEMBERS: usize = 4096;

pub(crate) struct Entry<'a> {
    pub name: String,
    pub content: &'a [u8],
}

/// Parse a NUL/space-padded octal field.
fn octal(field: &[u8]) -> Option<u64> {
    let text = std::str::from_utf8(field).ok()?;
    let text = text.trim_matches(|c| c == '\0' || c == ' ');
    if text.is_empty() {
        return Some(0);
    }
    u64::from_str_radix(text, 8).ok()
}

/// Walk the header chain, returning fully-validated members only.
pub(crate) fn entries(data: &[u8]) -> Vec<Entry<'_>> {
    let mut members = Vec::new();
    let mut pos = 0usize;

    while members.len() < MAX_MEMBERS {
        let Some(header) = data.get(pos..pos + BLOCK) else { break };
        // Two all-zero blocks end the archive; one is enough to stop.
        if header.iter().all(|&b| b == 0) {
            break;
        }
        if &header[257..262] != b"ustar" {
            break;
        }
        let Some(size) = octal(&header[124..136]) else { break };
        let Some(content_start) = pos.checked_add(BLOCK) else { break };
        let Some(content_end) = content_start.checked_add(size as usize) else { break };
        if content_end > data.len() {
            break; // header promises more content than the buffer holds
        }

        let name = trim_field(&convert_to_utf8(&header[..100], "ISO-8859-1")).to_string();
        members.push(Entry {
            name,
            content: &data[content_start..content_end],
        });

        // Content is padded out to whole blocks.
        let padded = (size as usize).div_ceil(BLOCK) * BLOCK;
        match content_start.checked_add(padded) {
            Some(next) => pos = next,
            None => break,
        }
    }
    members
}

pub fn analyze(data: &[u8], mut previous: KeywordList) -> KeywordList {
    let members = entries(data);
    if members.is_empty() {
        return previous;
    }
    previous.prepend(KeywordType::Mimetype, "application/x-tar");
    for member in &members {
        if !member.name.is_empty() {
            previous.prepend(KeywordType::Filename, member.name.clone());
        }
    }
    previous
}

#[cfg(test)]
pub(crate) fn build_tar(members: &[(&str, &[u8])]) -> Vec<u8> {
    let mut data = Vec::new();
    for (name, content) in members {
        let mut header = [0u8; BLOCK];
        header[..name.len()].copy_from_slice(name.as_bytes());
        let size = format!("{:011o}\0", content.len());
        header[124..124 + size.len()].copy_from_slice(size.as_bytes());
        header[257..262].copy_from_slice(b"ustar");
        header[263..265].copy_from_slice(b"00");
        data.extend_from_slice(&header);
        data.extend_from_slice(content);
        let pad = content.len().div_ceil(BLOCK) * BLOCK - content.len();
        data.extend_from_slice(&vec![0u8; pad]);
    }
    data.extend_from_slice(&[0u8; BLOCK * 2]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_names_and_mimetype() {
        let data = build_tar(&[("etc/motd", b"welcome\n"), ("usr/bin/tool", b"\x7fELF")]);
        let list = analyze(&data, KeywordList::new());
        assert_eq!(list.extract_last(KeywordType::Mimetype), Some("application/x-tar"));
        let names: Vec<&str> = list
            .iter()
            .filter(|r| r.keyword_type == KeywordType::Filename)
            .map(|r| r.value.as_str())
            .collect();
        assert_eq!(names, ["usr/bin/tool", "etc/motd"]);
    }

    #[test]
    fn content_slices_match() {
        let data = build_tar(&[("a", b"xyz")]);
        let members = entries(&data);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].content, b"xyz");
    }

    #[test]
    fn truncated_member_is_dropped() {
        let mut data = build_tar(&[("good", b"ok"), ("bad", &[7u8; 600])]);
        data.truncate(2000); // cut into the second member's data
        let members = entries(&data);
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].name, "good");
    }

    #[test]
    fn hostile_size_field_is_rejected() {
        let mut data = build_tar(&[("evil", b"x")]);
        data[124..136].copy_from_slice(b"77777777777\0");
        assert!(entries(&data).is_empty());
        assert!(analyze(&data, KeywordList::new()).is_empty());
    }

    #[test]
    fn non_tar_is_ignored() {
        assert!(entries(b"not a tar at all").is_empty());
        assert!(entries(&[0u8; 2048]).is_empty());
    }
}
