//! MPEG audio analyzers: the ID3v1 tail tag, the ID3v2 frame-table family,
//! and the MPEG frame-header walk.
//!
//! Registered as four chain names: `mp3` (ID3v1 + frame walk), and `id3v2`,
//! `id3v23`, `id3v24` for the three tag revisions.  The revisions differ in
//! frame-header layout (3-byte vs 4-byte IDs, plain vs syncsafe sizes), so
//! each analyzer accepts exactly one major version — loading all three in a
//! chain mirrors how the formats coexist in the wild.

mod frames;
mod id3v1;
mod id3v2;

use sift_core::{Analyzer, KeywordList, KeywordType};

pub use id3v1::GENRES;

/// ID3v1 tag plus MPEG frame-header walk.
pub struct Mp3Analyzer;

pub fn mp3() -> Box<dyn Analyzer> {
    Box::new(Mp3Analyzer)
}

impl Analyzer for Mp3Analyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        if let Some(tag) = id3v1::parse(data) {
            previous = tag.prepend_records(previous);
        }
        frames::analyze(data, previous)
    }
}

/// One ID3v2 major revision.
pub struct Id3v2Analyzer {
    major: u8,
}

pub fn id3v2() -> Box<dyn Analyzer> {
    Box::new(Id3v2Analyzer { major: 2 })
}

pub fn id3v23() -> Box<dyn Analyzer> {
    Box::new(Id3v2Analyzer { major: 3 })
}

pub fn id3v24() -> Box<dyn Analyzer> {
    Box::new(Id3v2Analyzer { major: 4 })
}

impl Analyzer for Id3v2Analyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        for (keyword_type, value) in id3v2::parse(data, self.major) {
            previous.prepend(keyword_type, value);
        }
        previous
    }
}
