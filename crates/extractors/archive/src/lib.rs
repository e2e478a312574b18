//! Container-format analyzers: ZIP central directories, TAR header chains,
//! and Debian packages inside `ar` archives.
//!
//! These are the formats where every interesting number — entry counts,
//! member sizes, directory offsets — comes out of the file itself.  The
//! walkers here validate each field against the real buffer size before
//! using it, and a corrupted container yields whatever fully-validated
//! records were collected before the corruption point, never partially
//! parsed ones.

mod deb;
mod tar;
mod zip;

use sift_core::{Analyzer, KeywordList};

pub struct ZipAnalyzer;
pub struct TarAnalyzer;
pub struct DebAnalyzer;

pub fn zip() -> Box<dyn Analyzer> {
    Box::new(ZipAnalyzer)
}

pub fn tar() -> Box<dyn Analyzer> {
    Box::new(TarAnalyzer)
}

pub fn deb() -> Box<dyn Analyzer> {
    Box::new(DebAnalyzer)
}

impl Analyzer for ZipAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        zip::analyze(data, previous)
    }
}

impl Analyzer for TarAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        tar::analyze(data, previous)
    }
}

impl Analyzer for DebAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        deb::analyze(data, previous)
    }
}
