//! Image analyzers: PNG chunks, GIF blocks, JPEG segments with EXIF.
//!
//! Three chain names (`png`, `gif`, `jpeg`), one crate: the formats share
//! nothing structurally, but all three are walks over length-prefixed
//! records whose length fields come from the file and are validated against
//! the buffer before every access.

mod exif;
mod gif;
mod jpeg;
mod png;

use sift_core::{Analyzer, KeywordList};

pub struct PngAnalyzer;
pub struct GifAnalyzer;
pub struct JpegAnalyzer;

pub fn png() -> Box<dyn Analyzer> {
    Box::new(PngAnalyzer)
}

pub fn gif() -> Box<dyn Analyzer> {
    Box::new(GifAnalyzer)
}

pub fn jpeg() -> Box<dyn Analyzer> {
    Box::new(JpegAnalyzer)
}

impl Analyzer for PngAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        png::analyze(data, previous)
    }
}

impl Analyzer for GifAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        gif::analyze(data, previous)
    }
}

impl Analyzer for JpegAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        _options: Option<&str>,
    ) -> KeywordList {
        jpeg::analyze(data, previous)
    }
}
