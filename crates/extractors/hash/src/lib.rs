//! Whole-buffer digest analyzer.
//!
//! The options string picks the algorithm (`rmd160`, `md5`, `sha1`);
//! RIPEMD-160 is the default.  Unlike the format analyzers this one always
//! produces a record for non-empty input — a digest exists for every byte
//! string — so it sits at the end of a chain when enabled.

use md5::Md5;
use ripemd::Ripemd160;
use sha1::{Digest, Sha1};
use sift_core::{Analyzer, KeywordList, KeywordType};
use tracing::warn;

pub struct HashAnalyzer;

pub fn analyzer() -> Box<dyn Analyzer> {
    Box::new(HashAnalyzer)
}

fn digest_hex<D: Digest>(data: &[u8]) -> String {
    let mut hasher = D::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

impl Analyzer for HashAnalyzer {
    fn analyze(
        &self,
        _filename: Option<&str>,
        data: &[u8],
        mut previous: KeywordList,
        options: Option<&str>,
    ) -> KeywordList {
        if data.is_empty() {
            return previous;
        }
        let algorithm = options.map(str::trim).unwrap_or("rmd160");
        let (keyword_type, value) = match algorithm {
            "rmd160" | "ripemd160" => {
                (KeywordType::HashRmd160, digest_hex::<Ripemd160>(data))
            }
            "md5" => (KeywordType::HashMd5, digest_hex::<Md5>(data)),
            "sha1" => (KeywordType::HashSha1, digest_hex::<Sha1>(data)),
            other => {
                warn!("unknown hash algorithm '{other}' requested, skipping");
                return previous;
            }
        };
        previous.prepend(keyword_type, value);
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_ripemd160() {
        let list = HashAnalyzer.analyze(None, b"abc", KeywordList::new(), None);
        // RIPEMD-160("abc"), a published test vector.
        assert_eq!(
            list.extract_last(KeywordType::HashRmd160),
            Some("8eb208f7e05d987a9b044a8e98c6b087f15a0bfc")
        );
    }

    #[test]
    fn options_select_the_algorithm() {
        let list = HashAnalyzer.analyze(None, b"abc", KeywordList::new(), Some("md5"));
        assert_eq!(
            list.extract_last(KeywordType::HashMd5),
            Some("900150983cd24fb0d6963f7d28e17f72")
        );
        let list = HashAnalyzer.analyze(None, b"abc", KeywordList::new(), Some("sha1"));
        assert_eq!(
            list.extract_last(KeywordType::HashSha1),
            Some("a9993e364706816aba3e25717850c26c9cd0d89d")
        );
    }

    #[test]
    fn unknown_algorithm_is_a_noop() {
        let list = HashAnalyzer.analyze(None, b"abc", KeywordList::new(), Some("crc7"));
        assert!(list.is_empty());
    }

    #[test]
    fn empty_input_produces_nothing() {
        let list = HashAnalyzer.analyze(None, b"", KeywordList::new(), None);
        assert!(list.is_empty());
    }
}
