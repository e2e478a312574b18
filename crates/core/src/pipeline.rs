//! Pipeline driver: buffer acquisition, decompression pre-pass, chain
//! invocation.

use std::io::Read;
use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use crate::chain::AnalyzerChain;
use crate::keyword::KeywordList;

/// Do not read beyond the first 1 GiB of a file.
pub const MAX_READ: u64 = 1024 * 1024 * 1024;

/// Do not inflate compressed input beyond 16 MiB.  Bounds the worst case of
/// a decompression bomb: past the cap the truncated prefix is analyzed.
pub const MAX_DECOMPRESS: u64 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// Extract keywords from a file.
///
/// At most [`MAX_READ`] bytes are read.  An empty file yields an empty
/// list; an unreadable file yields `Err`, never a panic.  The path itself is
/// passed to the chain as the filename, for analyzers that use it.
pub fn extract_from_file(chain: &AnalyzerChain, path: &Path) -> Result<KeywordList, ExtractError> {
    let file = std::fs::File::open(path)?;
    let len = file.metadata()?.len();
    if len == 0 {
        return Ok(KeywordList::new());
    }
    if len > MAX_READ {
        warn!(
            "{}: scanning only the first {} of {} bytes",
            path.display(),
            MAX_READ,
            len
        );
    }

    let mut data = Vec::with_capacity(len.min(MAX_READ) as usize);
    file.take(MAX_READ).read_to_end(&mut data)?;
    Ok(run(chain, path.to_str(), &data))
}

/// Extract keywords from an in-memory buffer.
pub fn extract_from_buffer(chain: &AnalyzerChain, data: &[u8]) -> KeywordList {
    run(chain, None, data)
}

fn run(chain: &AnalyzerChain, filename: Option<&str>, data: &[u8]) -> KeywordList {
    match decompress(data) {
        Some(inflated) => chain.run(filename, &inflated),
        None => chain.run(filename, data),
    }
}

/// Unwrap a gzip or bzip2 stream before dispatch, capped at
/// [`MAX_DECOMPRESS`] bytes of output.
///
/// Returns `None` when the buffer is not compressed, when the stream is
/// corrupt (the raw bytes are analyzed instead), or when nothing comes out.
fn decompress(data: &[u8]) -> Option<Vec<u8>> {
    if data.starts_with(&[0x1f, 0x8b, 0x08]) {
        inflate_capped(flate2::read::GzDecoder::new(data), "gzip")
    } else if data.len() > 3 && data.starts_with(b"BZh") && data[3].is_ascii_digit() {
        inflate_capped(bzip2::read::BzDecoder::new(data), "bzip2")
    } else {
        None
    }
}

fn inflate_capped<R: Read>(reader: R, label: &str) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match reader.take(MAX_DECOMPRESS).read_to_end(&mut out) {
        Ok(0) => None,
        Ok(n) => {
            if n as u64 == MAX_DECOMPRESS {
                warn!("{label} stream larger than {MAX_DECOMPRESS} bytes, output truncated");
            }
            Some(out)
        }
        Err(e) => {
            debug!("{label} decompression failed, analyzing raw bytes: {e}");
            None
        }
    }
}
