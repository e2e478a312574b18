//! Core of the sift metadata-extraction pipeline.
//!
//! A [`chain::AnalyzerChain`] holds an ordered list of [`plugin::Analyzer`]
//! instances resolved from a [`plugin::PluginRegistry`].  The
//! [`pipeline`] module feeds one read-only byte buffer through the chain;
//! each analyzer prepends whatever [`keyword::KeywordRecord`]s it can
//! recognize and hands the list on.  Everything an analyzer reads from the
//! buffer is untrusted: a malformed file must never produce a panic, only
//! an unchanged list.

pub mod chain;
pub mod codec;
pub mod convert;
pub mod keyword;
pub mod pipeline;
pub mod plugin;

pub use chain::AnalyzerChain;
pub use codec::{binary_decode, binary_encode, CodecError};
pub use keyword::{
    DuplicatePolicy, KeywordList, KeywordRecord, KeywordType, HIGHEST_TYPE_NUMBER,
};
pub use pipeline::{extract_from_buffer, extract_from_file, ExtractError};
pub use plugin::{Analyzer, AnalyzerFactory, PluginRegistry};
