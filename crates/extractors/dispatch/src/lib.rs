//! Built-in analyzer registry and default chain construction.
//!
//! This crate is the only place that knows about every concrete analyzer;
//! the core chain machinery sees nothing but the registry.  Applications
//! that want a custom analyzer set build their own [`PluginRegistry`] and
//! chains from it.

use sift_core::{AnalyzerChain, PluginRegistry};

/// Environment variable naming extra analyzers (config-string grammar) to
/// load on top of the default chain.
pub const PLUGIN_ENV_VAR: &str = "SIFT_PLUGINS";

/// Default invocation order.
///
/// Structured-binary sniffers run first: each one self-detects by magic and
/// establishes the mimetype, which the text-oriented analyzers towards the
/// end (html above all) use to skip work via their blacklists.  The
/// `filename`, `split`, `lowercase`, `printable`, and `hash` analyzers are
/// registered but deliberately not part of the default chain — they derive
/// or rewrite records rather than recognize formats, so callers opt in.
pub const DEFAULT_CHAIN_ORDER: &[&str] = &[
    "asf", "elf", "riff", "zip", "jpeg", "gif", "png", "deb", "tar", "mime",
    "id3v24", "id3v23", "id3v2", "mp3", "html",
];

/// Registry holding every built-in analyzer.
pub fn default_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register("mime", sift_extract_mime::analyzer);
    registry.register("html", sift_extract_html::analyzer);
    registry.register("mp3", sift_extract_audio::mp3);
    registry.register("id3v2", sift_extract_audio::id3v2);
    registry.register("id3v23", sift_extract_audio::id3v23);
    registry.register("id3v24", sift_extract_audio::id3v24);
    registry.register("png", sift_extract_image::png);
    registry.register("gif", sift_extract_image::gif);
    registry.register("jpeg", sift_extract_image::jpeg);
    registry.register("zip", sift_extract_archive::zip);
    registry.register("tar", sift_extract_archive::tar);
    registry.register("deb", sift_extract_archive::deb);
    registry.register("elf", sift_extract_elf::analyzer);
    registry.register("riff", sift_extract_riff::analyzer);
    registry.register("asf", sift_extract_asf::analyzer);
    registry.register("hash", sift_extract_hash::analyzer);
    registry.register("filename", sift_extract_text::filename);
    registry.register("split", sift_extract_text::split);
    registry.register("lowercase", sift_extract_text::lowercase);
    registry.register("printable", sift_extract_text::printable);
    registry
}

/// The default chain: every format analyzer in [`DEFAULT_CHAIN_ORDER`],
/// plus whatever [`PLUGIN_ENV_VAR`] names on top.
pub fn default_chain(registry: &PluginRegistry) -> AnalyzerChain {
    let mut chain = AnalyzerChain::new();
    for name in DEFAULT_CHAIN_ORDER {
        chain.add_last(registry, name, None);
    }
    if let Ok(extra) = std::env::var(PLUGIN_ENV_VAR) {
        chain.load_config(registry, &extra);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_default_chain_name_is_registered() {
        let registry = default_registry();
        for name in DEFAULT_CHAIN_ORDER {
            assert!(registry.contains(name), "{name} missing from registry");
        }
    }

    #[test]
    fn default_chain_matches_the_order() {
        let registry = default_registry();
        let chain = default_chain(&registry);
        assert!(chain.len() >= DEFAULT_CHAIN_ORDER.len());
        let names: Vec<&str> = chain.names().take(DEFAULT_CHAIN_ORDER.len()).collect();
        // Environment additions, if any, prepend or append; the default
        // order itself must survive contiguously unless SIFT_PLUGINS is set.
        if std::env::var(PLUGIN_ENV_VAR).is_err() {
            assert_eq!(names, DEFAULT_CHAIN_ORDER);
        }
    }
}
