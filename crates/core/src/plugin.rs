//! The analyzer contract and the registry that maps names to analyzers.

use std::collections::HashMap;

use crate::keyword::KeywordList;

/// One format-recognizing transform in the pipeline.
///
/// Contract, binding for every implementation:
///
/// - must never panic on truncated, zero-length, or adversarial input; any
///   out-of-range condition is caught by an explicit bounds check and the
///   analyzer returns `previous` unchanged,
/// - must never trust a length, count, or offset field read from `data`
///   without validating it (overflow-safely) against the buffer size,
/// - may read `previous` (e.g. to skip work when an earlier analyzer already
///   established an incompatible mimetype) and may prepend new records, but
///   must never alter records already in the list,
/// - must terminate in time bounded by the input size.
pub trait Analyzer: Send + Sync {
    fn analyze(
        &self,
        filename: Option<&str>,
        data: &[u8],
        previous: KeywordList,
        options: Option<&str>,
    ) -> KeywordList;
}

/// Constructor for a registered analyzer.
pub type AnalyzerFactory = fn() -> Box<dyn Analyzer>;

/// Explicit name-to-analyzer registry.
///
/// This is the loading capability injected into chain construction: the
/// chain never touches process-global state, so tests can build a registry
/// containing exactly the analyzers they want, and two chains built from the
/// same registry own their analyzer instances independently.
#[derive(Default)]
pub struct PluginRegistry {
    factories: HashMap<String, AnalyzerFactory>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `factory` under `name`, replacing any previous registration.
    pub fn register(&mut self, name: &str, factory: AnalyzerFactory) {
        self.factories.insert(name.to_string(), factory);
    }

    /// Instantiate a fresh analyzer for `name`, if registered.
    pub fn resolve(&self, name: &str) -> Option<Box<dyn Analyzer>> {
        self.factories.get(name).map(|f| f())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}
