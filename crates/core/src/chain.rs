//! Ordered chains of configured analyzers.

use tracing::{debug, warn};

use crate::keyword::KeywordList;
use crate::plugin::{Analyzer, PluginRegistry};

struct ChainEntry {
    name: String,
    analyzer: Box<dyn Analyzer>,
    options: Option<String>,
}

/// An ordered sequence of loaded analyzers, invoked front-to-back against
/// one input buffer.
///
/// Order is significant: an analyzer sees the accumulated output of every
/// analyzer before it as its `previous` list, which is how mimetype sniffing
/// gates the more expensive content analyzers.  The same analyzer name may
/// be loaded any number of times; each load is an independent entry with its
/// own instance and options, and each is independently removable.
#[derive(Default)]
pub struct AnalyzerChain {
    entries: Vec<ChainEntry>,
}

impl AnalyzerChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `name` from `registry` and prepend it, so it runs before every
    /// existing entry.  An unknown name is a no-op: the failure is logged
    /// and the chain is left unchanged.
    pub fn add(&mut self, registry: &PluginRegistry, name: &str, options: Option<&str>) -> bool {
        match registry.resolve(name) {
            Some(analyzer) => {
                self.entries.insert(
                    0,
                    ChainEntry {
                        name: name.to_string(),
                        analyzer,
                        options: options.map(str::to_string),
                    },
                );
                true
            }
            None => {
                warn!("loading analyzer '{name}' failed: not registered");
                false
            }
        }
    }

    /// Like [`Self::add`], but appends: the new entry runs after every
    /// existing one.
    pub fn add_last(
        &mut self,
        registry: &PluginRegistry,
        name: &str,
        options: Option<&str>,
    ) -> bool {
        match registry.resolve(name) {
            Some(analyzer) => {
                self.entries.push(ChainEntry {
                    name: name.to_string(),
                    analyzer,
                    options: options.map(str::to_string),
                });
                true
            }
            None => {
                warn!("loading analyzer '{name}' failed: not registered");
                false
            }
        }
    }

    /// Remove the first entry named `name`, dropping its analyzer instance.
    /// Returns false (and logs) when no entry matches.
    pub fn remove(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.name == name) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => {
                debug!("unloading analyzer '{name}' failed: not in chain");
                false
            }
        }
    }

    /// Drop every entry.
    pub fn remove_all(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in invocation order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Extend the chain from a configuration string.
    ///
    /// Grammar: `entry (":" entry)*` with `entry := "-"? name ("(" options ")")?`.
    /// A leading `-` appends the entry instead of prepending it; the
    /// parenthesized options string is passed through verbatim to the
    /// analyzer at invocation time (and may itself contain `:`).
    pub fn load_config(&mut self, registry: &PluginRegistry, spec: &str) {
        for entry in parse_config(spec) {
            let options = entry.options.as_deref();
            if entry.add_last {
                self.add_last(registry, &entry.name, options);
            } else {
                self.add(registry, &entry.name, options);
            }
        }
    }

    /// Fold the chain over `data`, strictly sequentially in chain order.
    pub fn run(&self, filename: Option<&str>, data: &[u8]) -> KeywordList {
        let mut result = KeywordList::new();
        for entry in &self.entries {
            result = entry
                .analyzer
                .analyze(filename, data, result, entry.options.as_deref());
        }
        result
    }
}

struct ConfigEntry {
    name: String,
    options: Option<String>,
    add_last: bool,
}

fn parse_config(spec: &str) -> Vec<ConfigEntry> {
    let bytes = spec.as_bytes();
    let mut entries = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let mut add_last = false;
        if bytes[pos] == b'-' {
            add_last = true;
            pos += 1;
        }

        let name_start = pos;
        while pos < bytes.len() && bytes[pos] != b':' && bytes[pos] != b'(' {
            pos += 1;
        }
        let name = spec[name_start..pos].to_string();

        let mut options = None;
        if pos < bytes.len() && bytes[pos] == b'(' {
            pos += 1;
            let opt_start = pos;
            while pos < bytes.len() && bytes[pos] != b')' {
                pos += 1;
            }
            options = Some(spec[opt_start..pos].to_string());
            // Skip the ')' and anything stray up to the next separator.
            while pos < bytes.len() && bytes[pos] != b':' {
                pos += 1;
            }
        }
        if pos < bytes.len() {
            pos += 1; // the ':' separator
        }

        if !name.is_empty() {
            entries.push(ConfigEntry {
                name,
                options,
                add_last,
            });
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyword::KeywordType;
    use crate::plugin::PluginRegistry;

    struct Echo;

    impl Analyzer for Echo {
        fn analyze(
            &self,
            _filename: Option<&str>,
            _data: &[u8],
            mut previous: KeywordList,
            options: Option<&str>,
        ) -> KeywordList {
            previous.prepend(KeywordType::Comment, options.unwrap_or("echo"));
            previous
        }
    }

    fn echo() -> Box<dyn Analyzer> {
        Box::new(Echo)
    }

    fn registry() -> PluginRegistry {
        let mut r = PluginRegistry::new();
        r.register("echo", echo);
        r.register("other", echo);
        r
    }

    #[test]
    fn add_prepends_and_add_last_appends() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        assert!(chain.add(&r, "echo", None));
        assert!(chain.add(&r, "other", None));
        assert!(chain.add_last(&r, "echo", Some("tail")));
        let names: Vec<&str> = chain.names().collect();
        assert_eq!(names, ["other", "echo", "echo"]);
    }

    #[test]
    fn unknown_name_is_a_noop() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        assert!(!chain.add(&r, "missing", None));
        assert!(chain.is_empty());
    }

    #[test]
    fn remove_takes_first_match_only() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        chain.add_last(&r, "echo", Some("a"));
        chain.add_last(&r, "other", None);
        chain.add_last(&r, "echo", Some("b"));
        assert!(chain.remove("echo"));
        let names: Vec<&str> = chain.names().collect();
        assert_eq!(names, ["other", "echo"]);
        assert!(chain.remove("echo"));
        assert!(chain.remove("other"));
        assert!(!chain.remove("other"));
        assert!(chain.is_empty());
    }

    #[test]
    fn add_remove_symmetry_in_any_pairing() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        chain.add(&r, "echo", None);
        chain.add(&r, "other", None);
        chain.add_last(&r, "echo", None);
        chain.remove_all();
        assert!(chain.is_empty());

        chain.add(&r, "echo", None);
        chain.add_last(&r, "other", None);
        assert!(chain.remove("other"));
        assert!(chain.remove("echo"));
        assert!(chain.is_empty());
    }

    #[test]
    fn run_folds_in_chain_order() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        chain.add_last(&r, "echo", Some("first"));
        chain.add_last(&r, "echo", Some("second"));
        let list = chain.run(None, b"");
        let values: Vec<&str> = list.iter().map(|rec| rec.value.as_str()).collect();
        // Head of the list is the most recent prepend, i.e. the second entry.
        assert_eq!(values, ["second", "first"]);
    }

    #[test]
    fn config_string_grammar() {
        let entries = parse_config("html:-mime(deep):split(a:b):-tail");
        let summary: Vec<(String, Option<String>, bool)> = entries
            .into_iter()
            .map(|e| (e.name, e.options, e.add_last))
            .collect();
        assert_eq!(
            summary,
            [
                ("html".into(), None, false),
                ("mime".into(), Some("deep".into()), true),
                ("split".into(), Some("a:b".into()), false),
                ("tail".into(), None, true),
            ]
        );
    }

    #[test]
    fn config_string_tolerates_noise() {
        assert!(parse_config("").is_empty());
        assert!(parse_config(":::").is_empty());
        let entries = parse_config("echo(unclosed");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].options.as_deref(), Some("unclosed"));
    }

    #[test]
    fn load_config_respects_placement() {
        let r = registry();
        let mut chain = AnalyzerChain::new();
        chain.add_last(&r, "other", None);
        chain.load_config(&r, "echo(head):-echo(tail)");
        let names: Vec<&str> = chain.names().collect();
        assert_eq!(names, ["echo", "other", "echo"]);
    }
}
