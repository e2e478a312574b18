use serde::Deserialize;

/// Optional TOML configuration for the CLI.
///
/// A missing file is not an error — everything has a default — but a file
/// that exists and fails to parse is reported rather than ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub chain: ChainConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChainConfig {
    /// Config-string loaded on top of the default chain.
    #[serde(default)]
    pub spec: Option<String>,

    /// Skip the compiled-in default analyzer set.
    #[serde(default)]
    pub no_default: bool,
}

impl CliConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}
