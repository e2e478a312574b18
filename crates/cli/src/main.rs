mod config;
mod output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use sift_core::{extract_from_file, AnalyzerChain, DuplicatePolicy};
use sift_extract_dispatch::{default_chain, default_registry};

use config::CliConfig;

#[derive(Parser)]
#[command(name = "sift", about = "Extract metadata keywords from files")]
struct Args {
    /// Files to extract from
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Extra analyzers, config-string grammar: `[-]name[(options)][:…]`
    /// (leading `-` appends instead of prepending)
    #[arg(short, long)]
    libraries: Option<String>,

    /// Start from an empty chain instead of the default analyzer set
    #[arg(short, long)]
    no_default: bool,

    /// Remove duplicate keywords before printing
    #[arg(short, long, value_parser = parse_policy)]
    duplicates: Option<DuplicatePolicy>,

    /// Drop empty (all-whitespace) keywords before printing
    #[arg(short, long)]
    remove_empty: bool,

    /// Only print keywords of these type names (repeatable)
    #[arg(short, long = "print")]
    print: Vec<String>,

    /// BibTeX output, one entry per file
    #[arg(short, long)]
    bibtex: bool,

    /// JSON output, one array per file
    #[arg(short, long)]
    json: bool,

    /// Print file headers even for empty results
    #[arg(short, long)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(long, default_value = "/etc/sift/sift.toml")]
    config: String,
}

fn parse_policy(s: &str) -> Result<DuplicatePolicy, String> {
    match s {
        "strict" => Ok(DuplicatePolicy::Strict),
        "typeless" => Ok(DuplicatePolicy::Typeless),
        "remove-unknown" => Ok(DuplicatePolicy::RemoveUnknown),
        _ => Err(format!(
            "unknown policy '{s}' (expected strict, typeless, or remove-unknown)"
        )),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = CliConfig::load(&args.config).context("loading config")?;

    let registry = default_registry();
    let mut chain = if args.no_default || config.chain.no_default {
        AnalyzerChain::new()
    } else {
        default_chain(&registry)
    };
    if let Some(spec) = &config.chain.spec {
        chain.load_config(&registry, spec);
    }
    if let Some(spec) = &args.libraries {
        chain.load_config(&registry, spec);
    }
    if chain.is_empty() {
        warn!("analyzer chain is empty; no keywords can be found");
    }

    let mut failures = 0usize;
    for path in &args.files {
        let mut list = match extract_from_file(&chain, path) {
            Ok(list) => list,
            Err(e) => {
                eprintln!("sift: {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };

        if args.remove_empty {
            list = list.remove_empty();
        }
        if let Some(policy) = args.duplicates.or({
            // BibTeX entries want one value per field.
            args.bibtex.then_some(DuplicatePolicy::Strict)
        }) {
            list = list.remove_duplicates(policy);
        }

        if args.json {
            output::print_json(path, &list)?;
        } else if args.bibtex {
            output::print_bibtex(path, &list);
        } else {
            output::print_plain(path, &list, &args.print, args.verbose);
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
