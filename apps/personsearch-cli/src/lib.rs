//! Helpers shared by the `personsearch-indexer` and `personsearch` binaries.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

use personsearch_core::config::{resolve_with_base, Config};
use personsearch_core::types::PersonRecord;

pub const DEFAULT_DATA_DIR: &str = "data/people";
pub const DEFAULT_INDEX_DIR: &str = "data/indexes/people";

/// `RUST_LOG` decides when no `-v` is given; logs go to stderr.
pub fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

/// CLI value, else `key` from the config, else `default`; relative paths
/// resolve against the working directory.
pub fn configured_path(config: &Config, cli: Option<PathBuf>, key: &str, default: &str) -> Result<PathBuf> {
    if let Some(path) = cli {
        return Ok(path);
    }
    let raw: String = config.get(key).unwrap_or_else(|_| default.to_string());
    let base = std::env::current_dir().context("cannot read working directory")?;
    Ok(resolve_with_base(&base, raw))
}

/// `*.json` files under `input`, or `input` itself when it is a file.
pub fn json_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    let mut files: Vec<PathBuf> = WalkDir::new(input)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// Parse one file holding a JSON array of person records.
pub fn read_people(path: &Path) -> Result<Vec<PersonRecord>> {
    let raw = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("cannot parse {}", path.display()))
}

pub fn load_people(input: &Path) -> Result<Vec<PersonRecord>> {
    let mut people = Vec::new();
    for file in json_files(input) {
        people.extend(read_people(&file)?);
    }
    Ok(people)
}
