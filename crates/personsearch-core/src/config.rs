//! Configuration loader, typed search settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_SEARCH__MAX_RESULTS=50`).

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Result, SearchError};
use crate::identifier::{parse_search_patterns, IdentifierRegex};
use crate::types::{IdentifierTypeRef, MatchMode};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.search_config()?;
        debug!(env = %env_name, "configuration loaded");
        Ok(config)
    }

    /// Build from an in-memory TOML document; used by tests and embedders.
    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Figment::new().merge(Toml::string(toml)) }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| SearchError::Configuration(format!("Failed to get '{}': {}", key, e)))
    }

    /// The `[search]` table, defaulted and validated. A missing table yields
    /// the defaults.
    pub fn search_config(&self) -> Result<SearchConfig> {
        let config = if self.figment.find_value("search").is_ok() {
            self.get::<SearchConfig>("search")?
        } else {
            SearchConfig::default()
        };
        config.validate()?;
        Ok(config)
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentifierTypeConfig {
    pub id: IdentifierTypeRef,
    pub name: String,
}

/// Administrator settings for identifier matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentifierSearchConfig {
    /// Comma-separated templates using `@SEARCH@`, `@SEARCH-1@`, `@CHECKDIGIT@`.
    pub search_patterns: Option<String>,
    /// Identifier regex containing `@SEARCH@`, e.g. `^0*@SEARCH@([A-Z]+-[0-9])?$`.
    pub regex: Option<String>,
    pub prefix: String,
    pub suffix: String,
    pub match_mode: MatchMode,
    pub case_sensitive: bool,
}

impl Default for IdentifierSearchConfig {
    fn default() -> Self {
        Self {
            search_patterns: None,
            regex: None,
            prefix: String::new(),
            suffix: String::new(),
            match_mode: MatchMode::Start,
            case_sensitive: false,
        }
    }
}

/// Everything the matchers read from the deployment, loaded once per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub name_match_mode: MatchMode,
    pub attribute_match_mode: MatchMode,
    pub min_search_characters: usize,
    pub max_results: usize,
    pub identifier_types: Vec<IdentifierTypeConfig>,
    pub identifier: IdentifierSearchConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            name_match_mode: MatchMode::Start,
            attribute_match_mode: MatchMode::Exact,
            min_search_characters: 2,
            max_results: 1000,
            identifier_types: Vec::new(),
            identifier: IdentifierSearchConfig::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_results == 0 {
            return Err(SearchError::Configuration("search.max_results must be > 0".into()));
        }
        if let Some(patterns) = self.identifier.search_patterns.as_deref() {
            parse_search_patterns(patterns)?;
        }
        if let Some(regex) = self.identifier.regex.as_deref() {
            IdentifierRegex::parse(regex)?.compile_for("0")?;
        }
        Ok(())
    }

    /// `true` when `id` names a configured identifier type. An empty registry
    /// accepts everything.
    pub fn knows_identifier_type(&self, id: IdentifierTypeRef) -> bool {
        self.identifier_types.is_empty() || self.identifier_types.iter().any(|t| t.id == id)
    }
}

/// Where the coordinator reads its [`SearchConfig`] from at the start of a request.
pub trait ConfigSource: Send + Sync {
    fn search_config(&self) -> Result<SearchConfig>;
}

impl ConfigSource for SearchConfig {
    fn search_config(&self) -> Result<SearchConfig> {
        self.validate()?;
        Ok(self.clone())
    }
}

impl ConfigSource for Config {
    fn search_config(&self) -> Result<SearchConfig> { Config::search_config(self) }
}
