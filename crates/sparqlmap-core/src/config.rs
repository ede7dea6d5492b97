//! Template configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::prefix::PrefixTable;

/// Overrides [`TemplateConfig::endpoint`].
pub const ENDPOINT_ENV: &str = "SPARQLMAP_ENDPOINT";
/// Overrides [`TemplateConfig::default_language`].
pub const LANGUAGE_ENV: &str = "SPARQLMAP_LANG";

/// Configuration for a [`crate::SparqlTemplate`] and its transports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateConfig {
    /// Extra prefix bindings, layered over the built-in ones.
    pub prefixes: BTreeMap<String, String>,
    /// Language preference for tagged literals when neither the property nor
    /// the entity declares one. `None` accepts every tag.
    pub default_language: Option<String>,
    /// SPARQL endpoint URL (HTTP transport only).
    pub endpoint: Option<String>,
    /// HTTP request timeout.
    pub timeout_secs: u64,
    /// `User-Agent` header sent to endpoints.
    pub user_agent: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            prefixes: BTreeMap::new(),
            default_language: None,
            endpoint: None,
            timeout_secs: 30,
            user_agent: concat!("sparqlmap/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TemplateConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Apply `SPARQLMAP_ENDPOINT` / `SPARQLMAP_LANG` when set and non-empty.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENDPOINT_ENV).ok(),
            std::env::var(LANGUAGE_ENV).ok(),
        )
    }

    fn with_overrides(mut self, endpoint: Option<String>, language: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|s| !s.trim().is_empty()) {
            self.endpoint = Some(endpoint.trim().to_string());
        }
        if let Some(language) = language.filter(|s| !s.trim().is_empty()) {
            self.default_language = Some(language.trim().to_string());
        }
        self
    }

    /// Built-in prefixes overlaid with the configured ones.
    pub fn prefix_table(&self) -> PrefixTable {
        let mut table = PrefixTable::with_defaults();
        table.merge(&self.prefixes.iter().collect::<PrefixTable>());
        table
    }
}
