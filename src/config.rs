//! Search Configuration
//!
//! Paging defaults, identifier column, structured-query rollout and log
//! level. Loaded from a JSON file; every key is optional.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::{SearchError, SearchResult};

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Synthetic identifier column, always queriable (default: "_id")
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Page size used when a paginated request gives no limit (default: 100)
    #[serde(default = "default_page_size")]
    pub default_page_size: usize,

    /// Upper bound applied to any requested limit (default: 1000)
    #[serde(default = "default_max_page_size")]
    pub max_page_size: usize,

    /// Structured-query engine rollout
    #[serde(default)]
    pub structured_query: StructuredQueryConfig,

    /// `tracing` filter directive (default: "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

/// Which tenants run on the structured-query engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredQueryConfig {
    /// Enabled for every tenant not listed in `disabled_tenants`
    #[serde(default)]
    pub default_enabled: bool,

    /// Tenants opted in regardless of the default
    #[serde(default)]
    pub tenants: BTreeSet<String>,

    /// Tenants opted out regardless of the default
    #[serde(default)]
    pub disabled_tenants: BTreeSet<String>,
}

fn default_id_field() -> String {
    "_id".to_string()
}

fn default_page_size() -> usize {
    100
}

fn default_max_page_size() -> usize {
    1000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            id_field: default_id_field(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            structured_query: StructuredQueryConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl SearchConfig {
    /// Load configuration from a JSON file
    pub fn load(path: &Path) -> SearchResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            SearchError::config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(content: &str) -> SearchResult<Self> {
        let config: SearchConfig = serde_json::from_str(content)
            .map_err(|e| SearchError::config(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> SearchResult<()> {
        if self.id_field.trim().is_empty() {
            return Err(SearchError::config("id_field must not be empty"));
        }

        if self.default_page_size == 0 {
            return Err(SearchError::config("default_page_size must be > 0"));
        }

        if self.max_page_size == 0 {
            return Err(SearchError::config("max_page_size must be > 0"));
        }

        if self.default_page_size > self.max_page_size {
            return Err(SearchError::config(format!(
                "default_page_size {} exceeds max_page_size {}",
                self.default_page_size, self.max_page_size
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SearchConfig::default();
        assert_eq!(config.id_field, "_id");
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.max_page_size, 1000);
        assert!(!config.structured_query.default_enabled);
    }

    #[test]
    fn test_empty_json_uses_defaults() {
        let config = SearchConfig::from_json("{}").unwrap();
        assert_eq!(config, SearchConfig::default());
    }

    #[test]
    fn test_structured_query_tenants() {
        let config = SearchConfig::from_json(
            r#"{"structured_query": {"tenants": ["acme"], "disabled_tenants": ["legacy"]}}"#,
        )
        .unwrap();
        assert!(config.structured_query.tenants.contains("acme"));
        assert!(config.structured_query.disabled_tenants.contains("legacy"));
    }

    #[test]
    fn test_default_page_size_cannot_exceed_max() {
        let result = SearchConfig::from_json(r#"{"default_page_size": 50, "max_page_size": 10}"#);
        assert!(matches!(result, Err(SearchError::Config(_))));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(SearchConfig::from_json(r#"{"default_page_size": 0}"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("rowsearch.json");
        fs::write(&path, r#"{"log_level": "debug"}"#).unwrap();

        let config = SearchConfig::load(&path).unwrap();
        assert_eq!(config.log_level, "debug");
    }
}
