//! Configuration module for the router
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`LLM_ROUTER_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use llm_router::config::RouterConfig;
//!
//! let toml = r#"
//! [server]
//! port = 9000
//!
//! [categories.translation]
//! models = ["openai/gpt-4o-mini"]
//! keywords = ["translate"]
//! "#;
//! let config: RouterConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.server.port, 9000);
//! assert!(config.categories.contains_key("translation"));
//! ```

pub mod classifier;
pub mod error;
pub mod logging;
pub mod provider;
pub mod routing;
pub mod server;

pub use classifier::{ClassifierConfig, LocalClassifierConfig, RemoteClassifierConfig};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use provider::{ProviderConfig, ProvidersConfig};
pub use routing::{
    default_categories, validate_categories, validate_category, CategoryConfig,
    ContinuationConfig, ContinuationMode, RoutingConfig, RoutingMode, DEFAULT_MODEL,
};
pub use server::ServerConfig;

// Re-export CircuitBreakerConfig from circuit module
pub use crate::circuit::CircuitBreakerConfig;

use crate::classifier::ContinuationDetector;
use crate::routing::RoutingTable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Example configuration written by `llm-router config init`.
pub const EXAMPLE_CONFIG: &str = include_str!("../../router.example.toml");

/// Unified router configuration.
///
/// `categories` replaces the built-in table as a whole when present in a
/// file, so a file that lists categories must list every one it needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    pub server: ServerConfig,
    pub routing: RoutingConfig,
    pub classifier: ClassifierConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub logging: LoggingConfig,
    pub providers: ProvidersConfig,
    pub categories: BTreeMap<String, CategoryConfig>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            routing: RoutingConfig::default(),
            classifier: ClassifierConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            logging: LoggingConfig::default(),
            providers: ProvidersConfig::default(),
            categories: default_categories(),
        }
    }
}

impl RouterConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p)?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
            }
            None => Ok(Self::default()),
        }
    }

    /// Write the configuration as TOML.
    ///
    /// The file is written next to `path` and renamed over it, so readers
    /// see either the old configuration or the new one.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        let tmp = temp_path(path);
        std::fs::write(&tmp, content)?;
        if let Err(e) = std::fs::rename(&tmp, path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are ignored (the file or default value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("LLM_ROUTER_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("LLM_ROUTER_HOST") {
            self.server.host = host;
        }

        if let Ok(mode) = std::env::var("LLM_ROUTER_MODE") {
            if let Ok(m) = mode.parse() {
                self.routing.mode = m;
            }
        }
        if let Ok(model) = std::env::var("LLM_ROUTER_DEFAULT_MODEL") {
            if let Ok(m) = model.parse() {
                self.routing.default_model = m;
            }
        }
        if let Ok(path) = std::env::var("LLM_ROUTER_CIRCUIT_STATE_FILE") {
            self.circuit_breaker.state_file = Some(path.into());
        }

        if let Ok(level) = std::env::var("LLM_ROUTER_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("LLM_ROUTER_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation {
                field: "server.port".to_string(),
                message: "port must be non-zero".to_string(),
            });
        }
        if self.routing.attempt_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "routing.attempt_timeout_seconds".to_string(),
                message: "timeout must be non-zero".to_string(),
            });
        }
        if self.routing.continuation.mode == ContinuationMode::WordCount
            && self.routing.continuation.word_threshold == 0
        {
            return Err(ConfigError::Validation {
                field: "routing.continuation.word_threshold".to_string(),
                message: "threshold must be non-zero".to_string(),
            });
        }
        if self.classifier.local.timeout_seconds == 0 || self.classifier.remote.timeout_seconds == 0
        {
            return Err(ConfigError::Validation {
                field: "classifier.timeout_seconds".to_string(),
                message: "classifier timeouts must be non-zero".to_string(),
            });
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Validation {
                field: "circuit_breaker.failure_threshold".to_string(),
                message: "threshold must be at least 1".to_string(),
            });
        }

        validate_categories(&self.categories)?;
        self.continuation_detector()?;
        Ok(())
    }

    fn continuation_detector(&self) -> Result<ContinuationDetector, ConfigError> {
        ContinuationDetector::from_config(&self.routing.continuation).map_err(|e| {
            ConfigError::Validation {
                field: "routing.continuation.patterns".to_string(),
                message: e.to_string(),
            }
        })
    }

    /// Build the routing snapshot published to the engine.
    pub fn routing_table(&self) -> Result<RoutingTable, ConfigError> {
        Ok(RoutingTable {
            mode: self.routing.mode,
            default_model: self.routing.default_model.clone(),
            categories: self.categories.clone(),
            continuation: self.continuation_detector()?,
        })
    }
}

/// Sibling of `path` with `.tmp` appended to the file name.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Provider;

    #[test]
    fn test_router_config_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.server.port, 3456);
        assert_eq!(config.categories.len(), 4);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_parse_minimal_toml() {
        let config: RouterConfig = toml::from_str("[server]\nport = 9000").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert!(config.categories.contains_key("code"));
    }

    #[test]
    fn test_example_config_parses_and_validates() {
        let config: RouterConfig = toml::from_str(EXAMPLE_CONFIG).unwrap();
        assert!(config.validate().is_ok());
        for name in ["code", "reasoning", "conversation", "tools"] {
            assert!(config.categories.contains_key(name), "missing {name}");
        }
    }

    #[test]
    fn test_config_load_from_file() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            temp.path(),
            "[routing]\nmode = \"hybrid\"\ndefault_model = \"ollama:llama3\"",
        )
        .unwrap();

        let config = RouterConfig::load(Some(temp.path())).unwrap();
        assert_eq!(config.routing.mode, RoutingMode::Hybrid);
        assert_eq!(config.routing.default_model.provider, Provider::Ollama);
    }

    #[test]
    fn test_config_missing_file_error() {
        let result = RouterConfig::load(Some(Path::new("/nonexistent/router.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(temp.path(), "[server\nport = ").unwrap();
        let result = RouterConfig::load(Some(temp.path()));
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");

        let mut config = RouterConfig::default();
        config.categories.insert(
            "translation".to_string(),
            CategoryConfig {
                models: vec!["openai:gpt-4o-mini".parse().unwrap()],
                keywords: vec!["translate".to_string()],
                description: None,
            },
        );
        config.save(&path).unwrap();

        let loaded = RouterConfig::load(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_save_replaces_existing_file_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("router.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();

        let mut config = RouterConfig::default();
        config.server.port = 4567;
        config.save(&path).unwrap();

        assert_eq!(RouterConfig::load(Some(&path)).unwrap().server.port, 4567);
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("router.toml")]);
    }

    #[test]
    fn test_save_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("router.toml");

        assert!(matches!(
            RouterConfig::default().save(&path),
            Err(ConfigError::Io(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_config_env_overrides() {
        std::env::set_var("LLM_ROUTER_PORT", "9999");
        std::env::set_var("LLM_ROUTER_MODE", "remote_model");
        std::env::set_var("LLM_ROUTER_LOG_FORMAT", "json");
        let config = RouterConfig::default().with_env_overrides();
        std::env::remove_var("LLM_ROUTER_PORT");
        std::env::remove_var("LLM_ROUTER_MODE");
        std::env::remove_var("LLM_ROUTER_LOG_FORMAT");

        assert_eq!(config.server.port, 9999);
        assert_eq!(config.routing.mode, RoutingMode::RemoteModel);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = RouterConfig::default();
        config.server.port = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "server.port"
        ));
    }

    #[test]
    fn test_validate_rejects_zero_threshold() {
        let mut config = RouterConfig::default();
        config.circuit_breaker.failure_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_continuation_pattern() {
        let mut config = RouterConfig::default();
        config.routing.continuation.patterns = vec!["[".to_string()];
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation { field, .. }) if field == "routing.continuation.patterns"
        ));
    }

    #[test]
    fn test_routing_table_carries_mode_and_categories() {
        let mut config = RouterConfig::default();
        config.routing.mode = RoutingMode::Hybrid;
        let table = config.routing_table().unwrap();
        assert_eq!(table.mode, RoutingMode::Hybrid);
        assert_eq!(table.categories, config.categories);
    }
}
