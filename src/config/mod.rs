//! Configuration System for fuzznum
//!
//! Provides a flexible configuration system supporting:
//! - TOML configuration files
//! - Environment variable overrides
//! - Per-section defaults suitable for library embedding
//!
//! # Configuration File Locations
//!
//! Configuration files are searched in order (first found wins):
//! 1. `./fuzznum.toml` - Project-local configuration
//! 2. `~/.config/fuzznum/config.toml` - User configuration (XDG)
//!
//! # Environment Variables
//!
//! - `FUZZNUM_TOLERANCE` - tolerance for exact algebraic identities
//! - `FUZZNUM_VERIFY_NORMS` - run self-verification at norm construction (true/false)
//! - `FUZZNUM_RESULT_CACHE` - executor result cache capacity
//! - `FUZZNUM_METRIC_CACHE` - template metric cache capacity
//!
//! # Example Configuration
//!
//! ```toml
//! # fuzznum.toml
//!
//! [norms]
//! tolerance = 1e-12
//! identity_tolerance = 1e-6
//! verify_on_build = true
//!
//! [executor]
//! result_cache_size = 1024
//! enable_result_cache = true
//! enable_instance_cache = true
//!
//! [template]
//! metric_cache_size = 8
//! ```

use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::norms::VerifyOptions;

// ============================================================================
// Configuration Schema
// ============================================================================

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct FuzzConfig {
    /// T-norm engine settings
    pub norms: NormsConfig,
    /// Executor cache settings
    pub executor: ExecutorConfigSection,
    /// Template cache settings
    pub template: TemplateConfigSection,
}

/// T-norm engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NormsConfig {
    /// Tolerance for exact algebraic identities
    pub tolerance: f64,
    /// Looser tolerance for generator round-trips
    pub identity_tolerance: f64,
    /// Run self-verification when a norm bundle is constructed
    pub verify_on_build: bool,
}

impl Default for NormsConfig {
    fn default() -> Self {
        NormsConfig {
            tolerance: 1e-12,
            identity_tolerance: 1e-6,
            verify_on_build: true,
        }
    }
}

impl NormsConfig {
    /// Convert into the norm engine's verification options
    pub fn verify_options(&self) -> VerifyOptions {
        VerifyOptions {
            enabled: self.verify_on_build,
            tolerance: self.tolerance,
            identity_tolerance: self.identity_tolerance,
        }
    }
}

/// Executor cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutorConfigSection {
    /// Capacity of the operation result cache
    pub result_cache_size: usize,
    /// Serve repeated operations from the result cache
    pub enable_result_cache: bool,
    /// Cache instance construction when wrapping results
    pub enable_instance_cache: bool,
}

impl Default for ExecutorConfigSection {
    fn default() -> Self {
        ExecutorConfigSection {
            result_cache_size: 1024,
            enable_result_cache: true,
            enable_instance_cache: true,
        }
    }
}

/// Template cache settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TemplateConfigSection {
    /// Capacity of each template's metric cache
    pub metric_cache_size: usize,
}

impl Default for TemplateConfigSection {
    fn default() -> Self {
        TemplateConfigSection {
            metric_cache_size: 8,
        }
    }
}

// ============================================================================
// Loading
// ============================================================================

impl FuzzConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the standard locations, falling back to defaults,
    /// then apply environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        for path in Self::search_paths() {
            if path.exists() {
                config = Self::from_file(&path)?;
                break;
            }
        }
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.clone(), e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(path.clone(), e.to_string()))
    }

    /// Parse from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content)
            .map_err(|e| ConfigError::ParseError(PathBuf::from("<string>"), e.to_string()))
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError(e.to_string()))
    }

    /// Apply `FUZZNUM_*` environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = env::var("FUZZNUM_TOLERANCE") {
            if let Ok(parsed) = value.parse::<f64>() {
                self.norms.tolerance = parsed;
            }
        }
        if let Ok(value) = env::var("FUZZNUM_VERIFY_NORMS") {
            if let Ok(parsed) = value.parse::<bool>() {
                self.norms.verify_on_build = parsed;
            }
        }
        if let Ok(value) = env::var("FUZZNUM_RESULT_CACHE") {
            if let Ok(parsed) = value.parse::<usize>() {
                self.executor.result_cache_size = parsed;
            }
        }
        if let Ok(value) = env::var("FUZZNUM_METRIC_CACHE") {
            if let Ok(parsed) = value.parse::<usize>() {
                self.template.metric_cache_size = parsed;
            }
        }
    }

    fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("./fuzznum.toml")];
        if let Ok(home) = env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config/fuzznum/config.toml"));
        }
        paths
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Configuration errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading/writing config file
    #[error("IO error reading {}: {}", .0.display(), .1)]
    IoError(PathBuf, String),
    /// Parse error in config file
    #[error("Parse error in {}: {}", .0.display(), .1)]
    ParseError(PathBuf, String),
    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializeError(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FuzzConfig::new();
        assert_eq!(config.norms.tolerance, 1e-12);
        assert!(config.norms.verify_on_build);
        assert_eq!(config.executor.result_cache_size, 1024);
        assert_eq!(config.template.metric_cache_size, 8);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [norms]
            tolerance = 1e-10
            verify_on_build = false

            [executor]
            result_cache_size = 64
        "#;
        let config = FuzzConfig::from_toml_str(toml).unwrap();
        assert_eq!(config.norms.tolerance, 1e-10);
        assert!(!config.norms.verify_on_build);
        assert_eq!(config.executor.result_cache_size, 64);
        // untouched sections keep their defaults
        assert!(config.executor.enable_result_cache);
        assert_eq!(config.template.metric_cache_size, 8);
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let err = FuzzConfig::from_toml_str("norms = 3").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_, _)));
    }

    #[test]
    fn test_roundtrip_through_toml() {
        let config = FuzzConfig::new();
        let serialized = config.to_toml_string().unwrap();
        let parsed = FuzzConfig::from_toml_str(&serialized).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_verify_options_mapping() {
        let mut config = FuzzConfig::new();
        config.norms.verify_on_build = false;
        config.norms.tolerance = 1e-9;
        let options = config.norms.verify_options();
        assert!(!options.enabled);
        assert_eq!(options.tolerance, 1e-9);
    }
}
