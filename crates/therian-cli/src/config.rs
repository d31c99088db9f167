//! Configuration management for the CLI
//!
//! Configuration is assembled from, in increasing precedence:
//! - Default values
//! - A configuration file (TOML, YAML or JSON)
//! - `THERIAN_*` environment variables
//! - Command-line arguments
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use therian_core::{Caching, EngineConfig};
use tracing::debug;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Engine settings
    pub engine: EngineConfig,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Logging section of the configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level or filter directive, used when no -v flag is given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Log format (compact, full, json)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    /// Log file path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Include thread IDs
    pub thread_ids: bool,
}

/// Output section of the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Use colored output by default
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { color: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Toml,
    Yaml,
    Json,
}

impl FileFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        }
    }

    fn name(self) -> &'static str {
        match self {
            FileFormat::Toml => "TOML",
            FileFormat::Yaml => "YAML",
            FileFormat::Json => "JSON",
        }
    }
}

impl Config {
    /// Load configuration from a file, picking the format from its extension
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let format = FileFormat::of(path);
        let invalid = || Error::InvalidFormat {
            path: path.to_path_buf(),
            expected: format.name().to_string(),
        };

        let config = match format {
            FileFormat::Toml => toml::from_str(&content).map_err(|e| {
                debug!("TOML parse error: {}", e);
                invalid()
            })?,
            FileFormat::Yaml => serde_yaml::from_str(&content).map_err(|e| {
                debug!("YAML parse error: {}", e);
                invalid()
            })?,
            FileFormat::Json => serde_json::from_str(&content).map_err(|e| {
                debug!("JSON parse error: {}", e);
                invalid()
            })?,
        };

        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => return Ok(config),
                    Err(e) => eprintln!("Warning: failed to load config from {}: {}", path.display(), e),
                }
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations,
    /// then apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.merge_with_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// The user-level configuration file
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("therian").join("config.toml"))
    }

    /// Default configuration file paths to check, in order
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from(".therian.toml"),
            PathBuf::from(".therian.yaml"),
            PathBuf::from(".therian.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            let therian_dir = config_dir.join("therian");
            paths.push(therian_dir.join("config.toml"));
            paths.push(therian_dir.join("config.yaml"));
            paths.push(therian_dir.join("config.json"));
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".therian.toml"));
        }

        paths
    }

    /// Apply `THERIAN_CACHING` and `THERIAN_STANDARD_OPERATORS` overrides
    pub fn merge_with_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(caching) = lookup("THERIAN_CACHING") {
            self.engine.caching = parse_caching(&caching)?;
        }
        if let Some(standard) = lookup("THERIAN_STANDARD_OPERATORS") {
            self.engine.standard_operators = match standard.to_lowercase().as_str() {
                "true" | "1" | "yes" => true,
                "false" | "0" | "no" => false,
                other => {
                    return Err(Error::config(format!(
                        "THERIAN_STANDARD_OPERATORS must be a boolean, got '{}'",
                        other
                    )))
                }
            };
        }
        Ok(())
    }

    /// Serialize to the given format
    pub fn to_string_as(&self, format: crate::cli::ConfigFormat) -> Result<String> {
        use crate::cli::ConfigFormat;
        match format {
            ConfigFormat::Toml => toml::to_string_pretty(self)
                .map_err(|e| Error::config(format!("Failed to serialize as TOML: {}", e))),
            ConfigFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            ConfigFormat::Yaml => Ok(serde_yaml::to_string(self)?),
        }
    }

    /// Save configuration to a file, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        use crate::cli::ConfigFormat;
        let format = match FileFormat::of(path) {
            FileFormat::Toml => ConfigFormat::Toml,
            FileFormat::Yaml => ConfigFormat::Yaml,
            FileFormat::Json => ConfigFormat::Json,
        };
        let content = self.to_string_as(format)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

fn parse_caching(value: &str) -> Result<Caching> {
    match value.to_lowercase().as_str() {
        "none" => Ok(Caching::None),
        "context" => Ok(Caching::Context),
        "engine" => Ok(Caching::Engine),
        "all" => Ok(Caching::All),
        other => Err(Error::config(format!(
            "unknown caching level '{}' (expected none, context, engine or all)",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.caching, Caching::All);
        assert!(config.engine.standard_operators);
        assert!(config.output.color);
        assert!(config.logging.level.is_none());
    }

    #[test]
    fn test_load_toml_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[engine]\ncaching = \"context\"\n\n[logging]\nlevel = \"debug\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.engine.caching, Caching::Context);
        assert!(config.engine.standard_operators);
        assert_eq!(config.logging.level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_load_yaml_and_json_files() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, "engine:\n  caching: none\n").unwrap();
        assert_eq!(Config::from_file(&yaml).unwrap().engine.caching, Caching::None);

        let json = dir.path().join("config.json");
        std::fs::write(&json, r#"{"output": {"color": false}}"#).unwrap();
        assert!(!Config::from_file(&json).unwrap().output.color);
    }

    #[test]
    fn test_invalid_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[engine\ncaching = ").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(Error::InvalidFormat { .. })
        ));
        assert!(matches!(
            Config::from_file(&dir.path().join("absent.toml")),
            Err(Error::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.engine.caching = Caching::Engine;
        config.logging.format = Some("json".to_string());

        config.save(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), config);
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("THERIAN_CACHING", "None"),
            ("THERIAN_STANDARD_OPERATORS", "0"),
        ]
        .into_iter()
        .collect();
        let mut config = Config::default();
        config
            .merge_with_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.engine.caching, Caching::None);
        assert!(!config.engine.standard_operators);

        let mut config = Config::default();
        let err = config
            .merge_with_env(|key| (key == "THERIAN_CACHING").then(|| "sometimes".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("sometimes"));
    }
}
