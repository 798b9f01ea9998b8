//! Configuration gate: a flat options bag plus the ambient project
//! settings the CLI loads from a TOML file, mirroring the
//! `config::Config` / `toml` + `serde` pattern.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

fn default_true() -> bool {
    true
}

/// Options recognized by the inference engine itself. Everything else in
/// [`ProjectConfig`] is ambient CLI/reporting configuration the engine
/// never reads directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub enabled: bool,
    pub warnings: bool,
    #[serde(rename = "strict-ingest")]
    pub strict_ingest: bool,
    #[serde(rename = "no-index")]
    pub no_index: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warnings: true,
            strict_ingest: false,
            no_index: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Json,
    Github,
}

impl Default for OutputFormat {
    fn default() -> Self {
        OutputFormat::Text
    }
}

/// Ambient CLI-facing configuration, under a well-known `[df-column-lint]`
/// table in a project's TOML file. The engine config nests under it; paths
/// to scan and output shape are CLI concerns the core never touches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub engine: EngineConfig,
    pub paths: Vec<PathBuf>,
    pub exclude: Vec<String>,
    pub output_format: OutputFormat,
    #[serde(default = "default_true")]
    pub color: bool,
    pub strict: bool,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            paths: Vec::new(),
            exclude: Vec::new(),
            output_format: OutputFormat::default(),
            color: true,
            strict: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path}: failed to read config: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: invalid TOML: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ProjectConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ProjectConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.exclude {
            if pattern.is_empty() {
                return Err(ConfigError::Invalid("exclude patterns must not be empty".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_spec() {
        let c = EngineConfig::default();
        assert!(c.enabled);
        assert!(c.warnings);
        assert!(!c.strict_ingest);
        assert!(!c.no_index);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let text = "[engine]\nstrict-ingest = true\n";
        let config: ProjectConfig = toml::from_str(text).unwrap();
        assert!(config.engine.strict_ingest);
        assert!(config.engine.enabled);
    }

    #[test]
    fn rejects_empty_exclude_pattern() {
        let mut config = ProjectConfig::default();
        config.exclude.push(String::new());
        assert!(config.validate().is_err());
    }
}
