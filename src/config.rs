//! Extraction settings loaded from `~/.config/rulegrid/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::table::RuleOptions;

/// Switches for the optional parts of extraction.
///
/// Geometry ratios are fixed and not part of the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Record page images as diagrams.
    pub capture_diagrams: bool,
    /// Derive atomic rule statements from tables.
    pub atomic_rules: bool,
    /// Treat `nan`/`none`/`null` cells as blank when generating rules.
    pub skip_null_literals: bool,
    /// Skip images whose payload exceeds this many bytes.
    pub max_diagram_bytes: Option<usize>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            capture_diagrams: true,
            atomic_rules: true,
            skip_null_literals: false,
            max_diagram_bytes: None,
        }
    }
}

impl ExtractionConfig {
    #[must_use]
    pub fn with_capture_diagrams(mut self, enabled: bool) -> Self {
        self.capture_diagrams = enabled;
        self
    }

    #[must_use]
    pub fn with_atomic_rules(mut self, enabled: bool) -> Self {
        self.atomic_rules = enabled;
        self
    }

    #[must_use]
    pub fn with_skip_null_literals(mut self, enabled: bool) -> Self {
        self.skip_null_literals = enabled;
        self
    }

    #[must_use]
    pub fn with_max_diagram_bytes(mut self, limit: Option<usize>) -> Self {
        self.max_diagram_bytes = limit;
        self
    }

    pub(crate) fn rule_options(&self) -> RuleOptions {
        RuleOptions {
            skip_null_literals: self.skip_null_literals,
        }
    }
}

/// Load the configuration from `~/.config/rulegrid/config.toml`.
///
/// Returns defaults if the file doesn't exist.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config() -> Result<ExtractionConfig> {
    let path = config_path();
    if !path.exists() {
        return Ok(ExtractionConfig::default());
    }
    load_config_from(&path)
}

/// Load the configuration from an explicit path.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid TOML.
pub fn load_config_from(path: &Path) -> Result<ExtractionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    toml::from_str(&content).with_context(|| format!("invalid TOML in {}", path.display()))
}

/// Return the path to the config file.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rulegrid")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let config: ExtractionConfig = toml::from_str("").unwrap();
        assert_eq!(config, ExtractionConfig::default());
        assert!(config.capture_diagrams);
        assert!(config.atomic_rules);
        assert!(!config.skip_null_literals);
        assert_eq!(config.max_diagram_bytes, None);
    }

    #[test]
    fn parse_partial_config() {
        let toml_str = r"
capture_diagrams = false
max_diagram_bytes = 1048576
";
        let config: ExtractionConfig = toml::from_str(toml_str).unwrap();
        assert!(!config.capture_diagrams);
        assert!(config.atomic_rules);
        assert_eq!(config.max_diagram_bytes, Some(1_048_576));
    }

    #[test]
    fn builder_sets_fields() {
        let config = ExtractionConfig::default()
            .with_atomic_rules(false)
            .with_skip_null_literals(true)
            .with_capture_diagrams(false)
            .with_max_diagram_bytes(Some(10));
        assert!(!config.atomic_rules);
        assert!(config.rule_options().skip_null_literals);
        assert!(!config.capture_diagrams);
        assert_eq!(config.max_diagram_bytes, Some(10));
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("rulegrid-config-{}.toml", std::process::id()));
        std::fs::write(&path, "skip_null_literals = true\n").unwrap();
        let config = load_config_from(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(config.skip_null_literals);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let path = std::env::temp_dir().join(format!("rulegrid-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "atomic_rules = \"maybe\"\n").unwrap();
        let err = load_config_from(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(err.to_string().contains("invalid TOML"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = load_config_from(Path::new("/nonexistent/rulegrid.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
