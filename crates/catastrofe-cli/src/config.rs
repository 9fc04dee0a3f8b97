//! Configuration files (`.catastrofe.toml`)
//!
//! Configuration files can be placed in:
//! - User home directory: `~/.catastrofe.toml` (user defaults)
//! - Project directory: `./.catastrofe.toml` (project defaults)
//!
//! Precedence order (highest to lowest):
//! 1. Command-line arguments
//! 2. Project config
//! 3. User config
//! 4. Built-in defaults

use anyhow::{Context, Result};
use catastrofe_core::{ExportOptions, SchemaVersion, SplitOptions, DEFAULT_DELIMITER};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of both the user and the project config
pub const CONFIG_FILE_NAME: &str = ".catastrofe.toml";

/// Contents of a config file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Defaults for the split command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitConfig>,

    /// Defaults for the export command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Maximum part size in KB
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_kb: Option<u64>,

    /// Tag-name suffix of record elements
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_suffix: Option<String>,

    /// Pretty-printing allowance per element, in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_node_overhead: Option<u64>,

    /// XML declaration allowance per part, in bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_overhead: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Projection schema (legacy or extended)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaVersion>,

    /// Drop records whose cadastral reference was already exported
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup: Option<bool>,

    /// Field separator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
}

impl SplitConfig {
    /// `self` with every value set in `other` replaced
    fn overlay(self, other: Self) -> Self {
        Self {
            max_size_kb: other.max_size_kb.or(self.max_size_kb),
            record_suffix: other.record_suffix.or(self.record_suffix),
            per_node_overhead: other.per_node_overhead.or(self.per_node_overhead),
            header_overhead: other.header_overhead.or(self.header_overhead),
        }
    }

    /// Split options from CLI values, falling back to this config
    pub fn resolve(&self, max_size_kb: Option<u64>, record_suffix: Option<String>) -> SplitOptions {
        let defaults = SplitOptions::default();
        let max_bytes = max_size_kb
            .or(self.max_size_kb)
            .map_or(defaults.max_bytes, |kb| kb.saturating_mul(1024));
        SplitOptions {
            max_bytes,
            record_suffix: record_suffix
                .or_else(|| self.record_suffix.clone())
                .unwrap_or(defaults.record_suffix),
            per_node_overhead: self.per_node_overhead.unwrap_or(defaults.per_node_overhead),
            header_overhead: self.header_overhead.unwrap_or(defaults.header_overhead),
        }
    }
}

impl ExportConfig {
    /// `self` with every value set in `other` replaced
    fn overlay(self, other: Self) -> Self {
        Self {
            schema: other.schema.or(self.schema),
            dedup: other.dedup.or(self.dedup),
            delimiter: other.delimiter.or(self.delimiter),
        }
    }

    /// Export options from CLI values, falling back to this config
    ///
    /// # Errors
    ///
    /// Fails if the delimiter is not a single-byte character.
    pub fn resolve(
        &self,
        schema: Option<SchemaVersion>,
        dedup: Option<bool>,
        delimiter: Option<char>,
    ) -> Result<ExportOptions> {
        let delimiter = match delimiter.or(self.delimiter) {
            Some(c) => u8::try_from(c)
                .ok()
                .filter(u8::is_ascii)
                .with_context(|| format!("Delimiter '{c}' must be a single ASCII character"))?,
            None => DEFAULT_DELIMITER,
        };
        Ok(ExportOptions {
            schema: schema.or(self.schema).unwrap_or_default(),
            dedup: dedup.or(self.dedup),
            delimiter,
        })
    }
}

impl Config {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            // TOML errors include line/column information, preserve it
            eprintln!(
                "{} Failed to parse config file: {}",
                "Error:".red().bold(),
                path.display()
            );
            eprintln!("{} {}", "Parse error:".yellow().bold(), e);
            eprintln!();
            eprintln!("{} Configuration file syntax:", "Help:".cyan().bold());
            eprintln!("  [split]");
            eprintln!("  max_size_kb = 450");
            eprintln!("  [export]");
            eprintln!("  schema = \"legacy\"  # legacy or extended");
            anyhow::anyhow!("Failed to parse config file: {e}")
        })
    }

    /// `~/.catastrofe.toml`, if a home directory is known
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
    }

    /// `./.catastrofe.toml`
    pub fn project_path() -> PathBuf {
        PathBuf::from(CONFIG_FILE_NAME)
    }

    /// Find and load configuration files
    /// Returns (`user_config`, `project_config`)
    pub fn discover_configs() -> (Option<Self>, Option<Self>) {
        let user_config = Self::user_path().and_then(|path| Self::load_optional(&path, "user"));
        let project_config = Self::load_optional(&Self::project_path(), "project");
        (user_config, project_config)
    }

    fn load_optional(path: &Path, scope: &str) -> Option<Self> {
        if !path.exists() {
            return None;
        }
        match Self::load_from_file(path) {
            Ok(config) => Some(config),
            Err(e) => {
                eprintln!(
                    "{} Failed to load {scope} config from {}: {}",
                    "Warning:".yellow().bold(),
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Merge multiple configs with precedence
    /// project config > user config > defaults
    pub fn merge(user_config: Option<Self>, project_config: Option<Self>) -> Self {
        let mut merged = Self::default();
        for config in [user_config, project_config].into_iter().flatten() {
            if let Some(split) = config.split {
                merged.split = Some(merged.split.unwrap_or_default().overlay(split));
            }
            if let Some(export) = config.export {
                merged.export = Some(merged.export.unwrap_or_default().overlay(export));
            }
        }
        merged
    }

    /// Effective split section
    pub fn split(&self) -> SplitConfig {
        self.split.clone().unwrap_or_default()
    }

    /// Effective export section
    pub fn export(&self) -> ExportConfig {
        self.export.clone().unwrap_or_default()
    }
}

/// Commented default config written by `config init`
pub const DEFAULT_CONFIG: &str = r#"# Catastrofe Configuration File

# Default settings for the split command
[split]
# Maximum size per part in KB
# max_size_kb = 450

# Tag-name suffix that marks record elements
# record_suffix = "DAT"

# Estimated pretty-printing bytes per element
# per_node_overhead = 4

# Bytes reserved per part for the XML declaration
# header_overhead = 100

# Default settings for the export command
[export]
# Projection schema: legacy (19 columns) or extended (28 columns)
# schema = "legacy"

# Drop repeated cadastral references (default: on for legacy, off for extended)
# dedup = true

# Field separator
# delimiter = ";"
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
            [split]
            max_size_kb = 300
            [export]
            schema = "extended"
            delimiter = ","
            "#,
        )
        .unwrap();

        assert_eq!(config.split().max_size_kb, Some(300));
        assert_eq!(config.export().schema, Some(SchemaVersion::Extended));
        assert_eq!(config.export().delimiter, Some(','));
        assert_eq!(config.export().dedup, None);
    }

    #[test]
    fn test_default_config_parses_empty() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.split(), SplitConfig::default());
        assert_eq!(config.export(), ExportConfig::default());
    }

    #[test]
    fn test_merge_precedence() {
        let user = Config {
            split: Some(SplitConfig {
                max_size_kb: Some(100),
                record_suffix: Some("REC".to_string()),
                ..SplitConfig::default()
            }),
            export: Some(ExportConfig {
                dedup: Some(false),
                ..ExportConfig::default()
            }),
        };
        let project = Config {
            split: Some(SplitConfig {
                max_size_kb: Some(200),
                ..SplitConfig::default()
            }),
            export: None,
        };

        let merged = Config::merge(Some(user), Some(project));
        assert_eq!(merged.split().max_size_kb, Some(200));
        assert_eq!(merged.split().record_suffix.as_deref(), Some("REC"));
        assert_eq!(merged.export().dedup, Some(false));
    }

    #[test]
    fn test_split_resolution() {
        let config = SplitConfig {
            max_size_kb: Some(100),
            header_overhead: Some(50),
            ..SplitConfig::default()
        };

        let from_config = config.resolve(None, None);
        assert_eq!(from_config.max_bytes, 100 * 1024);
        assert_eq!(from_config.record_suffix, "DAT");
        assert_eq!(from_config.header_overhead, 50);

        let from_cli = config.resolve(Some(10), Some("X".to_string()));
        assert_eq!(from_cli.max_bytes, 10 * 1024);
        assert_eq!(from_cli.record_suffix, "X");
    }

    #[test]
    fn test_export_resolution() {
        let config = ExportConfig {
            schema: Some(SchemaVersion::Extended),
            delimiter: Some('|'),
            ..ExportConfig::default()
        };

        let options = config.resolve(None, None, None).unwrap();
        assert_eq!(options.schema, SchemaVersion::Extended);
        assert_eq!(options.delimiter, b'|');
        assert!(!options.dedup_enabled());

        let options = config
            .resolve(Some(SchemaVersion::Legacy), Some(false), Some('\t'))
            .unwrap();
        assert_eq!(options.schema, SchemaVersion::Legacy);
        assert!(!options.dedup_enabled());
        assert_eq!(options.delimiter, b'\t');

        assert!(config.resolve(None, None, Some('€')).is_err());
    }
}
