use crate::convert::{Converter, DEFAULT_MAX_FILE_SIZE};
use crate::structurer::{Structurer, StructurerConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Heading detection thresholds
    #[serde(default)]
    pub structure: StructurerConfig,

    #[serde(default)]
    pub convert: ConvertConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Largest accepted input in bytes (default: 20 MiB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Directory for converted files; stdout is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            output_dir: None,
        }
    }
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Config {
    /// Get the XDG-style config file path (~/.config/smartnote/config.toml)
    #[cfg(target_os = "macos")]
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("smartnote").join("config.toml"))
    }

    /// Platform config file path, e.g. ~/.config/smartnote/config.toml on Linux
    pub fn config_path() -> Option<PathBuf> {
        #[cfg(target_os = "macos")]
        if let Some(xdg_path) = Self::xdg_config_path() {
            if xdg_path.exists() {
                return Some(xdg_path);
            }
        }

        dirs::config_dir().map(|p| p.join("smartnote").join("config.toml"))
    }

    /// Load the user config with environment overrides applied.
    ///
    /// A missing file means defaults. An unreadable or invalid file is
    /// reported as a warning and also falls back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::read_file(&path).unwrap_or_else(|e| {
                log::warn!("{}; using defaults", e);
                Self::default()
            }),
            _ => Self::default(),
        };
        config.apply_env_overrides();
        config
    }

    /// Load an explicitly named config file. Errors are returned, not masked.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Apply `SMARTNOTE_OUTPUT_DIR` and `SMARTNOTE_MAX_FILE_SIZE`.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup("SMARTNOTE_OUTPUT_DIR").filter(|d| !d.is_empty()) {
            self.convert.output_dir = Some(PathBuf::from(dir));
        }

        if let Some(size) = lookup("SMARTNOTE_MAX_FILE_SIZE") {
            match size.trim().parse() {
                Ok(size) => self.convert.max_file_size = size,
                Err(_) => log::warn!("Ignoring SMARTNOTE_MAX_FILE_SIZE={:?}: not a byte count", size),
            }
        }
    }

    pub fn structurer(&self) -> Structurer {
        Structurer::new(self.structure.clone())
    }

    pub fn converter(&self) -> Converter {
        Converter::new(self.structurer()).with_max_file_size(self.convert.max_file_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.convert.max_file_size, 20_971_520);
        assert_eq!(config.structure.max_heading_words, 8);
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::from_toml(
            r#"
[structure]
max_heading_words = 5

[convert]
output_dir = "out"
"#,
        )
        .unwrap();

        assert_eq!(config.structure.max_heading_words, 5);
        assert_eq!(config.structure.max_heading_chars, 100);
        assert_eq!(config.convert.output_dir, Some(PathBuf::from("out")));
        assert_eq!(config.convert.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let err = Config::from_toml("[convert]\nmax_file_size = \"big\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_toml_roundtrip_omits_unset_output_dir() {
        let toml = Config::default().to_toml().unwrap();
        assert!(toml.contains("max_file_size = 20971520"));
        assert!(!toml.contains("output_dir"));
        assert_eq!(Config::from_toml(&toml).unwrap(), Config::default());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("SMARTNOTE_OUTPUT_DIR", "/tmp/notes"),
            ("SMARTNOTE_MAX_FILE_SIZE", "1024"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(config.convert.output_dir, Some(PathBuf::from("/tmp/notes")));
        assert_eq!(config.convert.max_file_size, 1024);
    }

    #[test]
    fn test_bad_size_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| {
            (key == "SMARTNOTE_MAX_FILE_SIZE").then(|| "lots".to_string())
        });
        assert_eq!(config.convert.max_file_size, DEFAULT_MAX_FILE_SIZE);
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("nope.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_converter_uses_settings() {
        let mut config = Config::default();
        config.convert.max_file_size = 10;
        config.structure.max_heading_words = 1;

        let converter = config.converter();
        assert_eq!(converter.max_file_size(), 10);
        let conversion = converter
            .convert_bytes(crate::convert::SourceFormat::Text, b"TWO WORDS")
            .unwrap();
        assert_eq!(conversion.markdown, "TWO WORDS\n");
    }
}
