//! Configuration loading from YAML, TOML, and JSON files.

use std::path::Path;

use super::{ConfigError, SiroccoConfig};

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFormat {
    /// YAML format (.yaml, .yml)
    #[default]
    Yaml,
    /// TOML format (.toml)
    Toml,
    /// JSON format (.json)
    Json,
}

impl ConfigFormat {
    /// Detects the format from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_lowercase().as_str() {
                "yaml" | "yml" => Some(Self::Yaml),
                "toml" => Some(Self::Toml),
                "json" => Some(Self::Json),
                _ => None,
            })
    }
}

/// Loads, env-overrides, and validates a configuration file.
///
/// # Errors
///
/// Returns a `ConfigError` if the file cannot be read, the extension is
/// unsupported, parsing fails, or validation fails.
pub fn load_config(path: &Path) -> Result<SiroccoConfig, ConfigError> {
    let format = ConfigFormat::from_path(path)
        .ok_or_else(|| ConfigError::UnsupportedFormat(path.display().to_string()))?;
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut config = load_config_str(&raw, format)?;
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Parses configuration from a string in the given format.
///
/// # Errors
///
/// Returns `ConfigError::Parse` if deserialization fails.
pub fn load_config_str(raw: &str, format: ConfigFormat) -> Result<SiroccoConfig, ConfigError> {
    match format {
        ConfigFormat::Yaml => {
            serde_yaml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
        }
        ConfigFormat::Toml => toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string())),
        ConfigFormat::Json => {
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use rust_decimal_macros::dec;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.yaml")),
            Some(ConfigFormat::Yaml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.toml")),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("config.json")),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_path(Path::new("config.ini")), None);
    }

    #[test]
    fn test_load_yaml() {
        let yaml = r#"
mode: backtest
engine:
  queue_capacity: 5000
account:
  account_id: bt-1
  initial_capital: 1000000
portfolio:
  default_position_size: 10000
"#;
        let config = load_config_str(yaml, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.mode, Mode::Backtest);
        assert_eq!(config.engine.queue_capacity, 5000);
        assert_eq!(config.account.account_id, "bt-1");
        assert_eq!(config.portfolio.default_position_size, dec!(10000));
        // Unspecified fields fall back to defaults
        assert_eq!(config.engine.timeout_ms, 5000);
    }

    #[test]
    fn test_load_toml() {
        let raw = r#"
mode = "live"

[execution]
type = "live"

[execution.broker]
url = "https://broker.example"
account = "acct-1"
"#;
        let config = load_config_str(raw, ConfigFormat::Toml).unwrap();
        assert_eq!(config.mode, Mode::Live);
        assert!(config.execution.broker.is_some());
    }

    #[test]
    fn test_unknown_keys_preserved_for_warning() {
        let yaml = "mode: backtest\nfuture_feature: true\n";
        let config = load_config_str(yaml, ConfigFormat::Yaml).unwrap();
        assert!(config.unknown.contains_key("future_feature"));
        // validate() only warns about unknown keys
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_error_surfaces() {
        let result = load_config_str("mode: [unclosed", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
