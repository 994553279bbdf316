//! Manager configuration

use std::path::Path;

use ams_core::AmsType;
use ams_happy_hare::HappyHareConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

/// AMS configuration, usually the `[ams]` table of a larger file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmsConfig {
    /// Force a backend instead of detecting one; `none` disables AMS support
    pub backend: Option<AmsType>,
    pub happy_hare: HappyHareConfig,
}

impl AmsConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config() {
        let config = AmsConfig::from_toml("").expect("empty config");
        assert_eq!(config, AmsConfig::default());
        assert_eq!(config.backend, None);
    }

    #[test]
    fn test_forced_backend() {
        let config = AmsConfig::from_toml(
            r#"
            backend = "happy_hare"

            [happy_hare]
            hardware_bypass_sensor = true
            "#,
        )
        .expect("config");
        assert_eq!(config.backend, Some(AmsType::HappyHare));
        assert!(config.happy_hare.hardware_bypass_sensor);
    }

    #[test]
    fn test_backend_aliases() {
        for (name, expected) in [
            ("mmu", AmsType::HappyHare),
            ("toolchanger", AmsType::ToolChanger),
            ("ace", AmsType::ValgAce),
            ("none", AmsType::None),
        ] {
            let config = AmsConfig::from_toml(&format!("backend = \"{}\"", name)).expect(name);
            assert_eq!(config.backend, Some(expected));
        }
    }

    #[test]
    fn test_unknown_backend_rejected() {
        assert!(matches!(
            AmsConfig::from_toml(r#"backend = "prusa_mmu""#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "backend = \"tool_changer\"").expect("write");
        let config = AmsConfig::from_toml_file(file.path()).expect("load");
        assert_eq!(config.backend, Some(AmsType::ToolChanger));

        assert!(matches!(
            AmsConfig::from_toml_file("/nonexistent/ams.toml"),
            Err(ConfigError::Io(_))
        ));
    }
}
