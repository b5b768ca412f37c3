//! Engine configuration
//!
//! Loaded from TOML:
//!
//! ```toml
//! read_timeout_ms = 5000
//!
//! [service_group]
//! allow_not_found = false
//! exact_match = false
//! ```

use std::path::Path;
use std::time::Duration;

use devmeta_core::{RegistryError, RegistryResult};
use serde::{Deserialize, Serialize};

/// Configuration for the matching engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for a single store read, in milliseconds
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Service group narrowing behaviour
    #[serde(default)]
    pub service_group: ServiceGroupConfig,
}

fn default_read_timeout_ms() -> u64 {
    5000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: default_read_timeout_ms(),
            service_group: ServiceGroupConfig::default(),
        }
    }
}

/// How service group modifiers narrow device types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceGroupConfig {
    /// Unknown service group keys synthesize a pass-through group named
    /// after the key instead of failing
    #[serde(default)]
    pub allow_not_found: bool,
    /// Drop ungrouped services from narrowed variants
    #[serde(default)]
    pub exact_match: bool,
}

impl EngineConfig {
    /// Parse a TOML configuration
    pub fn from_toml(content: &str) -> RegistryResult<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| RegistryError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> RegistryResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| RegistryError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    /// Store read timeout
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> RegistryResult<()> {
        if self.read_timeout_ms == 0 {
            return Err(RegistryError::Config(
                "read_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_from_empty_document() {
        let config = EngineConfig::from_toml("").unwrap();
        assert_eq!(config.read_timeout(), Duration::from_secs(5));
        assert!(!config.service_group.allow_not_found);
        assert!(!config.service_group.exact_match);
    }

    #[test]
    fn parse_service_group_section() {
        let config = EngineConfig::from_toml(
            r#"
read_timeout_ms = 250

[service_group]
allow_not_found = true
"#,
        )
        .unwrap();
        assert_eq!(config.read_timeout_ms, 250);
        assert!(config.service_group.allow_not_found);
        assert!(!config.service_group.exact_match);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = EngineConfig::from_toml("read_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[service_group]\nexact_match = true").unwrap();
        let config = EngineConfig::from_file(file.path()).unwrap();
        assert!(config.service_group.exact_match);
    }

    #[test]
    fn missing_file_is_config_error() {
        let err = EngineConfig::from_file("/nonexistent/devmeta.toml").unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
    }
}
