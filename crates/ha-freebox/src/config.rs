//! Freebox integration configuration
//!
//! Read from the `freebox:` section of a YAML document:
//!
//! ```yaml
//! freebox:
//!   host: mafreebox.freebox.fr
//!   port: 443
//!   mac: "68:A3:78:00:00:01"
//!   scan_interval: 30
//! ```

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::{FreeboxError, FreeboxResult};
use crate::DOMAIN;

/// Connection settings of one Freebox
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeboxConfig {
    /// Host name or address of the gateway
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTPS port of the gateway API
    #[serde(default = "default_port")]
    pub port: u16,

    /// MAC address of the gateway, used to build unique IDs
    pub mac: String,

    /// Seconds between two refreshes of the home nodes
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
}

fn default_host() -> String {
    "mafreebox.freebox.fr".to_string()
}

fn default_port() -> u16 {
    443
}

fn default_scan_interval() -> u64 {
    30
}

impl FreeboxConfig {
    /// Create a config with default connection settings
    pub fn new(mac: impl Into<String>) -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            mac: mac.into(),
            scan_interval: default_scan_interval(),
        }
    }

    /// Load the configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> FreeboxResult<Self> {
        let path = path.as_ref();
        debug!("Loading Freebox configuration: {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| FreeboxError::ReadConfig {
            path: path.to_path_buf(),
            source: e,
        })?;
        let yaml: Value = serde_yaml::from_str(&content).map_err(|e| FreeboxError::ParseYaml {
            path: path.to_path_buf(),
            source: e,
        })?;

        Self::from_yaml(&yaml)
    }

    /// Parse the configuration from an already loaded YAML document
    pub fn from_yaml(yaml: &Value) -> FreeboxResult<Self> {
        let mapping = yaml.as_mapping().ok_or_else(|| FreeboxError::InvalidConfig {
            key: "root".to_string(),
            reason: "configuration must be a mapping".to_string(),
        })?;

        let section = mapping
            .get(&Value::String(DOMAIN.to_string()))
            .cloned()
            .ok_or_else(|| FreeboxError::InvalidConfig {
                key: DOMAIN.to_string(),
                reason: "section is missing".to_string(),
            })?;

        let config: FreeboxConfig =
            serde_yaml::from_value(section).map_err(|e| FreeboxError::InvalidConfig {
                key: DOMAIN.to_string(),
                reason: e.to_string(),
            })?;

        config.validate()
    }

    fn validate(self) -> FreeboxResult<Self> {
        if self.host.trim().is_empty() {
            return Err(FreeboxError::InvalidConfig {
                key: "host".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if self.mac.trim().is_empty() {
            return Err(FreeboxError::InvalidConfig {
                key: "mac".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }
        if self.scan_interval == 0 {
            return Err(FreeboxError::InvalidConfig {
                key: "scan_interval".to_string(),
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(self)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_with_defaults() {
        let yaml: Value = serde_yaml::from_str(
            r#"
freebox:
  mac: "68:A3:78:00:00:01"
"#,
        )
        .unwrap();

        let config = FreeboxConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.host, "mafreebox.freebox.fr");
        assert_eq!(config.port, 443);
        assert_eq!(config.scan_interval(), Duration::from_secs(30));
        assert_eq!(config, FreeboxConfig::new("68:A3:78:00:00:01"));
    }

    #[test]
    fn test_parse_full_section() {
        let yaml: Value = serde_yaml::from_str(
            r#"
homeassistant:
  name: Home
freebox:
  host: 192.168.1.254
  port: 8443
  mac: "68:A3:78:00:00:01"
  scan_interval: 10
"#,
        )
        .unwrap();

        let config = FreeboxConfig::from_yaml(&yaml).unwrap();
        assert_eq!(config.host, "192.168.1.254");
        assert_eq!(config.port, 8443);
        assert_eq!(config.scan_interval(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_section() {
        let yaml: Value = serde_yaml::from_str("homeassistant: {}").unwrap();
        let err = FreeboxConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FreeboxError::InvalidConfig { key, .. } if key == "freebox"));
    }

    #[test]
    fn test_missing_mac() {
        let yaml: Value = serde_yaml::from_str("freebox:\n  host: box.local\n").unwrap();
        assert!(matches!(
            FreeboxConfig::from_yaml(&yaml),
            Err(FreeboxError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_zero_scan_interval() {
        let yaml: Value =
            serde_yaml::from_str("freebox:\n  mac: \"aa\"\n  scan_interval: 0\n").unwrap();
        let err = FreeboxConfig::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, FreeboxError::InvalidConfig { key, .. } if key == "scan_interval"));
    }

    #[test]
    fn test_root_must_be_mapping() {
        let yaml: Value = serde_yaml::from_str("- freebox").unwrap();
        assert!(FreeboxConfig::from_yaml(&yaml).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "freebox:\n  mac: \"68:A3:78:00:00:01\"\n  port: 80").unwrap();

        let config = FreeboxConfig::load(file.path()).unwrap();
        assert_eq!(config.port, 80);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FreeboxConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, FreeboxError::ReadConfig { .. }));
    }
}
