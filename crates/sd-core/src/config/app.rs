//! Application configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;
use crate::store::PROFILES_FILENAME;

/// Default budget for a single connection test
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the profile store and connection lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where server profiles are stored
    pub profiles_path: PathBuf,

    /// Encrypt stored passwords with the machine key.
    ///
    /// `false` keeps passwords in plaintext and is only meant for profile
    /// files shared with older releases.
    pub encrypt_credentials: bool,

    /// Timeout handed to the connection tester, in seconds
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profiles_path: super::default_config_dir().join(PROFILES_FILENAME),
            encrypt_credentials: true,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl AppConfig {
    /// Reject values that parse but cannot work
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "connect_timeout must be at least 1 second".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.encrypt_credentials);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.profiles_path.ends_with("servers.json"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config: AppConfig = toml::from_str("connect_timeout = 0").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: AppConfig = toml::from_str("encrypt_credentials = false").unwrap();
        assert!(!config.encrypt_credentials);
        assert_eq!(config.connect_timeout, DEFAULT_CONNECT_TIMEOUT);
    }

    #[test]
    fn test_roundtrip_toml() {
        let config = AppConfig {
            profiles_path: PathBuf::from("/tmp/servers.json"),
            encrypt_credentials: true,
            connect_timeout: Duration::from_secs(3),
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("connect_timeout = 3"));
        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
