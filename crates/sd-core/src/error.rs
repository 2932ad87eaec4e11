//! Core error types for serverdeck

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the serverdeck libraries
#[derive(Error, Debug)]
pub enum SdError {
    /// Profile store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Credential cipher error
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Profile store errors
///
/// These are input errors reported straight back to the caller; none of
/// them leave a partially written profile behind.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A profile field failed validation
    #[error("Invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field
        field: &'static str,
        /// What was wrong with it
        reason: String,
    },

    /// Another profile already uses this name
    #[error("A server named '{0}' already exists")]
    DuplicateName(String),

    /// No profile with this name
    #[error("Server '{0}' not found")]
    NotFound(String),

    /// The secret could not be encrypted
    #[error("Credential error: {0}")]
    Cipher(#[from] CipherError),

    /// Writing the profile file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the profile file failed
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        StoreError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Credential cipher errors
#[derive(Error, Debug)]
pub enum CipherError {
    /// The envelope is malformed, truncated, tampered with, or was sealed
    /// under a different key
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Sealing the plaintext failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// The key could not be derived
    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),

    /// The cipher cannot be used on this host
    #[error("Credential encryption is not available on this system")]
    Unavailable,
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
