//! sd-core: Server profiles and credential storage for serverdeck
//!
//! This crate provides the profile types, the credential cipher that
//! protects stored passwords, the on-disk profile store, and the
//! application configuration shared by the lifecycle and CLI crates.

pub mod cipher;
pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use cipher::{CredentialCipher, MachineCipher, MachineIdentity};
pub use error::{CipherError, ConfigError, SdError, StoreError};
pub use store::ProfileStore;
pub use types::{Scheme, ServerProfile, ServerSpec};
