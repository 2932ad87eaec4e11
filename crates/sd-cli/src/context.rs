//! Application context
//!
//! Builds the configuration, the credential cipher and the profile store
//! once per invocation and hands them to the commands.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::RwLock;

use sd_core::config::{self, AppConfig};
use sd_core::{MachineCipher, ProfileStore};

/// Everything a command needs
pub struct AppContext {
    /// Path the configuration was loaded from (it may not exist)
    pub config_path: PathBuf,
    pub config: AppConfig,
    pub store: Arc<RwLock<ProfileStore>>,
}

impl AppContext {
    /// Load the config at `config_path` (or the default location) and open
    /// the profile store it points to
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config::default_config_path);

        let config = config::load_or_default(&config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?;

        let store = if config.encrypt_credentials {
            let cipher = MachineCipher::new().context("Failed to derive credential key")?;
            ProfileStore::open(&config.profiles_path, Arc::new(cipher))
        } else {
            ProfileStore::open_plaintext(&config.profiles_path)
        };

        Ok(Self {
            config_path,
            config,
            store: Arc::new(RwLock::new(store)),
        })
    }
}
