//! Server profile store
//!
//! Profiles live in a single JSON file (`{ "servers": [...] }`) that is read
//! once when the store is opened and rewritten in full after every change.
//! The store assumes it is the only writer of that file.
//!
//! Passwords are sealed with the configured [`CredentialCipher`] before they
//! touch disk and are only ever handed back through
//! [`ProfileStore::get_decrypted_secret`]. A store opened without a cipher
//! keeps passwords as given; that mode exists for profile files written
//! before encryption was introduced and must be chosen explicitly.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cipher::CredentialCipher;
use crate::error::StoreError;
use crate::types::ServerProfile;

/// Default profile file name inside the config directory
pub const PROFILES_FILENAME: &str = "servers.json";

/// On-disk shape of the profile file
#[derive(Debug, Deserialize)]
struct ProfileFile {
    servers: Vec<ServerProfile>,
}

/// Owns every server profile and their stored secrets
pub struct ProfileStore {
    path: PathBuf,
    servers: Vec<ServerProfile>,
    cipher: Option<Arc<dyn CredentialCipher>>,
}

impl ProfileStore {
    /// Open the store at `path`, encrypting secrets with `cipher`
    ///
    /// Never fails: a missing, unreadable or malformed file yields an
    /// empty store.
    pub fn open(path: impl Into<PathBuf>, cipher: Arc<dyn CredentialCipher>) -> Self {
        Self::load(path.into(), Some(cipher))
    }

    /// Open the store at `path` without encryption
    ///
    /// Secrets are written to disk exactly as supplied.
    pub fn open_plaintext(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        tracing::warn!(
            "Profile store {:?} opened without credential encryption; passwords are stored in plaintext",
            path
        );
        Self::load(path, None)
    }

    fn load(path: PathBuf, cipher: Option<Arc<dyn CredentialCipher>>) -> Self {
        let servers = read_profile_file(&path);
        tracing::debug!("Loaded {} server profile(s) from {:?}", servers.len(), path);
        Self {
            path,
            servers,
            cipher,
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored profiles
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Check if a profile with this exact name exists
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All profiles in stored order, passwords redacted
    pub fn list_profiles(&self) -> Vec<ServerProfile> {
        self.servers.iter().map(ServerProfile::redacted).collect()
    }

    /// One profile by name, password redacted
    pub fn get_profile(&self, name: &str) -> Option<ServerProfile> {
        self.servers
            .iter()
            .find(|s| s.name == name)
            .map(ServerProfile::redacted)
    }

    /// Add a new profile
    ///
    /// `profile.password` is the plaintext secret.
    pub fn save_profile(&mut self, profile: ServerProfile) -> Result<(), StoreError> {
        validate(&profile)?;

        if self.contains(&profile.name) {
            return Err(StoreError::DuplicateName(profile.name));
        }

        let mut stored = profile;
        stored.password = self.seal(&stored.password)?;

        let mut servers = self.servers.clone();
        let name = stored.name.clone();
        servers.push(stored);
        self.commit(servers)?;

        tracing::info!("Saved server profile '{}'", name);
        Ok(())
    }

    /// Replace the profile called `old_name`, possibly renaming it
    ///
    /// An empty `profile.password` keeps the currently stored secret.
    pub fn update_profile(&mut self, old_name: &str, profile: ServerProfile) -> Result<(), StoreError> {
        validate(&profile)?;

        let index = self
            .position(old_name)
            .ok_or_else(|| StoreError::NotFound(old_name.to_string()))?;

        if profile.name != old_name && self.contains(&profile.name) {
            return Err(StoreError::DuplicateName(profile.name));
        }

        let mut stored = profile;
        stored.password = if stored.password.is_empty() {
            self.servers[index].password.clone()
        } else {
            self.seal(&stored.password)?
        };

        let mut servers = self.servers.clone();
        let new_name = stored.name.clone();
        servers[index] = stored;
        self.commit(servers)?;

        if new_name == old_name {
            tracing::info!("Updated server profile '{}'", new_name);
        } else {
            tracing::info!("Updated server profile '{}' (renamed to '{}')", old_name, new_name);
        }
        Ok(())
    }

    /// Remove a profile
    pub fn delete_profile(&mut self, name: &str) -> Result<(), StoreError> {
        let index = self
            .position(name)
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;

        let mut servers = self.servers.clone();
        servers.remove(index);
        self.commit(servers)?;

        tracing::info!("Deleted server profile '{}'", name);
        Ok(())
    }

    /// The real password for `name`
    ///
    /// Returns an empty string when the profile does not exist or its
    /// secret cannot be recovered.
    pub fn get_decrypted_secret(&self, name: &str) -> String {
        let Some(stored) = self.servers.iter().find(|s| s.name == name) else {
            return String::new();
        };

        if stored.password.is_empty() {
            return String::new();
        }

        match &self.cipher {
            None => stored.password.clone(),
            Some(cipher) => match cipher.decrypt(&stored.password) {
                Ok(secret) => secret,
                Err(e) => {
                    tracing::warn!("Could not recover password for '{}': {}", name, e);
                    String::new()
                }
            },
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.servers.iter().position(|s| s.name == name)
    }

    /// Turn a plaintext secret into its stored form
    fn seal(&self, plaintext: &str) -> Result<String, StoreError> {
        match &self.cipher {
            None => Ok(plaintext.to_string()),
            Some(cipher) if cipher.is_available() => Ok(cipher.encrypt(plaintext)?),
            Some(cipher) => {
                tracing::warn!(
                    "Credential cipher '{}' is unavailable; password will not be stored",
                    cipher.name()
                );
                Ok(String::new())
            }
        }
    }

    /// Write `servers` to disk, then adopt them as the current state
    fn commit(&mut self, servers: Vec<ServerProfile>) -> Result<(), StoreError> {
        write_profile_file(&self.path, &servers)?;
        self.servers = servers;
        Ok(())
    }
}

/// Check the fields shared by save and update
fn validate(profile: &ServerProfile) -> Result<(), StoreError> {
    if profile.name.trim().is_empty() {
        return Err(StoreError::validation("name", "server name is required"));
    }
    if profile.hostname.trim().is_empty() {
        return Err(StoreError::validation("hostname", "host name is required"));
    }
    if profile.port == 0 {
        return Err(StoreError::validation("port", "port must be between 1 and 65535"));
    }
    if profile.username.trim().is_empty() {
        return Err(StoreError::validation("username", "username is required"));
    }
    Ok(())
}

/// Read the profile list, treating any problem as "no profiles"
fn read_profile_file(path: &Path) -> Vec<ServerProfile> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!("No profile file at {:?}, starting empty", path);
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!("Could not read profile file {:?}: {}, starting empty", path, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<ProfileFile>(&contents) {
        Ok(file) => sanitize(path, file.servers),
        Err(e) => {
            tracing::warn!("Profile file {:?} is not valid: {}, starting empty", path, e);
            Vec::new()
        }
    }
}

/// Drop records a hand-edited file may carry that the store would never
/// have written: invalid fields and repeated names (the first one wins)
fn sanitize(path: &Path, servers: Vec<ServerProfile>) -> Vec<ServerProfile> {
    let mut kept: Vec<ServerProfile> = Vec::with_capacity(servers.len());
    for profile in servers {
        if let Err(e) = validate(&profile) {
            tracing::warn!("Skipping profile '{}' in {:?}: {}", profile.name, path, e);
        } else if kept.iter().any(|p| p.name == profile.name) {
            tracing::warn!("Skipping duplicate profile '{}' in {:?}", profile.name, path);
        } else {
            kept.push(profile);
        }
    }
    kept
}

/// Replace the profile file atomically
///
/// Creates the parent directory if needed and restricts the file to the
/// owner on Unix.
fn write_profile_file(path: &Path, servers: &[ServerProfile]) -> Result<(), StoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(&ProfileFileRef { servers })?;

    let tmp = path.with_extension("json.tmp");
    // A leftover from an interrupted write may carry wider permissions
    match fs::remove_file(&tmp) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(&tmp)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp, path)?;
    Ok(())
}

#[derive(Serialize)]
struct ProfileFileRef<'a> {
    servers: &'a [ServerProfile],
}
