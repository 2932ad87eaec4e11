//! Credential encryption
//!
//! Stored server passwords are sealed with AES-256-GCM under a key that is
//! re-derived on every start from non-secret machine identifiers (host name
//! and OS user name) with Argon2id. Nothing secret is written to disk: the
//! same user on the same machine always derives the same key, and a copied
//! profile file is useless elsewhere.
//!
//! # Envelope format
//!
//! `base64(nonce[12] || tag[16] || ciphertext)`
//!
//! A fresh random nonce is drawn for every call, so sealing the same
//! password twice never yields the same envelope.

use std::fmt;

use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce, Tag};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::CipherError;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const KEY_SIZE: usize = 32;

/// Smallest decoded envelope: nonce and tag around an empty ciphertext
pub const MIN_ENVELOPE_LEN: usize = NONCE_SIZE + TAG_SIZE;

/// Application salt for key derivation. Changing it orphans every stored
/// password.
const KDF_SALT: &[u8] = b"serverdeck-credential-key-v1";

const KDF_MEMORY_KIB: u32 = 19 * 1024;
const KDF_ITERATIONS: u32 = 2;
const KDF_PARALLELISM: u32 = 1;

/// Encrypts and decrypts single secrets for at-rest storage
///
/// Implementations backed by an OS facility (a keychain, a secret service)
/// may be unusable on some hosts and report that through `is_available`.
pub trait CredentialCipher: Send + Sync {
    /// Seal a plaintext secret into a printable envelope
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError>;

    /// Open an envelope produced by `encrypt`
    fn decrypt(&self, envelope: &str) -> Result<String, CipherError>;

    /// Whether this cipher can be used on the current host
    fn is_available(&self) -> bool;

    /// Human-readable backend name (e.g. "aes-256-gcm")
    fn name(&self) -> &str;
}

/// Non-secret identifiers the machine key is derived from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineIdentity {
    pub hostname: String,
    /// `None` when the OS user could not be resolved
    pub username: Option<String>,
}

impl MachineIdentity {
    pub fn new(hostname: impl Into<String>, username: Option<String>) -> Self {
        Self {
            hostname: hostname.into(),
            username,
        }
    }

    /// Identity of the current process
    ///
    /// A failed user lookup degrades to a host-only identity instead of an
    /// error.
    pub fn current() -> Self {
        let hostname = gethostname::gethostname().to_string_lossy().into_owned();
        let username = match whoami::fallible::username() {
            Ok(name) if !name.trim().is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Could not resolve OS user, deriving key from host name only: {}", e);
                None
            }
        };
        Self { hostname, username }
    }

    fn key_material(&self) -> String {
        match &self.username {
            Some(user) => format!("{}:{}", self.hostname, user),
            None => self.hostname.clone(),
        }
    }
}

/// AES-256-GCM cipher keyed by the local machine identity
pub struct MachineCipher {
    key: Zeroizing<[u8; KEY_SIZE]>,
}

impl MachineCipher {
    /// Derive the key for the current machine and user
    pub fn new() -> Result<Self, CipherError> {
        Self::from_identity(&MachineIdentity::current())
    }

    /// Derive the key for an explicit identity
    pub fn from_identity(identity: &MachineIdentity) -> Result<Self, CipherError> {
        let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_PARALLELISM, Some(KEY_SIZE))
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        argon2
            .hash_password_into(identity.key_material().as_bytes(), KDF_SALT, key.as_mut())
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))?;

        tracing::debug!(
            "Derived credential key (user identity: {})",
            if identity.username.is_some() { "host+user" } else { "host only" }
        );

        Ok(Self { key })
    }

    fn aead(&self) -> Result<Aes256Gcm, CipherError> {
        Aes256Gcm::new_from_slice(self.key.as_ref())
            .map_err(|e| CipherError::KeyDerivation(e.to_string()))
    }
}

impl fmt::Debug for MachineCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MachineCipher").finish_non_exhaustive()
    }
}

impl CredentialCipher for MachineCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CipherError> {
        let cipher = self.aead()?;

        let mut nonce = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = cipher
            .encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut envelope = Vec::with_capacity(MIN_ENVELOPE_LEN + buffer.len());
        envelope.extend_from_slice(&nonce);
        envelope.extend_from_slice(tag.as_slice());
        envelope.extend_from_slice(&buffer);
        Ok(BASE64.encode(envelope))
    }

    fn decrypt(&self, envelope: &str) -> Result<String, CipherError> {
        let data = BASE64
            .decode(envelope.trim())
            .map_err(|e| CipherError::Decryption(format!("invalid base64: {}", e)))?;

        if data.len() < MIN_ENVELOPE_LEN {
            return Err(CipherError::Decryption(format!(
                "envelope too short ({} bytes, need at least {})",
                data.len(),
                MIN_ENVELOPE_LEN
            )));
        }

        let (nonce, rest) = data.split_at(NONCE_SIZE);
        let (tag, ciphertext) = rest.split_at(TAG_SIZE);

        let cipher = self.aead()?;
        let mut buffer = ciphertext.to_vec();
        cipher
            .decrypt_in_place_detached(Nonce::from_slice(nonce), b"", &mut buffer, Tag::from_slice(tag))
            .map_err(|_| CipherError::Decryption("authentication tag mismatch".into()))?;

        String::from_utf8(buffer)
            .map_err(|e| CipherError::Decryption(format!("invalid UTF-8: {}", e)))
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "aes-256-gcm"
    }
}
