//! Machine identity.
//!
//! Wraps an age x25519 keypair with secure memory handling and persists the
//! private half through exactly one backend per machine: a plaintext file
//! with owner-only permissions, or the OS secret store.

use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use age::x25519;
use keyring::Entry;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::{self, Config};
use crate::core::constants;
use crate::core::types::PublicKey;
use crate::error::{ConfigError, IdentityError, Result};

/// Where the private key lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyStorage {
    File,
    Keychain,
}

impl std::str::FromStr for KeyStorage {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "keychain" => Ok(Self::Keychain),
            other => Err(ConfigError::InvalidKeyStorage(other.to_string())),
        }
    }
}

impl std::fmt::Display for KeyStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Keychain => write!(f, "keychain"),
        }
    }
}

/// A private key identity for decrypting bundles.
pub struct Identity {
    inner: x25519::Identity,
}

impl Identity {
    /// Generate a fresh keypair from the OS random source.
    pub fn generate() -> Self {
        Self {
            inner: x25519::Identity::generate(),
        }
    }

    /// Parse an identity from its `AGE-SECRET-KEY-...` encoding.
    pub fn parse(encoded: &str) -> Result<Self> {
        let inner: x25519::Identity = encoded
            .trim()
            .parse()
            .map_err(|e: &str| IdentityError::Parse(e.to_string()))?;
        Ok(Self { inner })
    }

    /// The public half ("recipient") of this identity.
    pub fn public_key(&self) -> PublicKey {
        self.inner.to_public().to_string()
    }

    /// Reference to the inner age identity (for decryption).
    pub fn as_age(&self) -> &x25519::Identity {
        &self.inner
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("public_key", &self.public_key())
            .finish()
    }
}

/// OS secret-store account name for a machine's identity.
fn keychain_account(machine_id: &str) -> String {
    format!("age-{machine_id}")
}

/// Persist the private key via the chosen backend.
///
/// File mode writes `<home>/keys/<machine-id>.txt` with owner-only
/// permissions and returns the path; keychain mode stores the key under the
/// fixed service name and a machine-derived account, returning `None`.
pub fn persist(
    home_dir: &Path,
    storage: KeyStorage,
    machine_id: &str,
    identity: &Identity,
) -> Result<Option<PathBuf>> {
    let secret = identity.inner.to_string();

    match storage {
        KeyStorage::Keychain => {
            debug!(machine_id, "storing identity in OS secret store");
            let entry = Entry::new(constants::SERVICE_NAME, &keychain_account(machine_id))
                .map_err(IdentityError::Keychain)?;
            entry
                .set_password(secret.expose_secret())
                .map_err(IdentityError::Keychain)?;
            Ok(None)
        }
        KeyStorage::File => {
            let key_dir = home_dir.join(constants::KEY_DIR);
            std::fs::create_dir_all(&key_dir).map_err(IdentityError::Write)?;

            let path = key_dir.join(format!("{machine_id}.txt"));
            debug!(path = %path.display(), "writing identity file");
            config::write_private(&path, format!("{}\n", secret.expose_secret()).as_bytes())
                .map_err(IdentityError::Write)?;
            Ok(Some(path))
        }
    }
}

/// Load the identity described by `config`.
///
/// In keychain mode the secret-store entry is tried first; a miss or parse
/// failure falls through to the configured key file, which is also the file
/// mode path. The caller is responsible for the initialization check.
pub fn load(config: &Config) -> Result<Identity> {
    if config.key_storage == Some(KeyStorage::Keychain) {
        if let Some(machine) = &config.machine {
            if let Ok(entry) = Entry::new(constants::SERVICE_NAME, &keychain_account(&machine.id)) {
                if let Ok(secret) = entry.get_password() {
                    if let Ok(identity) = Identity::parse(&secret) {
                        debug!("identity loaded from OS secret store");
                        return Ok(identity);
                    }
                }
            }
            debug!("keychain identity unavailable, falling back to key file");
        }
    }

    let path = config
        .key_file
        .as_deref()
        .ok_or(IdentityError::MissingKeyFile)?;
    debug!(path = %path.display(), "loading identity file");

    let contents = std::fs::read_to_string(path).map_err(IdentityError::Read)?;
    Identity::parse(&contents)
}
