//! Vault session.
//!
//! The per-invocation entry point for all cloak operations. Owns the home
//! directory layout and lazily caches the config and identity for the
//! lifetime of the process — there is no cross-process coordination, and
//! concurrent invocations resolve to last-writer-wins on whole files.

use std::path::{Path, PathBuf};

use rand::RngCore;
use tracing::{debug, warn};

use crate::core::bundle::{self, ProjectBundle};
use crate::core::config::{self, Config, Machine};
use crate::core::constants;
use crate::core::identity::{self, Identity, KeyStorage};
use crate::core::resolve;
use crate::error::{ConfigError, Error, Result, StoreError};

/// A project as listed by [`Vault::list_projects`].
#[derive(Debug, Clone)]
pub struct ProjectSummary {
    pub name: String,
    pub path: PathBuf,
    pub count: usize,
}

/// The per-invocation session object.
pub struct Vault {
    home_dir: PathBuf,
    store_dir: PathBuf,
    config_path: PathBuf,
    config: Option<Config>,
    identity: Option<Identity>,
}

impl Vault {
    /// Open the vault at `$CLOAK_HOME`, defaulting to `~/.cloak`.
    pub fn new() -> Result<Self> {
        let home = match std::env::var_os(constants::HOME_ENV) {
            Some(dir) if !dir.is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .ok_or(ConfigError::NoHome)?
                .join(constants::HOME_DIR),
        };
        Ok(Self::at(home))
    }

    /// Open the vault rooted at an explicit home directory.
    pub fn at(home_dir: PathBuf) -> Self {
        let store_dir = home_dir.join(constants::STORE_DIR);
        let config_path = home_dir.join(constants::CONFIG_FILE);
        Self {
            home_dir,
            store_dir,
            config_path,
            config: None,
            identity: None,
        }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn store_dir(&self) -> &Path {
        &self.store_dir
    }

    /// Create the on-disk layout. Failure here is fatal to the invocation.
    fn ensure_layout(&self) -> Result<()> {
        std::fs::create_dir_all(&self.store_dir).map_err(ConfigError::CreateLayout)?;
        Ok(())
    }

    fn ensure_config(&mut self) -> Result<()> {
        if self.config.is_none() {
            self.ensure_layout()?;
            self.config = Some(Config::load(&self.config_path)?);
        }
        Ok(())
    }

    /// The cached configuration, loading it on first access.
    pub fn config(&mut self) -> Result<&Config> {
        self.ensure_config()?;
        Ok(self.config.as_ref().expect("config cached above"))
    }

    /// Mutable access to the cached configuration.
    pub fn config_mut(&mut self) -> Result<&mut Config> {
        self.ensure_config()?;
        Ok(self.config.as_mut().expect("config cached above"))
    }

    /// Persist the cached configuration.
    pub fn save_config(&mut self) -> Result<()> {
        self.ensure_config()?;
        let path = self.config_path.clone();
        if let Some(config) = self.config.as_mut() {
            config.save(&path)?;
        }
        Ok(())
    }

    /// Whether initialization has completed on this machine.
    pub fn is_initialized(&mut self) -> Result<bool> {
        Ok(self.config()?.is_initialized())
    }

    /// First-time setup: generate an identity, persist the private key via
    /// the chosen backend, and record the machine.
    ///
    /// Returns `false` without touching anything when already initialized.
    pub fn init(&mut self, storage: KeyStorage, machine_name: Option<String>) -> Result<bool> {
        self.ensure_config()?;
        if self.is_initialized()? {
            debug!("already initialized, skipping init");
            return Ok(false);
        }

        let machine_name = machine_name
            .filter(|n| !n.is_empty())
            .or_else(|| whoami::fallible::hostname().ok())
            .unwrap_or_else(|| "cloak-machine".to_string());

        let identity = Identity::generate();
        let machine_id = random_id();
        debug!(%machine_id, %machine_name, %storage, "initializing");

        let key_file = identity::persist(&self.home_dir, storage, &machine_id, &identity)?;
        let public_key = identity.public_key();

        let config = self.config_mut()?;
        config.machine = Some(Machine {
            id: machine_id,
            name: machine_name,
            public_key: public_key.clone(),
            added_at: chrono::Utc::now(),
        });
        config.key_storage = Some(storage);
        config.key_file = key_file;
        config.add_recipients([public_key]);

        self.identity = Some(identity);
        self.save_config()?;
        Ok(true)
    }

    /// The loaded identity, cached for the remainder of the process.
    pub fn identity(&mut self) -> Result<&Identity> {
        if self.identity.is_none() {
            let config = self.config()?;
            if !config.is_initialized() {
                return Err(ConfigError::NotInitialized.into());
            }
            let loaded = identity::load(config)?;
            self.identity = Some(loaded);
        }
        Ok(self.identity.as_ref().expect("identity cached above"))
    }

    /// Resolve an optional explicit project name against the current
    /// directory. Fails only when the working directory is unreadable.
    pub fn resolve_project(&mut self, explicit: Option<&str>) -> Result<(String, PathBuf)> {
        let cwd = std::env::current_dir()?;
        let cwd = resolve::normalize_path(&cwd, &cwd);
        let config = self.config()?;
        Ok(resolve::resolve(config, explicit, &cwd))
    }

    /// Ciphertext file path for a project.
    pub fn project_file_path(&self, name: &str) -> PathBuf {
        self.store_dir.join(bundle::bundle_file_name(name))
    }

    /// Load and decrypt a project's bundle.
    ///
    /// A missing ciphertext file yields an empty bundle pre-filled with the
    /// given name and path; decryption and decode failures are surfaced.
    pub fn load_project(&mut self, name: &str, path: &Path) -> Result<ProjectBundle> {
        if !self.is_initialized()? {
            return Err(ConfigError::NotInitialized.into());
        }
        self.identity()?;

        let cwd = std::env::current_dir()?;
        let normalized = resolve::normalize_path(path, &cwd);
        let file_path = self.project_file_path(name);

        let ciphertext = match std::fs::read_to_string(&file_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(ProjectBundle::new(name, &normalized));
            }
            Err(e) => return Err(StoreError::Read(e).into()),
        };

        let identity = self.identity()?;
        let plaintext = crypto_decrypt_for(name, &ciphertext, identity)?;
        let mut loaded: ProjectBundle =
            serde_json::from_slice(&plaintext).map_err(|source| StoreError::Decode {
                project: name.to_string(),
                source,
            })?;

        if loaded.path.as_os_str().is_empty() {
            loaded.path = normalized;
        }
        if loaded.project.is_empty() {
            loaded.project = name.to_string();
        }
        Ok(loaded)
    }

    /// Encrypt and persist a project's bundle.
    ///
    /// The encryption recipient set is the union of all trusted recipients
    /// and this machine's own public key, so every registered device stays
    /// able to decrypt. The union is persisted back to config along with
    /// the project's name/path registration.
    pub fn save_project(&mut self, bundle: &mut ProjectBundle) -> Result<()> {
        let cwd = std::env::current_dir()?;
        bundle.project = bundle::sanitize_project_name(&bundle.project);
        bundle.path = resolve::normalize_path(&bundle.path, &cwd);

        let own_key = self.identity()?.public_key();
        let config = self.config_mut()?;
        config.add_recipients([own_key]);
        let recipients: Vec<String> = config.recipients.iter().cloned().collect();

        let plaintext = serde_json::to_vec_pretty(bundle).map_err(StoreError::Encode)?;
        let ciphertext = crate::core::crypto::encrypt(&plaintext, &recipients)?;

        let file_path = self.project_file_path(&bundle.project);
        config::write_private(&file_path, ciphertext.as_bytes()).map_err(StoreError::Write)?;
        debug!(path = %file_path.display(), "project saved");

        let (project, path) = (bundle.project.clone(), bundle.path.clone());
        self.config_mut()?.register_project(&project, &path);
        self.save_config()
    }

    /// Overwrite a project's ciphertext file byte-for-byte.
    ///
    /// Used by sync adoption; preserves whatever recipient set the content
    /// was encrypted for.
    pub fn write_ciphertext(&self, project: &str, content: &str) -> Result<()> {
        let path = self.project_file_path(project);
        config::write_private(&path, content.as_bytes()).map_err(StoreError::Write)?;
        Ok(())
    }

    /// Read every local project ciphertext from disk, keyed by file name.
    pub fn read_ciphertexts(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        let entries = match std::fs::read_dir(&self.store_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(out),
            Err(e) => return Err(StoreError::Read(e).into()),
        };
        for entry in entries {
            let entry = entry.map_err(StoreError::Read)?;
            let file_name = entry.file_name().to_string_lossy().to_string();
            if entry.path().is_dir() || !file_name.ends_with(constants::BUNDLE_SUFFIX) {
                continue;
            }
            let contents = std::fs::read_to_string(entry.path()).map_err(StoreError::Read)?;
            out.push((file_name, contents));
        }
        out.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(out)
    }

    /// Enumerate known projects with their secret counts.
    ///
    /// Projects come from both the config registry and the store directory;
    /// bundles that fail to load are skipped.
    pub fn list_projects(&mut self) -> Result<Vec<ProjectSummary>> {
        self.ensure_config()?;

        let mut names: std::collections::BTreeSet<String> = self
            .config()?
            .projects
            .keys()
            .map(|name| bundle::sanitize_project_name(name))
            .collect();
        for (file_name, _) in self.read_ciphertexts()? {
            if let Some(name) = file_name.strip_suffix(constants::BUNDLE_SUFFIX) {
                names.insert(name.to_string());
            }
        }

        let mut out = Vec::new();
        for name in names {
            let registered = self.config()?.projects.get(&name).cloned();
            let path = registered.unwrap_or_default();
            match self.load_project(&name, &path) {
                Ok(loaded) => out.push(ProjectSummary {
                    name,
                    path: loaded.path,
                    count: loaded.secrets.len(),
                }),
                Err(e) => {
                    warn!(project = %name, error = %e, "skipping unreadable project");
                }
            }
        }
        Ok(out)
    }

    /// The preferred export format from config.
    pub fn export_format(&mut self) -> Result<String> {
        Ok(self.config()?.prefs.export_format.clone())
    }
}

/// Decrypt a project ciphertext, labelling failures with the project name.
fn crypto_decrypt_for(project: &str, ciphertext: &str, identity: &Identity) -> Result<Vec<u8>> {
    crate::core::crypto::decrypt(ciphertext, identity.as_age()).map_err(|source| {
        Error::Store(StoreError::Decrypt {
            project: project.to_string(),
            source,
        })
    })
}

/// Random 8-byte hex machine id.
fn random_id() -> String {
    let mut bytes = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
