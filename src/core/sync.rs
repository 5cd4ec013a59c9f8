//! Multi-device reconciliation.
//!
//! Reconciles local project bundles and the trusted-recipient set against a
//! remote blob container. Recipients merge by string set union; bundles
//! merge whole-file last-write-wins on their newest secret timestamp.

use std::collections::BTreeMap;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::core::bundle::ProjectBundle;
use crate::core::config::Config;
use crate::core::constants;
use crate::core::crypto;
use crate::core::remote::RemoteStore;
use crate::core::vault::Vault;
use crate::error::{ConfigError, RemoteError, Result};

/// What a sync run did.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Projects whose local ciphertext was overwritten by the remote copy.
    pub adopted: Vec<String>,
    /// Number of project blobs uploaded in the push phase.
    pub pushed: usize,
    /// Size of the trusted recipient set after merging.
    pub recipients: usize,
}

/// Render the recipients ledger: one key per line, sorted, trailing newline.
fn render_ledger(config: &Config) -> String {
    let mut ledger = config
        .recipients
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    ledger.push('\n');
    ledger
}

/// Establish or validate the remote container linkage.
///
/// Creates a container seeded with the local public key when none is
/// configured, merges the remote recipients ledger into the local trusted
/// set, pushes the merged ledger back, and persists the container id and
/// owner. Any transport failure aborts before config is saved.
pub fn link(
    vault: &mut Vault,
    remote: &dyn RemoteStore,
    container_id: Option<&str>,
) -> Result<String> {
    if !vault.is_initialized()? {
        return Err(ConfigError::NotInitialized.into());
    }
    let own_key = vault.identity()?.public_key();

    let explicit = container_id.map(str::trim).filter(|id| !id.is_empty());
    let configured = vault.config()?.remote.id.clone();

    let mut created_owner = None;
    let id = match explicit.map(str::to_string).or(configured) {
        Some(id) => id,
        None => {
            let mut files = BTreeMap::new();
            files.insert(
                constants::RECIPIENTS_FILE.to_string(),
                format!("{own_key}\n"),
            );
            let created = remote.create(&files)?;
            info!(id = %created.id, "created remote container");
            created_owner = created.owner;
            created.id
        }
    };

    let container = remote.get(&id)?;

    let config = vault.config_mut()?;
    config.remote.id = Some(container.id.clone());
    if let Some(owner) = container.owner.or(created_owner) {
        config.remote.owner = Some(owner);
    }
    config.add_recipients([own_key]);
    if let Some(ledger) = container.files.get(constants::RECIPIENTS_FILE) {
        config.add_recipients(ledger.lines());
    }

    let mut files = BTreeMap::new();
    files.insert(
        constants::RECIPIENTS_FILE.to_string(),
        render_ledger(vault.config()?),
    );
    remote.update(&container.id, &files)?;

    vault.save_config()?;
    Ok(container.id)
}

/// Bidirectional reconciliation against the linked container.
///
/// Pull phase: merge recipients, then decide adoption per remote blob —
/// adopting overwrites the local ciphertext byte-for-byte and discards any
/// local change to that project not present remotely. Push phase: re-read
/// every local ciphertext from disk and upload all of them plus the sorted
/// ledger in one batch. Transport failures abort before the final config
/// save; an individual unreadable blob is skipped.
pub fn sync(vault: &mut Vault, remote: &dyn RemoteStore) -> Result<SyncReport> {
    let id = vault
        .config()?
        .remote
        .id
        .clone()
        .ok_or(RemoteError::NotLinked)?;
    let own_key = vault.identity()?.public_key();

    let container = remote.get(&id)?;

    let config = vault.config_mut()?;
    if let Some(ledger) = container.files.get(constants::RECIPIENTS_FILE) {
        config.add_recipients(ledger.lines());
    }
    config.add_recipients([own_key]);

    let mut report = SyncReport::default();
    for (name, content) in &container.files {
        let Some(project) = name.strip_suffix(constants::BUNDLE_SUFFIX) else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }

        let local_path = vault.project_file_path(project);
        let local_cipher = std::fs::read_to_string(&local_path).unwrap_or_default();
        if local_cipher.is_empty() {
            debug!(project, "no local copy, adopting remote");
            vault.write_ciphertext(project, content)?;
            report.adopted.push(project.to_string());
            continue;
        }

        // Remote copy we cannot read stays untouched: local is authoritative.
        let Ok(remote_plain) = crypto::decrypt(content, vault.identity()?.as_age()) else {
            debug!(project, "remote copy undecryptable, keeping local");
            continue;
        };

        // Local copy we cannot read is presumed corrupt.
        let local_plain = match crypto::decrypt(&local_cipher, vault.identity()?.as_age()) {
            Ok(plain) => plain,
            Err(e) => {
                warn!(project, error = %e, "local copy undecryptable, adopting remote");
                vault.write_ciphertext(project, content)?;
                report.adopted.push(project.to_string());
                continue;
            }
        };

        let remote_bundle: ProjectBundle = match serde_json::from_slice(&remote_plain) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(project, error = %e, "skipping malformed remote bundle");
                continue;
            }
        };
        let local_bundle: ProjectBundle = match serde_json::from_slice(&local_plain) {
            Ok(bundle) => bundle,
            Err(e) => {
                warn!(project, error = %e, "skipping malformed local bundle");
                continue;
            }
        };

        // Whole-bundle last-write-wins: adopt only a strictly newer remote.
        if remote_bundle.latest_update() > local_bundle.latest_update() {
            debug!(project, "remote is newer, adopting");
            vault.write_ciphertext(project, content)?;
            report.adopted.push(project.to_string());
        }
    }

    let mut files: BTreeMap<String, String> = vault.read_ciphertexts()?.into_iter().collect();
    report.pushed = files.len();
    files.insert(
        constants::RECIPIENTS_FILE.to_string(),
        render_ledger(vault.config()?),
    );
    remote.update(&id, &files)?;

    let config = vault.config_mut()?;
    config.remote.last_synced_at = Some(Utc::now());
    report.recipients = config.recipients.len();
    vault.save_config()?;

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bundle::Secret;
    use crate::core::identity::KeyStorage;
    use crate::core::remote::RemoteContainer;
    use chrono::{DateTime, TimeZone};
    use std::cell::RefCell;
    use std::path::Path;
    use tempfile::TempDir;

    /// In-memory stand-in for the blob container API.
    struct MemoryRemote {
        containers: RefCell<BTreeMap<String, BTreeMap<String, String>>>,
    }

    impl MemoryRemote {
        fn new() -> Self {
            Self {
                containers: RefCell::new(BTreeMap::new()),
            }
        }

        fn seed(&self, id: &str, files: BTreeMap<String, String>) {
            self.containers.borrow_mut().insert(id.to_string(), files);
        }

        fn files(&self, id: &str) -> BTreeMap<String, String> {
            self.containers.borrow()[id].clone()
        }
    }

    impl RemoteStore for MemoryRemote {
        fn create(&self, files: &BTreeMap<String, String>) -> Result<RemoteContainer> {
            let id = format!("container-{}", self.containers.borrow().len() + 1);
            self.containers
                .borrow_mut()
                .insert(id.clone(), files.clone());
            Ok(RemoteContainer {
                id,
                owner: Some("tester".to_string()),
                files: files.clone(),
            })
        }

        fn get(&self, id: &str) -> Result<RemoteContainer> {
            let files = self
                .containers
                .borrow()
                .get(id)
                .cloned()
                .ok_or(RemoteError::Api {
                    operation: "get",
                    status: 404,
                    body: "not found".to_string(),
                })?;
            Ok(RemoteContainer {
                id: id.to_string(),
                owner: Some("tester".to_string()),
                files,
            })
        }

        fn update(&self, id: &str, files: &BTreeMap<String, String>) -> Result<()> {
            let mut containers = self.containers.borrow_mut();
            let container = containers.get_mut(id).ok_or(RemoteError::Api {
                operation: "update",
                status: 404,
                body: "not found".to_string(),
            })?;
            for (name, content) in files {
                container.insert(name.clone(), content.clone());
            }
            Ok(())
        }
    }

    fn vault() -> (TempDir, Vault) {
        let tmp = TempDir::new().unwrap();
        let mut vault = Vault::at(tmp.path().join("home"));
        vault.init(KeyStorage::File, Some("tester".into())).unwrap();
        (tmp, vault)
    }

    fn ts(hour: u32) -> DateTime<chrono::Utc> {
        chrono::Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap()
    }

    fn bundle_at(project: &str, hour: u32) -> ProjectBundle {
        ProjectBundle {
            project: project.to_string(),
            path: Path::new("/srv").join(project),
            secrets: vec![Secret {
                key: "TOKEN".to_string(),
                value: format!("v{hour}"),
                group: "General".to_string(),
                created_at: ts(hour),
                updated_at: ts(hour),
            }],
        }
    }

    fn encrypt_for(bundle: &ProjectBundle, recipients: &[String]) -> String {
        crypto::encrypt(&serde_json::to_vec(bundle).unwrap(), recipients).unwrap()
    }

    fn link_to(vault: &mut Vault, remote: &MemoryRemote, files: BTreeMap<String, String>) {
        remote.seed("shared", files);
        link(vault, remote, Some("shared")).unwrap();
    }

    #[test]
    fn test_link_creates_container_with_own_key() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();

        let id = link(&mut vault, &remote, None).unwrap();

        let own_key = vault.identity().unwrap().public_key();
        let files = remote.files(&id);
        assert!(files["recipients.txt"].contains(&own_key));

        let config = vault.config().unwrap();
        assert_eq!(config.remote.id.as_deref(), Some(id.as_str()));
        assert_eq!(config.remote.owner.as_deref(), Some("tester"));
    }

    #[test]
    fn test_link_merges_remote_ledger() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();
        let other = crate::core::identity::Identity::generate().public_key();

        let mut files = BTreeMap::new();
        files.insert("recipients.txt".to_string(), format!("{other}\n"));
        link_to(&mut vault, &remote, files);

        let config = vault.config().unwrap();
        assert!(config.recipients.contains(&other));
        let own_key = config.machine.as_ref().unwrap().public_key.clone();
        assert!(config.recipients.contains(&own_key));

        // Merged ledger was pushed back, sorted with trailing newline.
        let files = remote.files("shared");
        let ledger = &files["recipients.txt"];
        let lines: Vec<&str> = ledger.lines().collect();
        assert!(lines.contains(&other.as_str()));
        assert!(lines.contains(&own_key.as_str()));
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
        assert!(ledger.ends_with('\n'));
    }

    #[test]
    fn test_link_is_noop_second_time() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();

        let first = link(&mut vault, &remote, None).unwrap();
        let second = link(&mut vault, &remote, None).unwrap();
        assert_eq!(first, second);
        assert_eq!(remote.containers.borrow().len(), 1);
    }

    #[test]
    fn test_sync_without_link_fails() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();

        let err = sync(&mut vault, &remote).unwrap_err();
        assert!(err.to_string().contains("no remote linked"));
    }

    #[test]
    fn test_sync_adopts_remote_when_no_local_copy() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();
        let own = vault.identity().unwrap().public_key();

        let cipher = encrypt_for(&bundle_at("demo", 10), &[own.clone()]);
        let mut files = BTreeMap::new();
        files.insert("recipients.txt".to_string(), format!("{own}\n"));
        files.insert("demo.json.age".to_string(), cipher.clone());
        link_to(&mut vault, &remote, files);

        let report = sync(&mut vault, &remote).unwrap();
        assert_eq!(report.adopted, vec!["demo".to_string()]);

        // Byte-for-byte adoption.
        let local = std::fs::read_to_string(vault.project_file_path("demo")).unwrap();
        assert_eq!(local, cipher);
    }

    #[test]
    fn test_sync_adopts_strictly_newer_remote_only() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();
        let own = vault.identity().unwrap().public_key();

        let local_cipher = encrypt_for(&bundle_at("demo", 10), &[own.clone()]);
        vault.write_ciphertext("demo", &local_cipher).unwrap();

        // Remote strictly newer: adopted.
        let newer = encrypt_for(&bundle_at("demo", 12), &[own.clone()]);
        let mut files = BTreeMap::new();
        files.insert("recipients.txt".to_string(), format!("{own}\n"));
        files.insert("demo.json.age".to_string(), newer.clone());
        link_to(&mut vault, &remote, files);

        let report = sync(&mut vault, &remote).unwrap();
        assert_eq!(report.adopted, vec!["demo".to_string()]);
        let local = std::fs::read_to_string(vault.project_file_path("demo")).unwrap();
        assert_eq!(local, newer);

        // Remote equal or older: local untouched.
        let older = encrypt_for(&bundle_at("demo", 11), &[own.clone()]);
        let mut files = BTreeMap::new();
        files.insert("demo.json.age".to_string(), older);
        remote.update("shared", &files).unwrap();

        let report = sync(&mut vault, &remote).unwrap();
        assert!(report.adopted.is_empty());
        let local = std::fs::read_to_string(vault.project_file_path("demo")).unwrap();
        assert_eq!(local, newer);
    }

    #[test]
    fn test_sync_skips_undecryptable_remote() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();
        let own = vault.identity().unwrap().public_key();
        let stranger = crate::core::identity::Identity::generate().public_key();

        let local_cipher = encrypt_for(&bundle_at("demo", 10), &[own.clone()]);
        vault.write_ciphertext("demo", &local_cipher).unwrap();

        // Remote encrypted for someone else entirely: cannot evaluate, skip.
        let foreign = encrypt_for(&bundle_at("demo", 12), &[stranger]);
        let mut files = BTreeMap::new();
        files.insert("recipients.txt".to_string(), format!("{own}\n"));
        files.insert("demo.json.age".to_string(), foreign);
        link_to(&mut vault, &remote, files);

        let report = sync(&mut vault, &remote).unwrap();
        assert!(report.adopted.is_empty());

        // Push phase re-uploaded the local copy.
        assert_eq!(remote.files("shared")["demo.json.age"], local_cipher);
    }

    #[test]
    fn test_sync_replaces_undecryptable_local() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();
        let own = vault.identity().unwrap().public_key();

        vault.write_ciphertext("demo", "corrupt bytes").unwrap();

        let cipher = encrypt_for(&bundle_at("demo", 9), &[own.clone()]);
        let mut files = BTreeMap::new();
        files.insert("recipients.txt".to_string(), format!("{own}\n"));
        files.insert("demo.json.age".to_string(), cipher.clone());
        link_to(&mut vault, &remote, files);

        let report = sync(&mut vault, &remote).unwrap();
        assert_eq!(report.adopted, vec!["demo".to_string()]);
        let local = std::fs::read_to_string(vault.project_file_path("demo")).unwrap();
        assert_eq!(local, cipher);
    }

    #[test]
    fn test_sync_pushes_local_blobs_and_ledger() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();

        link(&mut vault, &remote, None).unwrap();

        let mut bundle = ProjectBundle::new("alpha", Path::new("/srv/alpha"));
        bundle.upsert("KEY", "value", None);
        vault.save_project(&mut bundle).unwrap();

        let report = sync(&mut vault, &remote).unwrap();
        assert_eq!(report.pushed, 1);
        assert_eq!(report.recipients, 1);

        let id = vault.config().unwrap().remote.id.clone().unwrap();
        let files = remote.files(&id);
        assert!(files.contains_key("alpha.json.age"));
        assert!(files.contains_key("recipients.txt"));

        assert!(vault.config().unwrap().remote.last_synced_at.is_some());
    }

    #[test]
    fn test_sync_transport_failure_aborts_before_config_save() {
        let (_tmp, mut vault) = vault();
        let remote = MemoryRemote::new();

        link(&mut vault, &remote, None).unwrap();
        // Simulate the container disappearing between link and sync.
        remote.containers.borrow_mut().clear();

        assert!(sync(&mut vault, &remote).is_err());
        assert!(vault.config().unwrap().remote.last_synced_at.is_none());
    }
}
