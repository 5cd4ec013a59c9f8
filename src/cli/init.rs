//! Init command - first-time machine setup.

use tracing::info;

use crate::cli::output;
use crate::core::identity::KeyStorage;
use crate::core::remote::GistStore;
use crate::core::token;
use crate::core::vault::Vault;
use crate::error::Result;

pub fn execute(key_storage: &str, machine_name: Option<String>, link: bool) -> Result<()> {
    let storage: KeyStorage = key_storage.parse()?;

    let mut vault = Vault::new()?;
    let created = vault.init(storage, machine_name)?;

    if created {
        info!("initialized");
        output::success(&format!(
            "initialized cloak at {}",
            vault.home_dir().display()
        ));
        if let Some(machine) = &vault.config()?.machine {
            output::kv("machine", &machine.name);
            output::kv("public key", &machine.public_key);
        }
    } else {
        output::dimmed("already initialized");
    }

    if link {
        let token = token::resolve(None)?;
        let remote = GistStore::new(&token);
        let id = crate::core::sync::link(&mut vault, &remote, None)?;
        output::success(&format!("linked remote container {id}"));
    }

    Ok(())
}
