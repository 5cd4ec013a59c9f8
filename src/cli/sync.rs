//! Remote link and sync commands.

use crate::cli::output;
use crate::core::remote::GistStore;
use crate::core::sync as engine;
use crate::core::token;
use crate::core::vault::Vault;
use crate::error::{RemoteError, Result};

pub fn link(token: Option<&str>, container: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;

    if let Some(token) = token.map(str::trim).filter(|t| !t.is_empty()) {
        // Remember an explicitly supplied token for future runs.
        let _ = token::store(token);
    }

    let token = token::resolve(token)?;
    let remote = GistStore::new(&token);
    let id = engine::link(&mut vault, &remote, container)?;

    output::success(&format!("linked remote container {id}"));
    Ok(())
}

pub fn sync(token: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;
    if vault.config()?.remote.id.is_none() {
        return Err(RemoteError::NotLinked.into());
    }

    let token = token::resolve(token)?;
    let remote = GistStore::new(&token);
    let report = engine::sync(&mut vault, &remote)?;

    if !report.adopted.is_empty() {
        for project in &report.adopted {
            output::kv("adopted", project);
        }
    }
    output::success(&format!(
        "sync complete ({} projects pushed, {} adopted, {} recipients)",
        report.pushed,
        report.adopted.len(),
        report.recipients
    ));
    Ok(())
}
