//! Secret commands: set, get, rm, ls.

use crate::cli::output;
use crate::core::bundle::Upsert;
use crate::core::vault::Vault;
use crate::error::{Result, SecretError};

pub fn set(key: &str, value: &str, project: Option<&str>, group: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let mut bundle = vault.load_project(&name, &path)?;

    let outcome = bundle.upsert(key, value, group);
    vault.save_project(&mut bundle)?;

    match outcome {
        Upsert::Created => output::success(&format!("added {} to {}", key, bundle.project)),
        Upsert::Updated => output::success(&format!("updated {} in {}", key, bundle.project)),
    }
    Ok(())
}

pub fn get(key: &str, project: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let bundle = vault.load_project(&name, &path)?;

    let secret = bundle.get(key).ok_or_else(|| SecretError::NotFound {
        key: key.to_string(),
        project: name.clone(),
    })?;
    println!("{}", secret.value);
    Ok(())
}

pub fn rm(key: &str, project: Option<&str>, yes: bool) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let mut bundle = vault.load_project(&name, &path)?;

    if bundle.get(key).is_none() {
        return Err(SecretError::NotFound {
            key: key.to_string(),
            project: name,
        }
        .into());
    }

    if !yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Delete {} from {}?", key, name))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            output::dimmed("cancelled");
            return Ok(());
        }
    }

    bundle.remove(key);
    vault.save_project(&mut bundle)?;
    output::success(&format!("deleted {} from {}", key, bundle.project));
    Ok(())
}

pub fn ls(project: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let bundle = vault.load_project(&name, &path)?;

    if bundle.secrets.is_empty() {
        output::dimmed(&format!("no secrets in {}", name));
        return Ok(());
    }

    let mut sorted: Vec<_> = bundle.secrets.iter().collect();
    sorted.sort_by(|a, b| a.group.cmp(&b.group).then_with(|| a.key.cmp(&b.key)));

    let mut current_group = "";
    for secret in sorted {
        if secret.group != current_group {
            current_group = &secret.group;
            println!("[{}]", current_group);
        }
        output::kv(&secret.key, mask_value(&secret.value));
    }
    Ok(())
}

/// Mask a secret value for display: short values are fully starred, longer
/// ones keep a 6-character prefix.
fn mask_value(value: &str) -> String {
    let chars = value.chars().count();
    if chars == 0 {
        return String::new();
    }
    if chars <= 6 {
        return "*".repeat(chars);
    }
    let prefix: String = value.chars().take(6).collect();
    format!("{}{}", prefix, "*".repeat(chars - 6))
}
