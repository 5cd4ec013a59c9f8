//! Run command.
//!
//! Executes a command with the resolved project's secrets injected as
//! environment variables.

use crate::core::vault::Vault;
use crate::error::Result;
use zeroize::Zeroizing;

pub fn execute(project: Option<&str>, command: &[String]) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let bundle = vault.load_project(&name, &path)?;

    let mut cmd = std::process::Command::new(&command[0]);
    cmd.args(&command[1..]);

    // Secrets are wiped from our memory once handed to the child.
    for secret in &bundle.secrets {
        let value = Zeroizing::new(secret.value.clone());
        cmd.env(&secret.key, value.as_str());
    }

    let status = cmd.status()?;
    std::process::exit(status.code().unwrap_or(1));
}
