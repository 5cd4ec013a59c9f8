//! Project listing command.

use crate::cli::output;
use crate::core::vault::Vault;
use crate::error::Result;

pub fn list() -> Result<()> {
    let mut vault = Vault::new()?;
    let projects = vault.list_projects()?;

    if projects.is_empty() {
        output::dimmed("no projects yet");
        return Ok(());
    }

    println!("{:<24} {:>7}  {}", "PROJECT", "SECRETS", "PATH");
    for project in projects {
        println!(
            "{:<24} {:>7}  {}",
            project.name,
            project.count,
            project.path.display()
        );
    }
    Ok(())
}
