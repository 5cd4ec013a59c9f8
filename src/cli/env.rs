//! Import and export commands for .env and JSON formats.

use std::io::Read;
use std::path::Path;

use clap::ValueEnum;

use crate::cli::output;
use crate::core::bundle::Upsert;
use crate::core::config::write_private;
use crate::core::env::{parse_env, render_env, render_json};
use crate::core::resolve::normalize_path;
use crate::core::vault::Vault;
use crate::error::Result;

/// Supported export formats.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Env,
    Json,
}

pub fn import(file: &str, project: Option<&str>, skip_existing: bool) -> Result<()> {
    let raw = if file == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        std::fs::read_to_string(file)?
    };
    let pairs = parse_env(&raw)?;

    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let mut bundle = vault.load_project(&name, &path)?;

    let (mut added, mut updated, mut skipped) = (0, 0, 0);
    for (key, value) in &pairs {
        if skip_existing && bundle.get(key).is_some() {
            skipped += 1;
            continue;
        }
        match bundle.upsert(key, value, None) {
            Upsert::Created => added += 1,
            Upsert::Updated => updated += 1,
        }
    }
    vault.save_project(&mut bundle)?;

    output::success(&format!(
        "imported {} keys ({} added, {} updated, {} skipped) into {}",
        pairs.len(),
        added,
        updated,
        skipped,
        bundle.project
    ));
    Ok(())
}

pub fn export(project: Option<&str>, format: Option<ExportFormat>, out: Option<&str>) -> Result<()> {
    let mut vault = Vault::new()?;
    let (name, path) = vault.resolve_project(project)?;
    let bundle = vault.load_project(&name, &path)?;

    let format = format.unwrap_or_else(|| {
        match vault.export_format().as_deref() {
            Ok("json") => ExportFormat::Json,
            _ => ExportFormat::Env,
        }
    });

    let rendered = match format {
        ExportFormat::Env => render_env(&bundle),
        ExportFormat::Json => render_json(&bundle)?,
    };

    let Some(out) = out else {
        print!("{rendered}");
        return Ok(());
    };

    let cwd = std::env::current_dir()?;
    let out_path = normalize_path(Path::new(out), &cwd);
    if let Some(parent) = out_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    write_private(&out_path, rendered.as_bytes())?;
    output::success(&format!("exported {} to {}", name, out_path.display()));
    Ok(())
}
