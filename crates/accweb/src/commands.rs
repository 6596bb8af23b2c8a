//! Subcommand dispatch.
//!
//! Registry calls block on filesystem I/O, so each one runs on tokio's
//! blocking pool instead of a runtime worker.

use anyhow::{Context, Result};
use profile_registry::{archive, Profile, ServerRegistry, UploadedFiles, Viewer};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use crate::cli::Command;

fn viewer(guest: bool) -> Viewer {
    if guest {
        Viewer::Guest
    } else {
        Viewer::Admin
    }
}

/// Run `f` against the registry on the blocking pool.
async fn blocking<T, F>(registry: &Arc<ServerRegistry>, f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&ServerRegistry) -> Result<T> + Send + 'static,
{
    let registry = Arc::clone(registry);
    tokio::task::spawn_blocking(move || f(&registry)).await?
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Execute one subcommand against a loaded registry.
pub async fn execute(registry: Arc<ServerRegistry>, command: Command) -> Result<()> {
    match command {
        Command::List { guest } => {
            let profiles = blocking(&registry, move |r| Ok(r.list_for(viewer(guest)))).await?;
            print_json(&profiles)
        }
        Command::Status => {
            let status = blocking(&registry, |r| Ok(r.status())).await?;
            print_json(&status)
        }
        Command::Show { id, guest } => {
            let profile = blocking(&registry, move |r| {
                r.get_by_id_for(id, viewer(guest))
                    .with_context(|| format!("Error reading server {}", id))
            })
            .await?;
            print_json(&profile)
        }
        Command::Copy { id } => {
            let new_id = blocking(&registry, move |r| {
                r.copy(id)
                    .with_context(|| format!("Error copying server {}", id))
            })
            .await?;
            info!("📋 Copied server {} to {}", id, new_id);
            println!("{}", new_id);
            Ok(())
        }
        Command::Delete { id } => {
            blocking(&registry, move |r| {
                r.delete(id)
                    .with_context(|| format!("Error deleting server {}", id))
            })
            .await?;
            info!("🗑️ Deleted server {}", id);
            Ok(())
        }
        Command::Export { id, out, guest } => {
            let packed = blocking(&registry, move |r| {
                archive::export(r, id, viewer(guest))
                    .with_context(|| format!("Error exporting server {}", id))
            })
            .await?;

            let path = out.join(&packed.file_name);
            tokio::fs::write(&path, &packed.bytes)
                .await
                .with_context(|| format!("Error writing archive {}", path.display()))?;
            info!("📦 Exported server {} to {}", id, path.display());
            println!("{}", path.display());
            Ok(())
        }
        Command::Import { archive, dir } => {
            let uploads = match (archive, dir) {
                (Some(path), _) => {
                    let bytes = tokio::fs::read(&path)
                        .await
                        .with_context(|| format!("Error reading archive {}", path.display()))?;
                    UploadedFiles::from_archive(&bytes)
                        .with_context(|| format!("Error unpacking archive {}", path.display()))?
                }
                (None, Some(dir)) => UploadedFiles::from_dir(&dir)
                    .with_context(|| format!("Error reading directory {}", dir.display()))?,
                (None, None) => anyhow::bail!("Nothing to import"),
            };

            let new_id = blocking(&registry, move |r| {
                archive::import(r, &uploads).context("Error importing server files")
            })
            .await?;
            info!("📥 Imported server {}", new_id);
            println!("{}", new_id);
            Ok(())
        }
        Command::Save { file } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Error reading {}", file.display()))?;
            let profile: Profile = serde_json::from_str(&content)
                .with_context(|| format!("Error parsing profile {}", file.display()))?;
            let id = profile.id;

            blocking(&registry, move |r| {
                r.save(profile)
                    .with_context(|| format!("Error saving server {}", id))
            })
            .await?;
            info!("💾 Saved server {}", id);
            Ok(())
        }
    }
}
