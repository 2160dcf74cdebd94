//! Keygen and export-key commands

use std::io::IsTerminal;
use std::path::Path;

use anyhow::{Context, Result};
use evidence_lib::key_store::{FileKeyStore, IdentityKeyManager};
use evidence_lib::keys::{export_public_key, export_public_key_pem};

use crate::ui;

pub async fn keygen(storage_dir: &Path, identity: &str, force: bool, verbose: bool) -> Result<()> {
    let manager = super::identity_manager(storage_dir)?;

    let pair = match manager.load(identity).await? {
        Some(existing) if !force => {
            ui::info(&format!("Identity '{identity}' already has a key pair"));
            ui::info("Use --force to replace it");
            existing
        }
        Some(_) => {
            ui::warning("Evidence sealed for the current key will no longer open.");
            if std::io::stdin().is_terminal()
                && !ui::confirm(&format!("Replace the key pair of '{identity}'?"), false)?
            {
                ui::info("Keygen cancelled");
                return Ok(());
            }
            let spinner = ui::spinner("Generating RSA-2048 key pair...");
            let pair = manager.regenerate(identity).await?;
            spinner.finish_and_clear();
            ui::success(&format!("Key pair for '{identity}' replaced"));
            pair
        }
        None => {
            let spinner = ui::spinner("Generating RSA-2048 key pair...");
            let pair = manager.load_or_create(identity).await?;
            spinner.finish_and_clear();
            ui::success(&format!("Key pair for '{identity}' created"));
            pair
        }
    };

    if verbose {
        let key_id = IdentityKeyManager::<FileKeyStore>::key_id(identity)?;
        let key_file = manager.store().dir().join(format!("{key_id}.key"));
        ui::key_value("Key file", &key_file.display().to_string());
    }

    ui::key_value("Identity", identity);
    ui::key_value("Public key", &export_public_key(pair.public_key())?);
    Ok(())
}

pub async fn export(
    storage_dir: &Path,
    identity: &str,
    pem: bool,
    output: Option<&Path>,
) -> Result<()> {
    let manager = super::identity_manager(storage_dir)?;
    let pair = manager.load(identity).await?.with_context(|| {
        format!("no key pair for identity '{identity}'. Run 'evidence keygen' first.")
    })?;

    let exported = if pem {
        export_public_key_pem(pair.public_key())?
    } else {
        export_public_key(pair.public_key())?
    };

    match output {
        Some(path) => {
            super::write_output(path, exported.as_bytes())?;
            ui::success(&format!("Public key written to {}", path.display()));
        }
        None => println!("{}", exported.trim_end()),
    }
    Ok(())
}
