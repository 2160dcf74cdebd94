//! Seal and unseal commands

use std::path::Path;

use anyhow::{Context, Result};
use evidence_lib::{fingerprint, import_public_key, seal as seal_blob, unseal as unseal_blob};

use crate::ui;

pub fn seal(recipient: &str, input: &Path, output: &Path, verbose: bool) -> Result<()> {
    let recipient = import_public_key(&super::read_key_arg(recipient)?)
        .context("recipient public key is not usable")?;
    let payload = super::read_input(input)?;

    let blob = seal_blob(&payload, &recipient)?;
    super::write_output(output, &blob)?;

    ui::success(&format!("Sealed {} -> {}", input.display(), output.display()));
    if verbose {
        ui::byte_count("Plaintext", payload.len());
    }
    ui::byte_count("Sealed", blob.len());
    ui::fingerprint(&fingerprint(&blob));
    Ok(())
}

pub async fn unseal(storage_dir: &Path, identity: &str, input: &Path, output: &Path) -> Result<()> {
    let manager = super::identity_manager(storage_dir)?;
    let pair = manager
        .load(identity)
        .await?
        .with_context(|| format!("no key pair for identity '{identity}'"))?;

    let blob = super::read_input(input)?;
    let payload = unseal_blob(&blob, pair.private_key())?;
    super::write_output(output, &payload)?;

    ui::success(&format!("Unsealed {} -> {}", input.display(), output.display()));
    ui::byte_count("Recovered", payload.len());
    Ok(())
}
