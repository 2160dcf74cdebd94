//! Store and fetch commands

use std::path::Path;

use anyhow::{Context, Result};
use evidence_lib::transfer::{BlobTransport, FailoverTransfer, TransferConfig};
use evidence_lib::vault::EvidenceVault;
use evidence_lib::{import_public_key, unseal, Fingerprint};

use crate::ui;

fn load_vault(config_path: &Path) -> Result<EvidenceVault<FailoverTransfer>> {
    let config = TransferConfig::from_json_file(config_path).with_context(|| {
        format!(
            "cannot load transfer configuration from {}",
            config_path.display()
        )
    })?;
    tracing::debug!(
        write_endpoints = config.write_pool.len(),
        read_endpoints = config.read_pool.len(),
        timeout_secs = config.timeout_secs,
        "transfer configuration loaded"
    );
    Ok(EvidenceVault::new(FailoverTransfer::from_config(&config)?))
}

pub async fn store(
    config_path: &Path,
    file: &Path,
    seal_for: Option<&str>,
    record: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let vault = load_vault(config_path)?;
    let recipient = seal_for
        .map(|arg| {
            super::read_key_arg(arg).and_then(|key| {
                import_public_key(&key).context("recipient public key is not usable")
            })
        })
        .transpose()?;
    let payload = super::read_input(file)?;

    let spinner = ui::spinner("Uploading through write pool...");
    let archived = vault.archive(&payload, recipient.as_ref()).await;
    spinner.finish_and_clear();
    let archived = archived?;

    ui::success(&format!("Stored {}", file.display()));
    ui::key_value("Handle", &archived.handle);
    ui::fingerprint(&archived.fingerprint);
    ui::key_value("Sealed", if archived.sealed { "yes" } else { "no" });
    if verbose {
        ui::byte_count("Stored", archived.size_bytes);
    }

    if let Some(path) = record {
        let record = archived.provenance_record(serde_json::json!({
            "file_name": file.file_name().map(|n| n.to_string_lossy().into_owned()),
        }));
        super::write_output(path, serde_json::to_string_pretty(&record)?.as_bytes())?;
        ui::info(&format!("Provenance record written to {}", path.display()));
    }

    if !archived.sealed {
        ui::warning("Stored without sealing; anyone with the handle can read it.");
    }
    Ok(())
}

pub async fn fetch(
    config_path: &Path,
    storage_dir: &Path,
    handle: &str,
    output: &Path,
    expect: Option<&str>,
    unseal_identity: Option<&str>,
) -> Result<()> {
    let vault = load_vault(config_path)?;
    let expected = expect.map(str::parse::<Fingerprint>).transpose()?;
    let private_key = match unseal_identity {
        Some(identity) => {
            let pair = super::identity_manager(storage_dir)?
                .load(identity)
                .await?
                .with_context(|| format!("no key pair for identity '{identity}'"))?;
            Some(pair.private_key().clone())
        }
        None => None,
    };

    let spinner = ui::spinner("Downloading through read pool...");
    let fetched = match &expected {
        Some(expected) => vault.retrieve(handle, expected, private_key.as_ref()).await,
        None => vault.transport().fetch_with_failover(handle).await,
    };
    spinner.finish_and_clear();
    let mut bytes = fetched?;

    if expected.is_none() {
        ui::warning("No --expect fingerprint given; integrity was not verified.");
        if let Some(key) = &private_key {
            bytes = unseal(&bytes, key)?;
        }
    }

    super::write_output(output, &bytes)?;
    ui::success(&format!("Fetched {handle} -> {}", output.display()));
    ui::byte_count("Fetched", bytes.len());
    Ok(())
}
