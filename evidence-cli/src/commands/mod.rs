//! CLI command implementations

pub mod fingerprint;
pub mod keys;
pub mod seal;
pub mod transfer;

use std::path::Path;

use anyhow::{Context, Result};
use evidence_lib::key_store::{FileKeyStore, IdentityKeyManager};

/// Identity used when `--identity` is not given.
pub const DEFAULT_IDENTITY: &str = "default";

/// Transfer configuration file name inside the storage directory.
pub const TRANSFER_CONFIG_FILE: &str = "transfer.json";

/// Identity manager over `<storage-dir>/keys`.
pub fn identity_manager(storage_dir: &Path) -> Result<IdentityKeyManager<FileKeyStore>> {
    let keys_dir = storage_dir.join("keys");
    let store = FileKeyStore::new(&keys_dir)
        .with_context(|| format!("cannot open key directory {}", keys_dir.display()))?;
    Ok(IdentityKeyManager::new(store))
}

/// Resolve a key argument that is either the key itself or a file holding it.
pub fn read_key_arg(arg: &str) -> Result<String> {
    let path = Path::new(arg);
    if path.is_file() {
        std::fs::read_to_string(path).with_context(|| format!("cannot read key file {arg}"))
    } else {
        Ok(arg.to_string())
    }
}

/// Read an input file.
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("cannot read {}", path.display()))
}

/// Write an output file.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    std::fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}
