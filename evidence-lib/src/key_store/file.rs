//! Directory-backed key store.
//!
//! Each key is written to `{dir}/{key_id}.key`. On Unix the directory is
//! created `0700` and key files `0600`. Key files are replaced atomically.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use zeroize::Zeroizing;

use super::{is_valid_key_id, KeyStore, KeyStoreError, KeyStoreResult, StoreOptions};

const KEY_FILE_EXTENSION: &str = "key";
const TEMP_FILE_EXTENSION: &str = "tmp";

/// Key store keeping one file per key.
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    dir: PathBuf,
}

impl FileKeyStore {
    /// Open (creating if needed) a key directory.
    pub fn new(dir: impl Into<PathBuf>) -> KeyStoreResult<Self> {
        let dir = dir.into();
        create_private_dir(&dir).map_err(|source| KeyStoreError::Io {
            key_id: dir.display().to_string(),
            source,
        })?;
        Ok(Self { dir })
    }

    /// Directory holding the key files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key_id: &str) -> KeyStoreResult<PathBuf> {
        if !is_valid_key_id(key_id) {
            return Err(KeyStoreError::InvalidKeyId(key_id.to_string()));
        }
        Ok(self.dir.join(format!("{key_id}.{KEY_FILE_EXTENSION}")))
    }

    fn temp_path_for(&self, key_id: &str) -> PathBuf {
        self.dir
            .join(format!(".{key_id}.{:016x}.{TEMP_FILE_EXTENSION}", rand::random::<u64>()))
    }
}

fn io_error(key_id: &str) -> impl FnOnce(std::io::Error) -> KeyStoreError + '_ {
    move |source| KeyStoreError::Io {
        key_id: key_id.to_string(),
        source,
    }
}

#[cfg(unix)]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o700)
        .create(dir)
}

#[cfg(not(unix))]
fn create_private_dir(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

/// Create `path` fresh with owner-only permissions and fill it durably.
async fn write_private_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;
    file.write_all(data).await?;
    file.sync_all().await
}

impl KeyStore for FileKeyStore {
    /// Writes go to a hidden temp file first and are moved into place once
    /// synced, so a key file is never observed half-written.
    async fn store(&self, key_id: &str, key_data: &[u8], options: StoreOptions) -> KeyStoreResult<()> {
        let path = self.path_for(key_id)?;
        let temp_path = self.temp_path_for(key_id);

        if let Err(e) = write_private_file(&temp_path, key_data).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(io_error(key_id)(e));
        }

        let placed = if options.overwrite {
            tokio::fs::rename(&temp_path, &path).await
        } else {
            // Unlike rename, linking refuses to replace an existing key.
            let linked = tokio::fs::hard_link(&temp_path, &path).await;
            let _ = tokio::fs::remove_file(&temp_path).await;
            linked
        };

        if let Err(e) = placed {
            let _ = tokio::fs::remove_file(&temp_path).await;
            if e.kind() == ErrorKind::AlreadyExists {
                return Err(KeyStoreError::AlreadyExists(key_id.to_string()));
            }
            return Err(io_error(key_id)(e));
        }

        #[cfg(unix)]
        {
            let dir = tokio::fs::File::open(&self.dir).await.map_err(io_error(key_id))?;
            dir.sync_all().await.map_err(io_error(key_id))?;
        }
        Ok(())
    }

    async fn retrieve(&self, key_id: &str) -> KeyStoreResult<Option<Zeroizing<Vec<u8>>>> {
        let path = self.path_for(key_id)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(Zeroizing::new(data))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key_id)(e)),
        }
    }

    async fn delete(&self, key_id: &str) -> KeyStoreResult<()> {
        let path = self.path_for(key_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(KeyStoreError::NotFound(key_id.to_string()))
            }
            Err(e) => Err(io_error(key_id)(e)),
        }
    }

    async fn exists(&self, key_id: &str) -> KeyStoreResult<bool> {
        let path = self.path_for(key_id)?;
        tokio::fs::try_exists(&path).await.map_err(io_error(key_id))
    }

    async fn list_keys(&self) -> KeyStoreResult<Vec<String>> {
        let dir_label = self.dir.display().to_string();
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(io_error(&dir_label))?;

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_error(&dir_label))? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(KEY_FILE_EXTENSION) {
                continue;
            }
            if let Some(id) = path.file_stem().and_then(|s| s.to_str()) {
                if is_valid_key_id(id) {
                    ids.push(id.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
