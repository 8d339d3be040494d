//! Credential cache persistence
//!
//! Stores the [`CredentialStore`] in a versioned JSON file so credentials
//! resolved in one run can be listed, annotated or reused in the next.

use crate::credential::{Credential, CredentialStore};
use crate::error::{CloudError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

const CACHE_VERSION: u32 = 1;
const CACHE_FILE: &str = "credentials.json";
const CACHE_TMP: &str = "credentials.json.tmp";
/// Left behind by older releases; removed on save
const LEGACY_BACKUP: &str = "credentials.json.backup";
/// Owner read/write only
#[cfg(unix)]
const CACHE_MODE: u32 = 0o600;

#[derive(Debug, Serialize, Deserialize)]
struct CacheFile {
    version: u32,
    updated_at: DateTime<Utc>,
    credentials: Vec<Credential>,
}

/// Reads and writes the credential cache file
pub struct CredentialCache {
    dir: PathBuf,
}

impl CredentialCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CACHE_FILE)
    }

    fn tmp_path(&self) -> PathBuf {
        self.dir.join(CACHE_TMP)
    }

    /// Load the cached store, or an empty one if no cache exists yet
    pub async fn load(&self) -> Result<CredentialStore> {
        let path = self.path();
        if !path.exists() {
            tracing::debug!("Credential cache not found, starting empty");
            return Ok(CredentialStore::new());
        }

        let content = fs::read_to_string(&path).await?;
        let file: CacheFile = serde_json::from_str(&content)?;

        if file.version > CACHE_VERSION {
            return Err(CloudError::CacheError(format!(
                "cache file version {} is newer than supported version {}",
                file.version, CACHE_VERSION
            )));
        }

        tracing::debug!("Loaded {} cached credentials", file.credentials.len());
        Ok(CredentialStore::from_credentials(file.credentials))
    }

    /// Save the store, replacing the previous file atomically.
    ///
    /// The new content goes to a temporary file created owner-only, which is
    /// then renamed over the cache. No copy of the old content is kept, so a
    /// deleted credential is gone from disk after the next save.
    pub async fn save(&self, store: &CredentialStore) -> Result<()> {
        if !self.dir.exists() {
            fs::create_dir_all(&self.dir).await?;
        }

        let file = CacheFile {
            version: CACHE_VERSION,
            updated_at: Utc::now(),
            credentials: store.iter().cloned().collect(),
        };
        let content = serde_json::to_string_pretty(&file)?;

        let tmp = self.tmp_path();
        if tmp.exists() {
            fs::remove_file(&tmp).await?;
        }
        write_private(&tmp, content.as_bytes()).await?;
        fs::rename(&tmp, self.path()).await?;

        let legacy = self.dir.join(LEGACY_BACKUP);
        if legacy.exists() {
            fs::remove_file(&legacy).await?;
        }

        tracing::debug!("Saved {} cached credentials", store.len());
        Ok(())
    }
}

/// Create `path` readable only by its owner and write `bytes` to it
async fn write_private(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(CACHE_MODE);

    let mut file = options.open(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;

    // open mode is filtered by umask; pin the exact bits
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, std::fs::Permissions::from_mode(CACHE_MODE)).await?;
    }
    Ok(())
}
