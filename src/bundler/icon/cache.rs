//! Content-addressed cache of composed volume icons.
//!
//! Keys hash the app icon and the template together, so a change to either
//! input produces a new entry. Only successfully composed icons are stored.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::bundler::{
    error::{ErrorExt, Result},
    utils::fs,
};

/// Prefix shared by every cache key.
const KEY_PREFIX: &str = "dmg-icon-";

/// Directory-backed icon cache.
#[derive(Clone, Debug)]
pub struct IconCache {
    dir: PathBuf,
}

impl IconCache {
    /// Cache rooted at `dir`. The directory is created on first store.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        IconCache { dir: dir.into() }
    }

    /// Platform cache directory, e.g. `~/Library/Caches/dmg_bundler/icons`.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|dir| dir.join("dmg_bundler").join("icons"))
    }

    /// Root directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Key for the pair of input files, `dmg-icon-<sha256>`.
    pub async fn key(app_icon: &Path, template_icon: &Path) -> Result<String> {
        let mut hasher = Sha256::new();
        for path in [app_icon, template_icon] {
            let data = tokio::fs::read(path)
                .await
                .fs_context("reading icon for cache key", path)?;
            // Length prefix keeps ("ab", "c") and ("a", "bc") apart.
            hasher.update((data.len() as u64).to_be_bytes());
            hasher.update(&data);
        }
        Ok(format!("{KEY_PREFIX}{}", hex::encode(hasher.finalize())))
    }

    fn entry(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.icns"))
    }

    /// Copy the cached icon for `key` to `destination`. Returns `false` on a miss.
    pub async fn restore(&self, key: &str, destination: &Path) -> Result<bool> {
        let entry = self.entry(key);
        if !entry.is_file() {
            log::debug!("icon cache miss for {}", key);
            return Ok(false);
        }

        fs::copy_file(&entry, destination).await?;
        log::info!("retrieved icon from cache");
        Ok(true)
    }

    /// Save `source` under `key`, replacing any previous entry.
    pub async fn store(&self, key: &str, source: &Path) -> Result<()> {
        let entry = self.entry(key);
        let partial = entry.with_extension("icns.partial");
        fs::copy_file(source, &partial).await?;
        tokio::fs::rename(&partial, &entry)
            .await
            .fs_context("saving icon cache entry", &entry)?;
        log::debug!("stored icon in cache: {}", entry.display());
        Ok(())
    }
}
