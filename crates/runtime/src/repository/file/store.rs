//! File-backed key-value store.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::repository::error::{RepositoryError, Result};
use crate::repository::traits::KeyValueStore;

/// One JSON file per key under a base directory.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// never leaves a half-written value behind.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    /// Store under the platform data directory (`.../gipie/storage`).
    pub fn in_data_dir() -> Result<Self> {
        let dirs = ProjectDirs::from("xyz", "gipiecoin", "gipie").ok_or(RepositoryError::NoDataDir)?;
        Self::new(dirs.data_dir().join("storage"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn key_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path)?;
        tracing::debug!("Loaded {} from {}", key, path.display());
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        let temp_path = path.with_extension("json.tmp");

        fs::write(&temp_path, value)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved {} to {}", key, path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.key_path(key);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted {}", key);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn set_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        assert_eq!(store.get("lastWalletConnection").unwrap(), None);
        store.set("lastWalletConnection", "{\"a\":1}").unwrap();
        assert_eq!(
            store.get("lastWalletConnection").unwrap().as_deref(),
            Some("{\"a\":1}")
        );

        store.remove("lastWalletConnection").unwrap();
        store.remove("lastWalletConnection").unwrap();
        assert_eq!(store.get("lastWalletConnection").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::new(dir.path()).unwrap();

        store.set("rollHistory_0xAb/../x", "[]").unwrap();
        assert!(dir.path().join("rollHistory_0xAb____x.json").exists());
        assert!(!dir.path().join("rollHistory_0xAb____x.json.tmp").exists());
    }
}
