//! File-backed key-value store.
//!
//! Each key is one file named after the key inside the store directory.
//! Writes land in a temporary file in the same directory and are renamed
//! over the target, so readers in other processes see the old or the new
//! record, never a torn one.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::trace;

use super::{KeyValueStore, validate_key};
use crate::error::{Result, StoreError};

/// A directory of records, shareable between processes.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the store directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(Self { dir })
    }

    /// The store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding `key`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidKey` if `key` is not a valid store key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(key))
    }

    /// The key stored at `path`, if `path` names a record file.
    ///
    /// Temporary files (dot-prefixed) and anything that is not a valid key
    /// map to `None`.
    #[must_use]
    pub fn key_for_path(path: &Path) -> Option<String> {
        let name = path.file_name()?.to_str()?;
        validate_key(name).ok()?;
        Some(name.to_string())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(path, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;

        let mut temp_file =
            NamedTempFile::new_in(&self.dir).map_err(|e| StoreError::io(&self.dir, e))?;
        temp_file
            .write_all(value.as_bytes())
            .and_then(|()| temp_file.as_file().sync_data())
            .map_err(|e| StoreError::io(temp_file.path(), e))?;

        temp_file
            .persist(&path)
            .map_err(|e| StoreError::io(&path, e.error))?;

        trace!(key, bytes = value.len(), "Record written");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_open_creates_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested/store");
        let store = FileStore::open(&dir).unwrap();
        assert!(store.dir().is_dir());
    }

    #[test]
    fn test_get_missing_is_none() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert_eq!(store.get("beelivery_cart_v1").unwrap(), None);
    }

    #[test]
    fn test_set_then_get() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.set("beelivery_theme_v1", "dark").unwrap();
        assert_eq!(
            store.get("beelivery_theme_v1").unwrap().as_deref(),
            Some("dark")
        );
        assert_eq!(
            fs::read_to_string(tmp.path().join("beelivery_theme_v1")).unwrap(),
            "dark"
        );
    }

    #[test]
    fn test_set_replaces_whole_record() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.set("cart", "[1,2,3,4,5,6,7,8,9]").unwrap();
        store.set("cart", "[]").unwrap();
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        store.set("cart", "[]").unwrap();
        store.set("theme", "light").unwrap();
        let names: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| !n.starts_with('.')));
    }

    #[test]
    fn test_invalid_key_never_escapes_directory() {
        let tmp = TempDir::new().unwrap();
        let store = FileStore::open(tmp.path()).unwrap();
        assert!(matches!(
            store.set("../outside", "x"),
            Err(StoreError::InvalidKey(_))
        ));
        assert!(store.get("../outside").is_err());
    }

    #[test]
    fn test_key_for_path() {
        assert_eq!(
            FileStore::key_for_path(Path::new("/data/beelivery_cart_v1")).as_deref(),
            Some("beelivery_cart_v1")
        );
        assert_eq!(FileStore::key_for_path(Path::new("/data/.tmpA1b2C3")), None);
        assert_eq!(FileStore::key_for_path(Path::new("/")), None);
    }
}
