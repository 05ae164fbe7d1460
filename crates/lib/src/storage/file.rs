//! File-per-entry secret storage
//!
//! Each entry lives in `<dir>/<key>.secret`. Writes go through a temporary
//! sibling followed by `rename`, so a reader never observes a partial blob.
//! Directory and entries are created with owner-only permissions.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::{SecretStore, errors::StorageError, validate_store_key};
use crate::Result;

/// File suffix for stored entries.
const ENTRY_SUFFIX: &str = ".secret";

/// Suffix for in-flight writes, renamed over the entry on completion.
const TEMP_SUFFIX: &str = ".secret.tmp";

/// [`SecretStore`] backed by one file per entry.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory (mode `0o700`)
    /// if it does not exist.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        create_private_dir(&dir).map_err(|e| StorageError::Directory { source: e })?;
        Ok(Self { dir })
    }

    /// Root directory of this store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf> {
        validate_store_key(key)?;
        Ok(self.dir.join(format!("{key}{ENTRY_SUFFIX}")))
    }
}

impl SecretStore for FileStore {
    fn put(&self, key: &str, blob: &str) -> Result<()> {
        let path = self.entry_path(key)?;
        if path.exists() && !path.is_file() {
            return Err(StorageError::KeyCollision {
                key: key.to_string(),
            }
            .into());
        }

        let tmp = self.dir.join(format!("{key}{TEMP_SUFFIX}"));
        write_private_file(&tmp, blob.as_bytes()).map_err(|e| StorageError::Io {
            key: key.to_string(),
            source: e,
        })?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::Io {
            key: key.to_string(),
            source: e,
        })?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key)?;
        match fs::read_to_string(&path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }
            .into()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::Io {
                key: key.to_string(),
                source: e,
            }
            .into()),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StorageError::Directory { source: e })?;

        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::Directory { source: e })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // Skip temp files and anything foreign to the store
            if let Some(key) = name.strip_suffix(ENTRY_SUFFIX)
                && !name.ends_with(TEMP_SUFFIX)
                && validate_store_key(key).is_ok()
            {
                keys.push(key.to_string());
            }
        }
        Ok(keys)
    }

    fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.entry_path(key)?.is_file())
    }
}

#[cfg(unix)]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    match fs::DirBuilder::new().recursive(true).mode(0o700).create(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(not(unix))]
fn create_private_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn write_private_file(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("secrets")).unwrap();
        (dir, store)
    }

    #[test]
    fn test_put_get_delete() {
        let (_dir, store) = store();

        assert_eq!(store.get("api.key").unwrap(), None);
        store.put("api.key", "envelope-data").unwrap();
        assert_eq!(store.get("api.key").unwrap().as_deref(), Some("envelope-data"));
        assert!(store.exists("api.key").unwrap());

        assert!(store.delete("api.key").unwrap());
        assert!(!store.delete("api.key").unwrap());
        assert_eq!(store.get("api.key").unwrap(), None);
    }

    #[test]
    fn test_put_overwrites() {
        let (_dir, store) = store();
        store.put("k", "v1").unwrap();
        store.put("k", "v2").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));
    }

    #[test]
    fn test_list_round_trips_keys() {
        let (_dir, store) = store();
        store.put("alpha", "a").unwrap();
        store.put("beta.v2", "b").unwrap();
        store.put("gamma-3_x", "c").unwrap();

        let mut keys = store.list().unwrap();
        keys.sort();
        assert_eq!(keys, vec!["alpha", "beta.v2", "gamma-3_x"]);
    }

    #[test]
    fn test_list_ignores_foreign_files() {
        let (_dir, store) = store();
        store.put("real", "r").unwrap();
        fs::write(store.dir().join("stray.txt"), "x").unwrap();
        fs::write(store.dir().join("half.secret.tmp"), "x").unwrap();

        assert_eq!(store.list().unwrap(), vec!["real"]);
    }

    #[test]
    fn test_invalid_key_rejected() {
        let (_dir, store) = store();
        assert!(store.put("../escape", "v").is_err());
        assert!(store.get(".hidden").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_only_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let (_dir, store) = store();
        store.put("k", "v").unwrap();

        let dir_mode = fs::metadata(store.dir()).unwrap().permissions().mode();
        assert_eq!(dir_mode & 0o777, 0o700);

        let file_mode = fs::metadata(store.dir().join("k.secret"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(file_mode & 0o777, 0o600);
    }

    #[test]
    fn test_reopen_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets");
        {
            let store = FileStore::open(&path).unwrap();
            store.put("persist", "me").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("persist").unwrap().as_deref(), Some("me"));
    }
}
