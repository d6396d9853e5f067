//! Injected key-value stores standing in for browser local/session storage

use crate::error::StorageError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// Every key this crate reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AuthToken,
    AuthUser,
    PremiumPopupSnoozeUntil,
    PremiumPopupShownThisSession,
}

impl StorageKey {
    pub const NAMESPACE: &'static str = "vnmarket";

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::AuthToken => "vnmarket.auth.token",
            StorageKey::AuthUser => "vnmarket.auth.user",
            StorageKey::PremiumPopupSnoozeUntil => "vnmarket.premium_popup.snooze_until",
            StorageKey::PremiumPopupShownThisSession => "vnmarket.premium_popup.shown",
        }
    }
}

/// String key-value store with explicit get/set/clear
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StorageKey) -> Option<String>;
    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError>;
    fn clear(&self, key: StorageKey) -> Result<(), StorageError>;
}

/// Volatile store; the session scope, and the local scope in tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<&'static str, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.as_str(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: StorageKey) -> Result<(), StorageError> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key.as_str());
        Ok(())
    }
}

/// JSON object on disk, rewritten on every change
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileStore {
    /// Open `path`, starting empty when the file does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.as_str().to_string(), value.to_string());
        self.persist(&entries)
    }

    fn clear(&self, key: StorageKey) -> Result<(), StorageError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key.as_str()).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_share_namespace() {
        for key in [
            StorageKey::AuthToken,
            StorageKey::AuthUser,
            StorageKey::PremiumPopupSnoozeUntil,
            StorageKey::PremiumPopupShownThisSession,
        ] {
            assert!(key.as_str().starts_with(StorageKey::NAMESPACE));
        }
    }

    #[test]
    fn test_memory_store_get_set_clear() {
        let store = MemoryStore::new();
        assert_eq!(store.get(StorageKey::AuthToken), None);

        store.set(StorageKey::AuthToken, "abc").unwrap();
        assert_eq!(store.get(StorageKey::AuthToken).as_deref(), Some("abc"));
        assert_eq!(store.len(), 1);

        store.clear(StorageKey::AuthToken).unwrap();
        assert!(store.is_empty());
        // clearing a missing key is fine
        store.clear(StorageKey::AuthToken).unwrap();
    }

    #[test]
    fn test_file_store_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::open(&path).unwrap();
        store.set(StorageKey::AuthToken, "token-1").unwrap();
        store.set(StorageKey::AuthUser, r#"{"id":1}"#).unwrap();
        drop(store);

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get(StorageKey::AuthToken).as_deref(), Some("token-1"));

        reopened.clear(StorageKey::AuthToken).unwrap();
        let again = FileStore::open(&path).unwrap();
        assert_eq!(again.get(StorageKey::AuthToken), None);
        assert!(again.get(StorageKey::AuthUser).is_some());
    }

    #[test]
    fn test_file_store_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        assert!(matches!(FileStore::open(&path), Err(StorageError::Encoding(_))));
    }
}
