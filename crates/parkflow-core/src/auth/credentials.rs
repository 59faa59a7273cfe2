use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use keyring::Entry;
use tracing::debug;

use super::storage::{SecretStorage, StorageError};

const SERVICE_NAME: &str = "parkflow";

/// Secret slots kept in the OS keychain, one keychain entry per slot.
pub struct KeyringStorage {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyringStorage {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name (separate profiles, tests)
    pub fn with_service(service: &str) -> Self {
        Self {
            service: service.to_string(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `f` against the keychain entry for `key`, creating it on first use.
    fn with_entry<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut entries = self.entries();
        if !entries.contains_key(key) {
            let entry = Entry::new(&self.service, key)?;
            entries.insert(key.to_string(), entry);
        }
        match entries.get(key) {
            Some(entry) => f(entry),
            None => Err(StorageError::Corrupt(format!("keychain entry {} vanished", key))),
        }
    }
}

impl Default for KeyringStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStorage for KeyringStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| {
            entry.set_password(value)?;
            debug!(slot = key, "Stored secret in keychain");
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Tests never touch the real keychain. The mock keeps values on the Entry
    // itself, so round trips rely on the per-slot entry cache.
    fn mock_storage(service: &str) -> KeyringStorage {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringStorage::with_service(service)
    }

    #[test]
    fn test_keyring_storage_round_trip() {
        let storage = mock_storage("parkflow-test");
        storage.write("authToken", "abc.def.ghi").unwrap();
        assert_eq!(storage.read("authToken").unwrap().as_deref(), Some("abc.def.ghi"));

        storage.remove("authToken").unwrap();
        assert_eq!(storage.read("authToken").unwrap(), None);
    }

    #[test]
    fn test_keyring_storage_remove_missing_is_ok() {
        let storage = mock_storage("parkflow-test-empty");
        assert!(storage.remove("authToken").is_ok());
    }

    #[test]
    fn test_keyring_storage_slots_are_independent() {
        let storage = mock_storage("parkflow-test-slots");
        storage.write("authToken", "abc.def.ghi").unwrap();
        storage.write("refresh", "other").unwrap();

        storage.remove("refresh").unwrap();
        assert_eq!(storage.read("authToken").unwrap().as_deref(), Some("abc.def.ghi"));
        assert_eq!(storage.read("refresh").unwrap(), None);
    }
}
