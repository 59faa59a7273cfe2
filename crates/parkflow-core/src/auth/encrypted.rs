//! Encrypted on-disk secret slots.
//!
//! Each slot is a file `<dir>/<slot>.bin` holding a random 12-byte nonce
//! followed by the ChaCha20-Poly1305 ciphertext. The 32-byte key is derived
//! from a passphrase with Argon2 and a per-directory random salt kept in
//! `<dir>/store.salt`.

use std::path::{Path, PathBuf};

use argon2::Argon2;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use tracing::debug;

use super::storage::{SecretStorage, StorageError};

const SALT_FILE: &str = "store.salt";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

pub struct EncryptedFileStorage {
    dir: PathBuf,
    cipher: ChaCha20Poly1305,
}

impl EncryptedFileStorage {
    /// Open (or initialize) an encrypted store in `dir`.
    pub fn open(dir: impl Into<PathBuf>, passphrase: &str) -> Result<Self, StorageError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;

        let salt = Self::load_or_create_salt(&dir)?;
        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(passphrase.as_bytes(), &salt, &mut key)
            .map_err(|e| StorageError::Crypto(e.to_string()))?;

        Ok(Self {
            dir,
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key)),
        })
    }

    fn load_or_create_salt(dir: &Path) -> Result<Vec<u8>, StorageError> {
        let path = dir.join(SALT_FILE);
        if path.exists() {
            let salt = std::fs::read(&path)?;
            if salt.len() != SALT_LEN {
                return Err(StorageError::Corrupt(format!(
                    "salt file has {} bytes, expected {}",
                    salt.len(),
                    SALT_LEN
                )));
            }
            return Ok(salt);
        }

        let mut salt = vec![0u8; SALT_LEN];
        rand::thread_rng().fill_bytes(&mut salt);
        std::fs::write(&path, &salt)?;
        debug!(path = %path.display(), "Created secret store salt");
        Ok(salt)
    }

    fn slot_path(&self, key: &str) -> PathBuf {
        // Slot names are fixed identifiers; keep them filesystem-safe anyway
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.bin", name))
    }
}

impl SecretStorage for EncryptedFileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(key);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read(&path)?;
        if contents.len() < NONCE_LEN {
            return Err(StorageError::Corrupt(format!("{} is truncated", path.display())));
        }
        let (nonce, ciphertext) = contents.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| StorageError::Crypto("decryption failed (wrong passphrase?)".to_string()))?;

        String::from_utf8(plaintext)
            .map(Some)
            .map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), value.as_bytes())
            .map_err(|_| StorageError::Crypto("encryption failed".to_string()))?;

        let mut contents = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        contents.extend_from_slice(&nonce);
        contents.extend_from_slice(&ciphertext);
        std::fs::write(self.slot_path(key), contents)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.slot_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
