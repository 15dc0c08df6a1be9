// src/keys/key_store.rs
//! Durable persistence for the signing key pair.
//!
//! Defines the narrow [`KeyStore`] contract the key manager consumes, with
//! two implementations:
//! - [`FileKeyStore`]: PEM files on disk (`private.pem` / `public.pem`)
//! - [`MemoryKeyStore`]: in-process stand-in for tests and embedding
//!
//! The contract's one subtlety is first-write atomicity: `write_new` must
//! admit exactly one winner among concurrent first-time writers, and a
//! partially written pair must never be observable as valid key material.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::errors::KeyError;
use crate::models::certificate::KeyPair;

/// Storage contract for the deployment's single RSA key pair.
///
/// `write_new` has create-or-fail semantics: when several callers race to
/// persist the first-ever pair, exactly one succeeds and the rest observe
/// [`KeyError::AlreadyExists`], after which they re-read and adopt the
/// winner's material. Both halves of the pair become visible together or
/// not at all.
pub trait KeyStore: Send + Sync {
    /// Reads the persisted key pair, if any.
    ///
    /// # Returns
    /// - `Ok(Some(pair))` when valid key material is on record
    /// - `Ok(None)` when no pair has been persisted yet
    /// - `Err(KeyError)` when material exists but is unreadable or corrupt
    fn read(&self) -> Result<Option<KeyPair>, KeyError>;

    /// Persists a freshly generated pair, failing if one already exists.
    fn write_new(&self, pair: &KeyPair) -> Result<(), KeyError>;
}

/// File-backed key store holding `private.pem` (PKCS#8) and `public.pem`
/// (SPKI) under a configured directory.
///
/// The commit point is the exclusive creation of `private.pem`: the one
/// writer that wins `create_new` owns the pair, and the public half is
/// written afterwards via temp file + rename. Since the public key is
/// derivable from the private key, a loader that finds a valid private
/// file but a missing or unreadable public file repairs it in place
/// rather than surfacing a partial state.
pub struct FileKeyStore {
    keys_dir: PathBuf,
}

impl FileKeyStore {
    /// Creates a store rooted at `keys_dir`. Nothing is touched on disk
    /// until the first read or write.
    pub fn new(keys_dir: impl Into<PathBuf>) -> Self {
        FileKeyStore {
            keys_dir: keys_dir.into(),
        }
    }

    fn private_key_path(&self) -> PathBuf {
        self.keys_dir.join("private.pem")
    }

    fn public_key_path(&self) -> PathBuf {
        self.keys_dir.join("public.pem")
    }

    /// Re-derives the SPKI PEM public key from a parsed private key.
    fn derive_public_pem(private_key: &RsaPrivateKey) -> Result<String, KeyError> {
        RsaPublicKey::from(private_key)
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(format!("public key encoding failed: {e}")))
    }
}

impl KeyStore for FileKeyStore {
    fn read(&self) -> Result<Option<KeyPair>, KeyError> {
        let private_pem = match fs::read_to_string(self.private_key_path()) {
            Ok(pem) => pem,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(KeyError::Io(e)),
        };

        let private_key = RsaPrivateKey::from_pkcs8_pem(&private_pem)
            .map_err(|e| KeyError::Corrupt(format!("private key: {e}")))?;

        // The public half is derivable, so a missing or unreadable
        // public.pem next to a valid private.pem is repaired rather than
        // reported: no partial write is ever observable as key material.
        let public_path = self.public_key_path();
        let public_pem = match fs::read_to_string(&public_path) {
            Ok(pem) => match RsaPublicKey::from_public_key_pem(&pem) {
                Ok(parsed) if parsed == RsaPublicKey::from(&private_key) => pem,
                _ => {
                    log::warn!(
                        "public key at {} is unreadable or mismatched; rewriting from private key",
                        public_path.display()
                    );
                    let derived = Self::derive_public_pem(&private_key)?;
                    crate::utils::fs::atomic_write(&public_path, derived.as_bytes())?;
                    derived
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                let derived = Self::derive_public_pem(&private_key)?;
                crate::utils::fs::atomic_write(&public_path, derived.as_bytes())?;
                derived
            }
            Err(e) => return Err(KeyError::Io(e)),
        };

        Ok(Some(KeyPair {
            public_key_pem: public_pem,
            private_key_pem: private_pem,
        }))
    }

    fn write_new(&self, pair: &KeyPair) -> Result<(), KeyError> {
        fs::create_dir_all(&self.keys_dir)?;

        // Exclusive create elects the single first writer.
        let mut private_file = match OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(self.private_key_path())
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(KeyError::AlreadyExists)
            }
            Err(e) => return Err(KeyError::Io(e)),
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = fs::Permissions::from_mode(0o600);
            private_file.set_permissions(perms)?;
        }

        private_file.write_all(pair.private_key_pem.as_bytes())?;
        private_file.sync_all()?;

        crate::utils::fs::atomic_write(&self.public_key_path(), pair.public_key_pem.as_bytes())?;

        log::info!("key pair persisted under {}", self.keys_dir.display());
        Ok(())
    }
}

/// In-memory key store with the same create-or-fail semantics as the
/// file store. Useful as a test stand-in and for embedded deployments
/// that manage durability themselves.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryKeyStore {
    slot: Mutex<Option<KeyPair>>,
}

#[allow(dead_code)]
impl MemoryKeyStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyStore for MemoryKeyStore {
    fn read(&self) -> Result<Option<KeyPair>, KeyError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn write_new(&self, pair: &KeyPair) -> Result<(), KeyError> {
        let mut slot = self.slot.lock().unwrap();
        if slot.is_some() {
            return Err(KeyError::AlreadyExists);
        }
        *slot = Some(pair.clone());
        Ok(())
    }
}

#[cfg(test)]
pub(crate) fn test_key_pair() -> KeyPair {
    use rsa::pkcs8::EncodePrivateKey;

    // 1024-bit keys keep test runs fast; production key size is chosen by
    // the key manager, not the store.
    let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), 1024)
        .expect("test key generation failed");
    let public_key = RsaPublicKey::from(&private_key);

    KeyPair {
        public_key_pem: public_key
            .to_public_key_pem(LineEnding::LF)
            .expect("public PEM encoding failed"),
        private_key_pem: private_key
            .to_pkcs8_pem(LineEnding::LF)
            .expect("private PEM encoding failed")
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_empty_store() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        assert!(store.read().unwrap().is_none());
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path().join("keys"));
        let pair = test_key_pair();

        store.write_new(&pair).unwrap();
        let loaded = store.read().unwrap().expect("pair should exist");

        assert_eq!(loaded.private_key_pem, pair.private_key_pem);
        assert_eq!(loaded.public_key_pem, pair.public_key_pem);
    }

    #[test]
    fn test_second_write_loses_race() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        store.write_new(&test_key_pair()).unwrap();

        match store.write_new(&test_key_pair()) {
            Err(KeyError::AlreadyExists) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_public_key_is_repaired() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        let pair = test_key_pair();
        store.write_new(&pair).unwrap();

        fs::remove_file(dir.path().join("public.pem")).unwrap();
        let loaded = store.read().unwrap().expect("pair should exist");

        assert_eq!(loaded.public_key_pem, pair.public_key_pem);
        assert!(dir.path().join("public.pem").exists());
    }

    #[test]
    fn test_corrupt_private_key_is_an_error() {
        let dir = tempdir().unwrap();
        let store = FileKeyStore::new(dir.path());
        store.write_new(&test_key_pair()).unwrap();

        fs::write(dir.path().join("private.pem"), "not a key").unwrap();
        match store.read() {
            Err(KeyError::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_memory_store_contract_parity() {
        let store = MemoryKeyStore::new();
        assert!(store.read().unwrap().is_none());

        let pair = test_key_pair();
        store.write_new(&pair).unwrap();
        assert_eq!(store.read().unwrap(), Some(pair.clone()));

        match store.write_new(&pair) {
            Err(KeyError::AlreadyExists) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }
}
