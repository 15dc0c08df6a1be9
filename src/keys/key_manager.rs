// src/keys/key_manager.rs
//! RSA key pair lifecycle management.
//!
//! Guarantees that exactly one durable RSA-2048 key pair exists per
//! deployment and exposes it to the issuance and verification services:
//! the first access that finds no persisted material generates and
//! persists a fresh pair, every later access loads it unchanged. Keys are
//! never rotated or regenerated automatically.

use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

use crate::errors::KeyError;
use crate::keys::key_store::KeyStore;
use crate::models::certificate::KeyPair;

/// RSA modulus size for generated key pairs, in bits.
const RSA_KEY_SIZE: usize = 2048;

/// Owner of the deployment's signing key pair.
///
/// Holds the PEM material in memory after a successful
/// [`ensure_key_pair`](KeyManager::ensure_key_pair); the generator and
/// verifier borrow it read-only. Construct one instance at startup and
/// pass it by reference: the manager is the single owner of key
/// material.
///
/// # Lifecycle
/// 1. `ensure_key_pair` loads persisted keys, or generates and persists
///    a fresh pair exactly once (concurrent first accesses are resolved
///    by the store's exclusive-create semantics: losers adopt the
///    winner's material)
/// 2. `public_key_pem` / `private_key_pem` hand out the cached material,
///    failing with [`KeyError::NotInitialized`] before step 1 completes
pub struct KeyManager {
    store: Box<dyn KeyStore>,
    key_pair: Option<KeyPair>,
}

impl KeyManager {
    /// Creates a manager over the given key store. No key material is
    /// loaded or generated until `ensure_key_pair` runs.
    pub fn new(store: Box<dyn KeyStore>) -> Self {
        KeyManager {
            store,
            key_pair: None,
        }
    }

    /// Loads the persisted key pair, generating and persisting a fresh
    /// RSA-2048 pair if none exists yet.
    ///
    /// Idempotent: repeated calls, including across process restarts,
    /// return byte-identical key material as long as the persisted files
    /// are untouched.
    ///
    /// # Errors
    /// [`KeyError`] when persisted material is unreadable or corrupt, or
    /// when the store location cannot be written on first generation.
    /// Both are fatal: no certificate operation may proceed without keys.
    pub fn ensure_key_pair(&mut self) -> Result<(), KeyError> {
        if self.key_pair.is_some() {
            return Ok(());
        }

        if let Some(pair) = self.store.read()? {
            log::info!("loaded existing key pair");
            self.key_pair = Some(pair);
            return Ok(());
        }

        log::info!("no persisted keys found, generating new RSA-{RSA_KEY_SIZE} key pair");
        let pair = Self::generate_key_pair()?;

        match self.store.write_new(&pair) {
            Ok(()) => {
                self.key_pair = Some(pair);
                Ok(())
            }
            // Another process persisted a pair between our read and
            // write. Its material is the durable one; adopt it.
            Err(KeyError::AlreadyExists) => match self.store.read()? {
                Some(winner) => {
                    log::info!("lost key initialization race, adopting persisted pair");
                    self.key_pair = Some(winner);
                    Ok(())
                }
                None => Err(KeyError::Corrupt(
                    "key material disappeared after lost initialization race".to_string(),
                )),
            },
            Err(e) => Err(e),
        }
    }

    /// Returns the SPKI PEM public key.
    ///
    /// # Errors
    /// [`KeyError::NotInitialized`] if `ensure_key_pair` has not
    /// completed successfully.
    pub fn public_key_pem(&self) -> Result<&str, KeyError> {
        self.key_pair
            .as_ref()
            .map(|pair| pair.public_key_pem.as_str())
            .ok_or(KeyError::NotInitialized)
    }

    /// Returns the PKCS#8 PEM private key.
    ///
    /// # Errors
    /// [`KeyError::NotInitialized`] if `ensure_key_pair` has not
    /// completed successfully.
    pub fn private_key_pem(&self) -> Result<&str, KeyError> {
        self.key_pair
            .as_ref()
            .map(|pair| pair.private_key_pem.as_str())
            .ok_or(KeyError::NotInitialized)
    }

    fn generate_key_pair() -> Result<KeyPair, KeyError> {
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_SIZE)
            .map_err(|e| KeyError::Generation(format!("RSA key generation failed: {e}")))?;
        let public_key = RsaPublicKey::from(&private_key);

        let private_key_pem = private_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(format!("private key encoding failed: {e}")))?
            .to_string();
        let public_key_pem = public_key
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::Generation(format!("public key encoding failed: {e}")))?;

        Ok(KeyPair {
            public_key_pem,
            private_key_pem,
        })
    }
}
