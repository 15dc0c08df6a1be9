// src/storage/certificate_store.rs
//! Certificate record storage.
//!
//! Provides the [`CertificateStore`] contract consumed by issuance callers
//! and the verifier, with two implementations:
//! - [`FileCertificateStore`]: a single JSON document on disk, matching
//!   the published `{"certificates": [...]}` record format
//! - [`MemoryCertificateStore`]: in-memory store for tests and embedding
//!
//! The file store serializes every read-modify-write behind an internal
//! mutex and replaces the document atomically, so concurrent appends
//! cannot lose certificates and a crashed write cannot truncate the store.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::errors::StorageError;
use crate::models::certificate::Certificate;

/// Storage contract for issued certificates.
///
/// Append-only by design: records are never mutated or re-signed in
/// place. Lookup is by certificate id.
pub trait CertificateStore: Send + Sync {
    /// Appends a newly issued certificate to the store.
    fn append(&self, certificate: &Certificate) -> Result<(), StorageError>;

    /// Retrieves a certificate by its id.
    ///
    /// # Returns
    /// - `Ok(Some(certificate))` if a record with that id exists
    /// - `Ok(None)` if no record matches
    fn get_by_id(&self, id: &str) -> Result<Option<Certificate>, StorageError>;

    /// Returns all stored certificates in insertion order.
    fn get_all(&self) -> Result<Vec<Certificate>, StorageError>;
}

/// On-disk document shape of the file store.
#[derive(Serialize, Deserialize, Default)]
struct StoreDocument {
    certificates: Vec<Certificate>,
}

/// File-backed certificate store over a single pretty-printed JSON
/// document.
///
/// # Concurrency
/// The document is a shared resource under concurrent writers: every
/// append is a read-modify-write, so all operations take the internal
/// mutex and the document is replaced via temp file + rename.
pub struct FileCertificateStore {
    storage_path: PathBuf,
    lock: Mutex<()>,
}

impl FileCertificateStore {
    /// Opens the store at `storage_path`, creating the parent directory
    /// and an empty document if none exist yet.
    pub fn new(storage_path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage_path = storage_path.into();

        if let Some(dir) = storage_path.parent() {
            fs::create_dir_all(dir)?;
        }
        if !storage_path.exists() {
            let initial = serde_json::to_string_pretty(&StoreDocument::default())?;
            crate::utils::fs::atomic_write(&storage_path, initial.as_bytes())?;
            log::info!("certificate storage initialized at {}", storage_path.display());
        }

        Ok(FileCertificateStore {
            storage_path,
            lock: Mutex::new(()),
        })
    }

    fn read_document(&self) -> Result<StoreDocument, StorageError> {
        let raw = match fs::read_to_string(&self.storage_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(StoreDocument::default()),
            Err(e) => return Err(StorageError::Io(e)),
        };
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_document(&self, document: &StoreDocument) -> Result<(), StorageError> {
        let raw = serde_json::to_string_pretty(document)?;
        crate::utils::fs::atomic_write(&self.storage_path, raw.as_bytes())?;
        Ok(())
    }
}

impl CertificateStore for FileCertificateStore {
    fn append(&self, certificate: &Certificate) -> Result<(), StorageError> {
        let _guard = self.lock.lock().unwrap();

        let mut document = self.read_document()?;
        document.certificates.push(certificate.clone());
        self.write_document(&document)?;

        log::info!("certificate {} saved", certificate.id);
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Certificate>, StorageError> {
        let _guard = self.lock.lock().unwrap();
        let document = self.read_document()?;
        Ok(document
            .certificates
            .into_iter()
            .find(|certificate| certificate.id == id))
    }

    fn get_all(&self) -> Result<Vec<Certificate>, StorageError> {
        let _guard = self.lock.lock().unwrap();
        Ok(self.read_document()?.certificates)
    }
}

/// In-memory certificate store preserving insertion order.
#[allow(dead_code)]
#[derive(Default)]
pub struct MemoryCertificateStore {
    certificates: Mutex<Vec<Certificate>>,
}

#[allow(dead_code)]
impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored record with a matching id, returning whether
    /// one was found. Supports tamper-simulation in tests and
    /// record-correction tooling; the regular issuance path never
    /// rewrites records.
    pub fn replace(&self, certificate: Certificate) -> bool {
        let mut certificates = self.certificates.lock().unwrap();
        match certificates.iter_mut().find(|c| c.id == certificate.id) {
            Some(slot) => {
                *slot = certificate;
                true
            }
            None => false,
        }
    }
}

impl CertificateStore for MemoryCertificateStore {
    fn append(&self, certificate: &Certificate) -> Result<(), StorageError> {
        self.certificates
            .lock()
            .unwrap()
            .push(certificate.clone());
        Ok(())
    }

    fn get_by_id(&self, id: &str) -> Result<Option<Certificate>, StorageError> {
        Ok(self
            .certificates
            .lock()
            .unwrap()
            .iter()
            .find(|certificate| certificate.id == id)
            .cloned())
    }

    fn get_all(&self) -> Result<Vec<Certificate>, StorageError> {
        Ok(self.certificates.lock().unwrap().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn create_test_certificate(id: &str) -> Certificate {
        Certificate {
            id: id.to_string(),
            student_name: "Ada Lovelace".to_string(),
            cohort: "Cohort7".to_string(),
            issue_date: "2024-03-15T09:26:53.123Z".to_string(),
            issuer: "Bitcoin Dada & DadaDevs".to_string(),
            signature: "c2lnbmF0dXJl".to_string(),
        }
    }

    #[test]
    fn test_memory_store_append_and_lookup() {
        let store = MemoryCertificateStore::new();
        store.append(&create_test_certificate("cert-1")).unwrap();
        store.append(&create_test_certificate("cert-2")).unwrap();

        let found = store.get_by_id("cert-1").unwrap().unwrap();
        assert_eq!(found.id, "cert-1");
        assert!(store.get_by_id("cert-404").unwrap().is_none());

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "cert-1");
        assert_eq!(all[1].id, "cert-2");
    }

    #[test]
    fn test_file_store_initializes_missing_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data").join("certificates.json");

        let store = FileCertificateStore::new(&path).unwrap();
        assert!(path.exists());
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn test_file_store_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("certificates.json");

        let store = FileCertificateStore::new(&path).unwrap();
        store.append(&create_test_certificate("cert-1")).unwrap();
        drop(store);

        let reopened = FileCertificateStore::new(&path).unwrap();
        let found = reopened.get_by_id("cert-1").unwrap().unwrap();
        assert_eq!(found.student_name, "Ada Lovelace");
        assert_eq!(reopened.get_all().unwrap().len(), 1);
    }

    #[test]
    fn test_file_store_document_shape() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("certificates.json");

        let store = FileCertificateStore::new(&path).unwrap();
        store.append(&create_test_certificate("cert-1")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        let document: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let record = &document["certificates"][0];
        assert_eq!(record["id"], "cert-1");
        assert_eq!(record["studentName"], "Ada Lovelace");
        assert_eq!(record["issueDate"], "2024-03-15T09:26:53.123Z");
    }

    #[test]
    fn test_file_store_rejects_corrupt_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("certificates.json");

        let store = FileCertificateStore::new(&path).unwrap();
        fs::write(&path, "not json").unwrap();

        match store.get_all() {
            Err(StorageError::Corrupt(_)) => {}
            other => panic!("expected Corrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_memory_store_replace() {
        let store = MemoryCertificateStore::new();
        store.append(&create_test_certificate("cert-1")).unwrap();

        let mut altered = create_test_certificate("cert-1");
        altered.cohort = "Cohort8".to_string();
        assert!(store.replace(altered));
        assert_eq!(store.get_by_id("cert-1").unwrap().unwrap().cohort, "Cohort8");

        assert!(!store.replace(create_test_certificate("cert-404")));
    }
}
