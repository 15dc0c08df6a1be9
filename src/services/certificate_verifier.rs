// src/services/certificate_verifier.rs
//! Certificate verification service.
//!
//! Determines the authenticity of a previously issued certificate by id.
//! The outcome is always a structured [`VerificationResult`] with three
//! terminal states (not found, tampered, authentic) and never an error:
//! verification mismatches are the intended product of this service, and
//! internal faults (unreadable keys, malformed signature bytes, store
//! failures) are mapped to a generic error-occurred result rather than
//! propagated.
//!
//! The operation is pure and read-only over the store and key material.

use std::error::Error;

use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::sha2::Sha256;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;

use crate::keys::key_manager::KeyManager;
use crate::models::certificate::{Certificate, VerificationResult};
use crate::storage::certificate_store::CertificateStore;
use crate::utils::canonical::canonical_string;

/// Result message for an id with no record on file.
pub const MSG_NOT_FOUND: &str = "Certificate not found";
/// Result message for a record whose signature verified.
pub const MSG_AUTHENTIC: &str = "Certificate is authentic";
/// Result message for a record whose signature did not verify.
pub const MSG_TAMPERED: &str = "Certificate has been tampered with";
/// Result message when verification could not be carried out.
pub const MSG_ERROR: &str = "Verification error occurred";

/// Service that verifies stored certificates.
pub struct CertificateVerifier<'a> {
    /// Read-only access to the deployment's public key material
    key_manager: &'a KeyManager,
    /// Store the records to verify are fetched from
    store: &'a dyn CertificateStore,
}

impl<'a> CertificateVerifier<'a> {
    /// Creates a verifier over an initialized key manager and a
    /// certificate store.
    pub fn new(key_manager: &'a KeyManager, store: &'a dyn CertificateStore) -> Self {
        CertificateVerifier { key_manager, store }
    }

    /// Verifies the certificate stored under `certificate_id`.
    ///
    /// # Algorithm
    /// 1. Fetch the record by id; no record → not found
    /// 2. Recompute the canonical encoding from the record's own stored
    ///    fields
    /// 3. Verify the base64 RSA-SHA256 signature against it under the
    ///    issuer's public key
    ///
    /// A record that fails signature verification is still returned in
    /// the result so a caller can display what is on file.
    pub fn verify(&self, certificate_id: &str) -> VerificationResult {
        let certificate = match self.store.get_by_id(certificate_id) {
            Ok(Some(certificate)) => certificate,
            Ok(None) => {
                return VerificationResult {
                    valid: false,
                    certificate: None,
                    message: MSG_NOT_FOUND.to_string(),
                }
            }
            Err(e) => {
                log::error!("store lookup failed for certificate {certificate_id}: {e}");
                return VerificationResult {
                    valid: false,
                    certificate: None,
                    message: MSG_ERROR.to_string(),
                };
            }
        };

        match self.check_signature(&certificate) {
            Ok(true) => VerificationResult {
                valid: true,
                certificate: Some(certificate),
                message: MSG_AUTHENTIC.to_string(),
            },
            Ok(false) => VerificationResult {
                valid: false,
                certificate: Some(certificate),
                message: MSG_TAMPERED.to_string(),
            },
            Err(e) => {
                log::error!("error verifying certificate {certificate_id}: {e}");
                VerificationResult {
                    valid: false,
                    certificate: Some(certificate),
                    message: MSG_ERROR.to_string(),
                }
            }
        }
    }

    /// Checks the record's signature against the canonical encoding
    /// recomputed from its own stored fields.
    ///
    /// # Returns
    /// - `Ok(true)` / `Ok(false)` for a signature that could be checked
    /// - `Err` for faults that prevent checking at all (unavailable or
    ///   unparsable public key, undecodable signature bytes)
    fn check_signature(&self, certificate: &Certificate) -> Result<bool, Box<dyn Error>> {
        let canonical = canonical_string(
            &certificate.id,
            &certificate.student_name,
            &certificate.cohort,
            &certificate.issue_date,
        );

        let public_key = RsaPublicKey::from_public_key_pem(self.key_manager.public_key_pem()?)?;
        let verifying_key = VerifyingKey::<Sha256>::new(public_key);

        let signature_bytes = base64::decode(&certificate.signature)?;
        let signature = Signature::try_from(signature_bytes.as_slice())?;

        Ok(verifying_key
            .verify(canonical.as_bytes(), &signature)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::key_store::{test_key_pair, KeyStore, MemoryKeyStore};
    use crate::services::certificate_generator::CertificateGenerator;
    use crate::storage::certificate_store::MemoryCertificateStore;

    fn initialized_key_manager() -> KeyManager {
        let store = MemoryKeyStore::new();
        store.write_new(&test_key_pair()).unwrap();
        let mut manager = KeyManager::new(Box::new(store));
        manager.ensure_key_pair().unwrap();
        manager
    }

    fn issue_into(
        manager: &KeyManager,
        store: &MemoryCertificateStore,
        student_name: &str,
        cohort: &str,
    ) -> Certificate {
        let certificate = CertificateGenerator::new(manager)
            .issue(student_name, cohort)
            .unwrap();
        store.append(&certificate).unwrap();
        certificate
    }

    #[test]
    fn test_round_trip_is_authentic() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let certificate = issue_into(&manager, &store, "Ada Lovelace", "Cohort7");

        let result = CertificateVerifier::new(&manager, &store).verify(&certificate.id);

        assert!(result.valid);
        assert_eq!(result.message, MSG_AUTHENTIC);
        assert_eq!(result.certificate, Some(certificate));
    }

    #[test]
    fn test_unknown_id_is_not_found() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();

        let result = CertificateVerifier::new(&manager, &store)
            .verify("00000000-0000-4000-8000-000000000000");

        assert!(!result.valid);
        assert!(result.certificate.is_none());
        assert_eq!(result.message, MSG_NOT_FOUND);
    }

    #[test]
    fn test_mutating_any_field_is_detected() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let verifier = CertificateVerifier::new(&manager, &store);
        let certificate = issue_into(&manager, &store, "Ada", "Cohort7");

        let mutations: Vec<Box<dyn Fn(&mut Certificate)>> = vec![
            Box::new(|c| c.student_name = "Eve".to_string()),
            Box::new(|c| c.cohort = "Cohort8".to_string()),
            Box::new(|c| c.issue_date = "2020-01-01T00:00:00.000Z".to_string()),
        ];

        for mutate in mutations {
            let mut altered = certificate.clone();
            mutate(&mut altered);
            assert!(store.replace(altered.clone()));

            let result = verifier.verify(&certificate.id);
            assert!(!result.valid);
            assert_eq!(result.message, MSG_TAMPERED);
            // The altered record is still returned for display.
            assert_eq!(result.certificate, Some(altered));

            assert!(store.replace(certificate.clone()));
        }
    }

    #[test]
    fn test_mutated_id_no_longer_verifies() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let certificate = issue_into(&manager, &store, "Ada", "Cohort7");

        // Re-file the record under a different id: the signature no
        // longer binds the stored fields.
        let mut altered = certificate.clone();
        altered.id = "11111111-1111-4111-8111-111111111111".to_string();
        let altered_store = MemoryCertificateStore::new();
        altered_store.append(&altered).unwrap();

        let result = CertificateVerifier::new(&manager, &altered_store).verify(&altered.id);
        assert!(!result.valid);
        assert_eq!(result.message, MSG_TAMPERED);
    }

    #[test]
    fn test_cross_key_rejection() {
        let signing_manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let certificate = issue_into(&signing_manager, &store, "Ada", "Cohort7");

        let other_manager = initialized_key_manager();
        let result = CertificateVerifier::new(&other_manager, &store).verify(&certificate.id);

        assert!(!result.valid);
        assert_eq!(result.message, MSG_TAMPERED);
    }

    #[test]
    fn test_malformed_signature_reports_error_not_panic() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let certificate = issue_into(&manager, &store, "Ada", "Cohort7");

        let mut altered = certificate.clone();
        altered.signature = "%%% not base64 %%%".to_string();
        assert!(store.replace(altered));

        let result = CertificateVerifier::new(&manager, &store).verify(&certificate.id);
        assert!(!result.valid);
        assert_eq!(result.message, MSG_ERROR);
        assert!(result.certificate.is_some());
    }

    #[test]
    fn test_verification_without_keys_reports_error() {
        let uninitialized = KeyManager::new(Box::new(MemoryKeyStore::new()));
        let signing_manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let certificate = issue_into(&signing_manager, &store, "Ada", "Cohort7");

        let result = CertificateVerifier::new(&uninitialized, &store).verify(&certificate.id);
        assert!(!result.valid);
        assert_eq!(result.message, MSG_ERROR);
    }

    #[test]
    fn test_issue_then_tamper_scenario() {
        let manager = initialized_key_manager();
        let store = MemoryCertificateStore::new();
        let verifier = CertificateVerifier::new(&manager, &store);

        let certificate = issue_into(&manager, &store, "Ada", "Cohort7");
        assert_eq!(certificate.issuer, "Bitcoin Dada & DadaDevs");

        let authentic = verifier.verify(&certificate.id);
        assert!(authentic.valid);
        assert_eq!(authentic.message, MSG_AUTHENTIC);

        let mut altered = certificate.clone();
        altered.cohort = "Cohort8".to_string();
        assert!(store.replace(altered.clone()));

        let tampered = verifier.verify(&certificate.id);
        assert!(!tampered.valid);
        assert_eq!(tampered.message, MSG_TAMPERED);
        assert_eq!(tampered.certificate, Some(altered));
    }
}
