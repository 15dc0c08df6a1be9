// src/services/certificate_generator.rs
//! Certificate issuance service.
//!
//! Produces self-consistent, signed certificate records: a fresh unique
//! id, the issuance timestamp, the fixed issuer, and an RSA-SHA256
//! signature over the canonical encoding of the content fields. The
//! returned certificate always verifies against the current public key
//! at the moment of issuance.
//!
//! Persisting the record is the caller's responsibility; issuance has
//! no side effects beyond reading key material.

use chrono::{SecondsFormat, Utc};
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::sha2::Sha256;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use uuid::Uuid;

use crate::errors::{IssueError, SigningError};
use crate::keys::key_manager::KeyManager;
use crate::models::certificate::Certificate;
use crate::utils::canonical::{canonical_string, DELIMITER};

/// Fixed identifier of the signing authority, stamped on every issued
/// certificate.
pub const ISSUER: &str = "Bitcoin Dada & DadaDevs";

/// Upper bound on the length of the student name and cohort fields, in
/// characters. The request layer validates first; the generator enforces
/// the bound again so an unvalidated caller cannot produce oversized
/// records.
pub const MAX_FIELD_LENGTH: usize = 100;

/// Service that issues signed certificates.
pub struct CertificateGenerator<'a> {
    /// Read-only access to the deployment's signing key material
    key_manager: &'a KeyManager,
}

impl<'a> CertificateGenerator<'a> {
    /// Creates a generator over an initialized key manager.
    pub fn new(key_manager: &'a KeyManager) -> Self {
        CertificateGenerator { key_manager }
    }

    /// Issues a new signed certificate for `student_name` in `cohort`.
    ///
    /// # Arguments
    /// * `student_name` - Student the certificate is issued to
    /// * `cohort` - Cohort program the student completed
    ///
    /// # Returns
    /// A fully populated [`Certificate`] with a fresh UUID v4 id, the
    /// current UTC issue date, the fixed issuer, and a base64 RSA-SHA256
    /// signature over the canonical field encoding.
    ///
    /// # Errors
    /// - [`IssueError::InvalidField`] when a field is empty, exceeds
    ///   [`MAX_FIELD_LENGTH`], or contains the canonical delimiter
    /// - [`IssueError::Key`] when key material is unavailable
    /// - [`IssueError::Signing`] when the signing operation fails
    pub fn issue(&self, student_name: &str, cohort: &str) -> Result<Certificate, IssueError> {
        Self::validate_field("studentName", student_name)?;
        Self::validate_field("cohort", cohort)?;

        let id = Uuid::new_v4().to_string();
        let issue_date = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);

        let canonical = canonical_string(&id, student_name, cohort, &issue_date);
        let signature = self.sign(canonical.as_bytes())?;

        log::info!("issued certificate {id} for {student_name}, cohort {cohort}");

        Ok(Certificate {
            id,
            student_name: student_name.to_string(),
            cohort: cohort.to_string(),
            issue_date,
            issuer: ISSUER.to_string(),
            signature,
        })
    }

    /// Signs `message` with RSA-SHA256 (PKCS#1 v1.5) and returns the
    /// signature as base64 text.
    fn sign(&self, message: &[u8]) -> Result<String, IssueError> {
        let private_key_pem = self.key_manager.private_key_pem()?;
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| SigningError::UnusableKey(e.to_string()))?;

        let signing_key = SigningKey::<Sha256>::new(private_key);
        let signature = signing_key
            .try_sign(message)
            .map_err(|e| SigningError::Failed(e.to_string()))?;

        Ok(base64::encode(signature.to_bytes()))
    }

    fn validate_field(field: &'static str, value: &str) -> Result<(), IssueError> {
        if value.trim().is_empty() {
            return Err(IssueError::InvalidField {
                field,
                reason: "must not be empty".to_string(),
            });
        }
        if value.chars().count() > MAX_FIELD_LENGTH {
            return Err(IssueError::InvalidField {
                field,
                reason: format!("exceeds {MAX_FIELD_LENGTH} characters"),
            });
        }
        if value.contains(DELIMITER) {
            return Err(IssueError::InvalidField {
                field,
                reason: format!("must not contain '{DELIMITER}'"),
            });
        }
        Ok(())
    }
}
