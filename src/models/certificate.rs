// src/models/certificate.rs
//! Certificate data model implementation.
//!
//! Defines the core structures for tamper-evident completion certificates:
//! the signed [`Certificate`] record, the PEM [`KeyPair`] that signs and
//! verifies it, and the tri-state [`VerificationResult`].

use serde::{Deserialize, Serialize};

/// A signed completion certificate.
///
/// Represents a tamper-evident record asserting that a named student
/// completed a named cohort program. The record is authentic exactly when
/// `signature` verifies, under the issuer's public key, against the
/// canonical encoding recomputed from the record's own `id`,
/// `student_name`, `cohort`, and `issue_date` fields. Mutating any of
/// those fields after issuance without re-signing breaks the invariant
/// and is detected at verification time.
///
/// # Serialization
/// Serialized JSON uses camelCase field names (`studentName`, `issueDate`)
/// so stored records remain interchangeable with the published storage and
/// verification formats.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Unique identifier, UUID v4 textual form, generated at issuance
    /// Example: "123e4567-e89b-12d3-a456-426614174000"
    pub id: String,

    /// Full name of the student the certificate was issued to
    pub student_name: String,

    /// Name of the cohort program the student completed
    pub cohort: String,

    /// UTC issuance timestamp, ISO-8601 text with millisecond precision
    /// Example: "2024-03-15T09:26:53.123Z"
    pub issue_date: String,

    /// Fixed identifier of the signing authority
    pub issuer: String,

    /// Base64 RSA-SHA256 signature over the canonical encoding of the
    /// other content fields
    pub signature: String,
}

/// PEM-encoded RSA-2048 key material.
///
/// The private half is PKCS#8, the public half SPKI. A deployment creates
/// exactly one pair on first access and loads it unchanged thereafter;
/// the pair is owned by the key manager and handed out as read-only
/// references.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPair {
    /// SPKI PEM public key, used for signature verification
    pub public_key_pem: String,

    /// PKCS#8 PEM private key, used for signing
    pub private_key_pem: String,
}

/// Outcome of verifying a certificate id.
///
/// Always a structured value, never an error: the three terminal states
/// are *not found* (no record, `certificate` is `None`), *authentic*
/// (`valid` is true), and *tampered* (`valid` is false but the possibly
/// altered record is still returned so a caller can display what is on
/// file). Internal faults map to `valid: false` with a generic message.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VerificationResult {
    /// Whether the stored record's signature verified
    pub valid: bool,

    /// The record on file, when one exists for the requested id
    pub certificate: Option<Certificate>,

    /// Human-readable outcome description
    pub message: String,
}
