// src/errors.rs
//! Error types for the certificate signature system.
//!
//! The taxonomy follows the failure domains of the system:
//! - [`KeyError`]: key material missing, corrupt, or unwritable. Fatal:
//!   no certificate operation can proceed without valid keys
//! - [`SigningError`]: the cryptographic signing operation itself failed
//! - [`StorageError`]: certificate store read/write failures
//! - [`IssueError`]: everything that can abort an issuance request
//!
//! Verification outcomes (not found / tampered / authentic) are *not*
//! errors. They are expected results carried by
//! [`VerificationResult`](crate::models::certificate::VerificationResult).

use thiserror::Error;

/// Errors in the RSA key pair lifecycle.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Key material was requested before `ensure_key_pair` completed.
    #[error("key pair has not been initialized")]
    NotInitialized,

    /// Persisted key material exists but cannot be parsed.
    #[error("corrupt key material: {0}")]
    Corrupt(String),

    /// Another process won the first-writer race for key generation.
    ///
    /// Internal to the key store contract: callers resolve it by
    /// re-reading the winner's material, so it never reaches users.
    #[error("key material already exists")]
    AlreadyExists,

    /// Key generation or PEM encoding failed.
    #[error("key generation failed: {0}")]
    Generation(String),

    /// Reading or writing the persisted key files failed.
    #[error("key storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The signing operation failed given otherwise-valid inputs and keys.
#[derive(Debug, Error)]
pub enum SigningError {
    /// The private key PEM could not be parsed into a usable signing key.
    #[error("unusable private key: {0}")]
    UnusableKey(String),

    /// The RSA signing primitive itself reported a failure.
    #[error("signature generation failed: {0}")]
    Failed(String),
}

/// Certificate store read/write failures.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store file or directory could not be read or written.
    #[error("certificate storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The store document is not valid JSON of the expected shape.
    #[error("corrupt certificate store: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Errors that abort a certificate issuance request.
#[derive(Debug, Error)]
pub enum IssueError {
    /// A request field violates the bounds the generator enforces.
    #[error("invalid {field}: {reason}")]
    InvalidField {
        field: &'static str,
        reason: String,
    },

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Signing(#[from] SigningError),
}
