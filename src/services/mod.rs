//! Certificate issuance and verification services.

pub mod certificate_generator;
pub mod certificate_verifier;
