// src/main.rs

//! # Certificate Signature System - Main Entry Point
//!
//! This binary wires the core components together and exposes the
//! issuance and verification operations as subcommands.
//!
//! ## Architecture Overview
//! 1. **Key Layer**: `KeyManager` over a `FileKeyStore` for the RSA-2048
//!    generate-once / load-thereafter lifecycle
//! 2. **Services Layer**: Certificate issuance and verification
//! 3. **Storage Layer**: JSON-document certificate store
//!
//! ## Environment Variables
//! - `CERT_KEYS_DIR`: (Optional) key directory (default: ./keys)
//! - `CERT_STORAGE_PATH`: (Optional) certificate store path
//!   (default: ./data/certificates.json)

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use dotenv::dotenv;

use crate::config::Settings;
use crate::keys::key_manager::KeyManager;
use crate::keys::key_store::FileKeyStore;
use crate::services::certificate_generator::{CertificateGenerator, MAX_FIELD_LENGTH};
use crate::services::certificate_verifier::CertificateVerifier;
use crate::storage::certificate_store::{CertificateStore, FileCertificateStore};

// Module declarations (organized by functional domain)
mod config; // Runtime settings
mod errors; // Error taxonomy
mod keys; // Key pair lifecycle and persistence
mod models; // Data structures
mod services; // Issuance and verification
mod storage; // Certificate record storage
mod utils; // Helper functions

/// Issues and verifies tamper-evident completion certificates.
#[derive(Parser)]
#[command(name = "certificate-system", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a new signed certificate and persist it
    Issue {
        /// Full name of the student
        student_name: String,
        /// Cohort program the student completed
        cohort: String,
    },
    /// Verify a stored certificate by id
    Verify {
        /// Certificate id (UUID) to verify
        id: String,
    },
    /// List all stored certificates
    List,
}

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    let settings = Settings::load().context("failed to load configuration")?;

    // Initialize core components: the key manager owns the deployment's
    // key material; services borrow it read-only.
    let mut key_manager = KeyManager::new(Box::new(FileKeyStore::new(&settings.keys_dir)));
    key_manager
        .ensure_key_pair()
        .context("key initialization failed")?;

    let store = FileCertificateStore::new(&settings.storage_path)
        .context("failed to open certificate storage")?;

    match cli.command {
        Commands::Issue {
            student_name,
            cohort,
        } => {
            validate_request(&student_name, &cohort)?;

            let generator = CertificateGenerator::new(&key_manager);
            let certificate = generator
                .issue(&student_name, &cohort)
                .context("failed to issue certificate")?;

            // A certificate is only durably issued once the append
            // succeeds.
            store
                .append(&certificate)
                .context("failed to save certificate")?;

            println!("{}", serde_json::to_string_pretty(&certificate)?);
        }
        Commands::Verify { id } => {
            let verifier = CertificateVerifier::new(&key_manager, &store);
            let result = verifier.verify(&id);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::List => {
            let certificates = store.get_all().context("failed to read certificates")?;
            println!("{}", serde_json::to_string_pretty(&certificates)?);
        }
    }

    Ok(())
}

/// Request-level validation, applied before the issuance operation runs.
fn validate_request(student_name: &str, cohort: &str) -> anyhow::Result<()> {
    if student_name.trim().is_empty() || cohort.trim().is_empty() {
        bail!("Missing required fields: studentName and cohort are required");
    }
    if student_name.chars().count() > MAX_FIELD_LENGTH
        || cohort.chars().count() > MAX_FIELD_LENGTH
    {
        bail!("Input too long: maximum {MAX_FIELD_LENGTH} characters for each field");
    }
    Ok(())
}
