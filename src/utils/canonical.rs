// src/utils/canonical.rs
//! Canonical certificate encoding for signing and verification.
//!
//! Produces the exact byte sequence that issuance signs and verification
//! re-derives. Both sides call this one function; the format is a durable
//! interface shared with external consumers, so it must never drift.

/// Version of the canonical layout below.
///
/// Any change to the field set, field order, or delimiter invalidates
/// every previously issued signature and must bump this constant.
#[allow(dead_code)]
pub const FORMAT_VERSION: u32 = 1;

/// Field delimiter of the canonical layout.
pub const DELIMITER: char = '|';

/// Builds the canonical representation of a certificate's content fields.
///
/// # Arguments
/// * `id` - Certificate identifier (UUID v4 text)
/// * `student_name` - Student the certificate was issued to
/// * `cohort` - Cohort program name
/// * `issue_date` - ISO-8601 UTC issuance timestamp
///
/// # Returns
/// The four fields joined by `|` in fixed order, with no escaping:
/// `{id}|{studentName}|{cohort}|{issueDate}`. The UTF-8 bytes of this
/// string are the exact input to RSA-SHA256 signing and verification.
///
/// # Note
/// Because no escaping is applied, the content fields must not contain
/// the delimiter; issuance rejects such inputs. `id` and `issue_date`
/// cannot contain it by construction.
pub fn canonical_string(id: &str, student_name: &str, cohort: &str, issue_date: &str) -> String {
    format!("{id}{DELIMITER}{student_name}{DELIMITER}{cohort}{DELIMITER}{issue_date}")
}
