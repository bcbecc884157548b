// src/cert/pem.rs
use x509_parser::pem::Pem;

use crate::error::CertError;

pub(crate) const CERTIFICATE_LABEL: &str = "CERTIFICATE";

/// Returns the DER payload of the first certificate block in `data`.
///
/// Blocks with other labels are stepped over, as are blocks that fail to
/// decode. Nothing after the first certificate is looked at.
pub(crate) fn first_certificate_der(data: &[u8]) -> Result<Vec<u8>, CertError> {
    let text = String::from_utf8_lossy(data);
    if text.trim().is_empty() {
        return Err(CertError::Parse("input is empty".to_string()));
    }

    let mut skipped: Vec<String> = Vec::new();
    let mut first_error = None;

    for item in Pem::iter_from_buffer(text.as_bytes()) {
        match item {
            Ok(block) if block.label == CERTIFICATE_LABEL => {
                if block.contents.is_empty() {
                    return Err(CertError::Parse("CERTIFICATE block is empty".to_string()));
                }
                return Ok(block.contents);
            }
            Ok(block) => skipped.push(block.label),
            Err(e) => {
                tracing::debug!(error = %e, "skipping undecodable PEM block");
                first_error.get_or_insert(e);
            }
        }
    }

    match (first_error, skipped.is_empty()) {
        (Some(e), _) => Err(CertError::Parse(format!("invalid PEM block: {}", e))),
        (None, true) => Err(CertError::Parse("no PEM block found".to_string())),
        (None, false) => Err(CertError::Parse(format!(
            "no CERTIFICATE PEM block found (found {})",
            skipped.join(", ")
        ))),
    }
}
