// src/cert/info.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use x509_parser::prelude::{ParsedExtension, X509Certificate};

use super::key::{key_algorithm_name, parse_certificate, RsaPublicKey};
use super::pem;
use crate::error::CertError;

/// Summary of a sealing certificate, as shown by `sealcert info`.
#[derive(Debug, Serialize, Clone)]
pub struct CertificateInfo {
    pub subject: String,
    pub issuer: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub serial: String,
    pub fingerprint: String,
    pub is_ca: bool,
    pub key_algorithm: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_bits: Option<u64>,
}

impl CertificateInfo {
    /// Describes the first `CERTIFICATE` block in `data`.
    pub fn from_pem(data: &[u8]) -> Result<Self, CertError> {
        let der = pem::first_certificate_der(data)?;
        let cert = parse_certificate(&der)?;
        Self::from_certificate(&cert, &der)
    }

    fn from_certificate(cert: &X509Certificate<'_>, der: &[u8]) -> Result<Self, CertError> {
        let not_before = timestamp(cert.validity().not_before.timestamp(), "not_before")?;
        let not_after = timestamp(cert.validity().not_after.timestamp(), "not_after")?;

        let is_ca = cert
            .extensions()
            .iter()
            .find_map(|ext| match ext.parsed_extension() {
                ParsedExtension::BasicConstraints(bc) => Some(bc.ca),
                _ => None,
            })
            .unwrap_or(false);

        let key_bits = RsaPublicKey::from_certificate(cert).ok().map(|key| key.bits());

        Ok(Self {
            subject: cert.subject().to_string(),
            issuer: cert.issuer().to_string(),
            not_before,
            not_after,
            serial: hex::encode(cert.raw_serial()),
            fingerprint: hex::encode(Sha256::digest(der)),
            is_ca,
            key_algorithm: key_algorithm_name(cert),
            key_bits,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.not_after
    }
}

fn timestamp(seconds: i64, field: &str) -> Result<DateTime<Utc>, CertError> {
    Utc.timestamp_opt(seconds, 0)
        .single()
        .ok_or_else(|| CertError::Parse(format!("invalid {} timestamp", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEALING_CERT: &str = include_str!("../../tests/fixtures/sealing-cert.pem");
    const EC_CERT: &str = include_str!("../../tests/fixtures/ec-cert.pem");

    #[test]
    fn test_sealing_cert_info() {
        let info = CertificateInfo::from_pem(SEALING_CERT.as_bytes()).unwrap();
        assert_eq!(info.serial, "05e933e3c8bc35baf322922b2cc2142d");
        assert_eq!(
            info.fingerprint,
            "47361d1fe6ddb4c16b97b026761c50583b2968e149fc79b45c41e2c3f27872ca"
        );
        assert_eq!(info.not_before.to_rfc3339(), "2017-06-20T04:32:45+00:00");
        assert_eq!(info.not_after.to_rfc3339(), "2027-06-18T04:32:45+00:00");
        assert!(info.is_ca);
        assert_eq!(info.key_algorithm, "RSA");
        assert_eq!(info.key_bits, Some(4096));
        assert!(info.subject.is_empty());
    }

    #[test]
    fn test_ec_cert_info_has_no_rsa_bits() {
        let info = CertificateInfo::from_pem(EC_CERT.as_bytes()).unwrap();
        assert_eq!(info.key_algorithm, "EC");
        assert_eq!(info.key_bits, None);
        assert_eq!(info.subject, "CN=ec-test");
    }

    #[test]
    fn test_expiry() {
        let info = CertificateInfo::from_pem(SEALING_CERT.as_bytes()).unwrap();
        let before = Utc.with_ymd_and_hms(2027, 6, 18, 0, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2027, 6, 19, 0, 0, 0).unwrap();
        assert!(!info.is_expired_at(before));
        assert!(info.is_expired_at(after));
    }

    #[test]
    fn test_garbage_is_parse_error() {
        assert!(matches!(
            CertificateInfo::from_pem(b"nope"),
            Err(CertError::Parse(_))
        ));
    }
}
