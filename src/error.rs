// src/error.rs
use std::io;

use thiserror::Error;

/// Every way resolving a sealing certificate or extracting its key can fail.
///
/// `location` fields carry the classified source (`file …`, `url …`,
/// `service ns/name`) so a message is diagnosable on its own.
#[derive(Debug, Error)]
pub enum CertError {
    #[error("cluster configuration error: {0}")]
    Config(String),

    #[error("cannot fetch certificate from {location}: {message}")]
    Network { location: String, message: String },

    #[error("certificate not found at {location}")]
    NotFound { location: String },

    #[error("cannot read certificate from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse certificate: {0}")]
    Parse(String),

    #[error("expected an RSA public key but found {0}")]
    UnsupportedKeyType(String),

    #[error("fetching certificate from {location} was cancelled: {reason}")]
    Cancelled {
        location: String,
        reason: &'static str,
    },
}

impl CertError {
    pub(crate) fn network(location: impl ToString, message: impl ToString) -> Self {
        Self::Network {
            location: location.to_string(),
            message: message.to_string(),
        }
    }

    pub(crate) fn not_found(location: impl ToString) -> Self {
        Self::NotFound {
            location: location.to_string(),
        }
    }

    /// Maps a failed HTTP exchange onto the taxonomy: 404 is `NotFound`,
    /// anything else non-2xx is a `Network` failure.
    pub(crate) fn from_status(location: impl ToString, status: reqwest::StatusCode) -> Self {
        if status == reqwest::StatusCode::NOT_FOUND {
            Self::not_found(location)
        } else {
            Self::network(location, format!("unexpected HTTP status {}", status))
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Network { .. } => "network",
            Self::NotFound { .. } => "not_found",
            Self::Read { .. } => "read",
            Self::Parse(_) => "parse",
            Self::UnsupportedKeyType(_) => "unsupported_key_type",
            Self::Cancelled { .. } => "cancelled",
        }
    }
}
