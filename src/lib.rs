//! Resolve a sealed-secrets sealing certificate and extract its RSA public key.
//!
//! The certificate can come from a local path (optionally `file://`), an
//! `http(s)://` URL, or, when no source is given, the controller service
//! inside the cluster reached through the API server's service proxy.
//!
//! ```no_run
//! # async fn demo() -> Result<(), sealcert::CertError> {
//! use sealcert::{fetch_key, Context};
//!
//! let key = fetch_key(&Context::background(), None, "cert.pem", "kube-system", "sealed-secrets-controller").await?;
//! println!("{} bit key, e={}", key.bits(), key.exponent);
//! # Ok(())
//! # }
//! ```

pub mod cert;
pub mod cluster;
pub mod config;
pub mod context;
pub mod error;
pub mod utils;

pub use cert::{
    fetch_key, open_cert, parse_key, CertResolver, CertStream, CertificateInfo, CertificateSource,
    RsaPublicKey,
};
pub use cluster::{ClusterProxy, KubeProxyClient, ServiceProxyRequest};
pub use config::ClusterConfig;
pub use context::Context;
pub use error::CertError;

/// User agent sent with every HTTP request.
pub const USER_AGENT: &str = concat!("sealcert/", env!("CARGO_PKG_VERSION"));
