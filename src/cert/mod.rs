// src/cert/mod.rs
mod info;
mod key;
mod pem;
mod resolver;
mod source;
mod stream;

pub use info::CertificateInfo;
pub use key::{parse_key, RsaPublicKey};
pub use resolver::{fetch_key, open_cert, CertResolver};
pub use source::CertificateSource;
pub use stream::CertStream;
