// src/cert/source.rs
use std::fmt;
use std::path::PathBuf;

use url::Url;

const FILE_SCHEME: &str = "file://";
const REMOTE_SCHEMES: [&str; 2] = ["http://", "https://"];

/// Where the sealing certificate comes from, decided once from the raw
/// `--cert` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CertificateSource {
    /// Empty source: ask the controller service inside the cluster.
    Unspecified,
    LocalPath(PathBuf),
    RemoteUrl(String),
}

impl CertificateSource {
    /// Classifies `source` by prefix alone. Scheme prefixes are matched
    /// ASCII case-insensitively; anything without a known prefix is a path.
    pub fn classify(source: &str) -> Self {
        if source.is_empty() {
            return Self::Unspecified;
        }
        if REMOTE_SCHEMES.iter().any(|scheme| has_prefix(source, scheme)) {
            return Self::RemoteUrl(source.to_string());
        }
        if has_prefix(source, FILE_SCHEME) {
            return Self::LocalPath(file_url_to_path(source));
        }
        Self::LocalPath(PathBuf::from(source))
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, Self::Unspecified)
    }
}

impl fmt::Display for CertificateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "cluster service"),
            Self::LocalPath(path) => write!(f, "file {}", path.display()),
            Self::RemoteUrl(url) => write!(f, "url {}", url),
        }
    }
}

fn has_prefix(source: &str, prefix: &str) -> bool {
    source
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

// Absolute file URLs go through `Url::to_file_path` so percent-escapes and
// Windows drive letters (`file:///C:/certs/cert.pem`) come out right on every
// platform. Anything `url` rejects, e.g. `file://relative/cert.pem`, falls
// back to the text after the scheme.
fn file_url_to_path(source: &str) -> PathBuf {
    Url::parse(source)
        .ok()
        .filter(|url| url.host_str().map_or(true, |host| host.is_empty() || host == "localhost"))
        .and_then(|url| url.to_file_path().ok())
        .unwrap_or_else(|| PathBuf::from(&source[FILE_SCHEME.len()..]))
}
