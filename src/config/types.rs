// config/types.rs
use std::path::{Path, PathBuf};
use std::{env, fmt, fs};

use url::Url;

use super::kubeconfig::KubeConfig;
use crate::error::CertError;

const SERVICE_ACCOUNT_DIR: &str = "/var/run/secrets/kubernetes.io/serviceaccount";

/// Everything needed to talk to the API server, flattened out of a
/// kubeconfig context or the in-cluster service account.
#[derive(Clone, Default)]
pub struct ClusterConfig {
    pub server: String,
    pub certificate_authority: Option<Vec<u8>>,
    pub client_certificate: Option<Vec<u8>>,
    pub client_key: Option<Vec<u8>>,
    pub token: Option<String>,
    pub insecure_skip_tls_verify: bool,
}

impl fmt::Debug for ClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterConfig")
            .field("server", &self.server)
            .field("certificate_authority", &self.certificate_authority.is_some())
            .field("client_certificate", &self.client_certificate.is_some())
            .field("client_key", &self.client_key.as_ref().map(|_| "<redacted>"))
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("insecure_skip_tls_verify", &self.insecure_skip_tls_verify)
            .finish()
    }
}

impl ClusterConfig {
    /// Loads cluster settings the way kubectl finds them: an explicit
    /// kubeconfig path, then `$KUBECONFIG`, then `~/.kube/config`, and finally
    /// the in-cluster service account.
    pub fn load(kubeconfig: Option<&str>, context: Option<&str>) -> Result<Self, CertError> {
        if let Some(path) = kubeconfig.filter(|p| !p.is_empty()) {
            let path = PathBuf::from(shellexpand::tilde(path).to_string());
            return KubeConfig::load_from_file(&path)?.cluster_config(context);
        }
        if let Some(path) = default_kubeconfig_path() {
            tracing::debug!(path = %path.display(), "using kubeconfig");
            return KubeConfig::load_from_file(&path)?.cluster_config(context);
        }
        tracing::debug!("no kubeconfig found, trying in-cluster configuration");
        Self::in_cluster()
    }

    /// Configuration from the pod's mounted service account.
    pub fn in_cluster() -> Result<Self, CertError> {
        Self::in_cluster_from(Path::new(SERVICE_ACCOUNT_DIR))
    }

    fn in_cluster_from(account_dir: &Path) -> Result<Self, CertError> {
        let host = env::var("KUBERNETES_SERVICE_HOST").map_err(|_| {
            CertError::Config("no kubeconfig found and not running inside a cluster".into())
        })?;
        let port = env::var("KUBERNETES_SERVICE_PORT").unwrap_or_else(|_| "443".to_string());
        let host = if host.contains(':') {
            format!("[{}]", host)
        } else {
            host
        };

        let token = fs::read_to_string(account_dir.join("token")).map_err(|e| {
            CertError::Config(format!("cannot read service account token: {}", e))
        })?;
        let certificate_authority = fs::read(account_dir.join("ca.crt")).ok();

        let config = Self {
            server: format!("https://{}:{}", host, port),
            certificate_authority,
            token: Some(token.trim().to_string()),
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn server_url(&self) -> Result<Url, CertError> {
        let url = Url::parse(&self.server).map_err(|e| {
            CertError::Config(format!("invalid API server URL {:?}: {}", self.server, e))
        })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(CertError::Config(format!(
                "unsupported API server scheme {:?}",
                scheme
            ))),
        }
    }

    pub fn validate(&self) -> Result<(), CertError> {
        self.server_url()?;
        if self.client_certificate.is_some() != self.client_key.is_some() {
            return Err(CertError::Config(
                "client certificate and client key must be given together".into(),
            ));
        }
        Ok(())
    }
}

fn default_kubeconfig_path() -> Option<PathBuf> {
    if let Some(paths) = env::var_os("KUBECONFIG") {
        if let Some(path) = env::split_paths(&paths).find(|p| p.is_file()) {
            return Some(path);
        }
    }
    dirs::home_dir()
        .map(|home| home.join(".kube").join("config"))
        .filter(|p| p.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_bad_server() {
        let config = ClusterConfig {
            server: "not a url".to_string(),
            ..ClusterConfig::default()
        };
        assert!(matches!(config.validate(), Err(CertError::Config(_))));

        let config = ClusterConfig {
            server: "ftp://api.example.com".to_string(),
            ..ClusterConfig::default()
        };
        assert!(matches!(config.validate(), Err(CertError::Config(_))));
    }

    #[test]
    fn test_validate_requires_key_with_certificate() {
        let config = ClusterConfig {
            server: "https://api.example.com".to_string(),
            client_certificate: Some(b"cert".to_vec()),
            ..ClusterConfig::default()
        };
        assert!(matches!(config.validate(), Err(CertError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClusterConfig {
            server: "https://api.example.com".to_string(),
            token: Some("very-secret".to_string()),
            ..ClusterConfig::default()
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("api.example.com"));
    }

    #[test]
    fn test_explicit_kubeconfig_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        fs::write(
            &path,
            "current-context: c\ncontexts:\n- name: c\n  context:\n    cluster: k\nclusters:\n- name: k\n  cluster:\n    server: http://127.0.0.1:8001\n",
        )
        .unwrap();
        let config = ClusterConfig::load(path.to_str(), None).unwrap();
        assert_eq!(config.server, "http://127.0.0.1:8001");
        assert!(config.token.is_none());
    }

    #[test]
    fn test_missing_explicit_kubeconfig() {
        let err = ClusterConfig::load(Some("/nonexistent/kubeconfig"), None).unwrap_err();
        assert!(matches!(err, CertError::Config(_)));
    }
}
