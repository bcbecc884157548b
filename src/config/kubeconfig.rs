// src/config/kubeconfig.rs
use std::fs;
use std::path::{Path, PathBuf};

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;

use super::ClusterConfig;
use crate::error::CertError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(default)]
    pub clusters: Vec<NamedCluster>,
    #[serde(default)]
    pub users: Vec<NamedUser>,
    #[serde(default)]
    pub contexts: Vec<NamedContext>,
    #[serde(default)]
    pub current_context: Option<String>,
    /// Directory relative file references are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
pub struct NamedCluster {
    pub name: String,
    pub cluster: ClusterEntry,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterEntry {
    pub server: String,
    pub certificate_authority: Option<String>,
    pub certificate_authority_data: Option<String>,
    #[serde(default)]
    pub insecure_skip_tls_verify: bool,
}

#[derive(Debug, Deserialize)]
pub struct NamedUser {
    pub name: String,
    #[serde(default)]
    pub user: UserEntry,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserEntry {
    pub client_certificate: Option<String>,
    pub client_certificate_data: Option<String>,
    pub client_key: Option<String>,
    pub client_key_data: Option<String>,
    pub token: Option<String>,
    #[serde(rename = "tokenFile")]
    pub token_file: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NamedContext {
    pub name: String,
    pub context: ContextEntry,
}

#[derive(Debug, Deserialize)]
pub struct ContextEntry {
    pub cluster: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl KubeConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, CertError> {
        let content = fs::read_to_string(path).map_err(|e| {
            CertError::Config(format!("cannot read kubeconfig {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_yaml(&content)
            .map_err(|e| CertError::Config(format!("{}: {}", path.display(), e)))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, CertError> {
        serde_yaml::from_str(content)
            .map_err(|e| CertError::Config(format!("invalid kubeconfig: {}", e)))
    }

    /// Name of the context that `context` (or `current-context`) selects.
    pub fn context_name<'a>(&'a self, context: Option<&'a str>) -> Result<&'a str, CertError> {
        context
            .or(self.current_context.as_deref())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| {
                CertError::Config("no context given and kubeconfig has no current-context".into())
            })
    }

    /// Flattens the selected context into the settings needed to reach the
    /// API server.
    pub fn cluster_config(&self, context: Option<&str>) -> Result<ClusterConfig, CertError> {
        let context_name = self.context_name(context)?;
        let context = self
            .contexts
            .iter()
            .find(|c| c.name == context_name)
            .ok_or_else(|| CertError::Config(format!("context {:?} not found", context_name)))?;
        let cluster = self
            .clusters
            .iter()
            .find(|c| c.name == context.context.cluster)
            .ok_or_else(|| {
                CertError::Config(format!(
                    "cluster {:?} referenced by context {:?} not found",
                    context.context.cluster, context_name
                ))
            })?;
        let user = match context.context.user.as_deref() {
            Some(name) => Some(
                self.users
                    .iter()
                    .find(|u| u.name == name)
                    .map(|u| &u.user)
                    .ok_or_else(|| {
                        CertError::Config(format!(
                            "user {:?} referenced by context {:?} not found",
                            name, context_name
                        ))
                    })?,
            ),
            None => None,
        };

        let certificate_authority = self.read_data(
            "certificate-authority",
            cluster.cluster.certificate_authority_data.as_deref(),
            cluster.cluster.certificate_authority.as_deref(),
        )?;

        let (client_certificate, client_key, token) = match user {
            Some(user) => {
                let token = match (&user.token, &user.token_file) {
                    (Some(token), _) => Some(token.clone()),
                    (None, Some(file)) => {
                        let bytes = self.read_file("tokenFile", file)?;
                        Some(String::from_utf8_lossy(&bytes).trim().to_string())
                    }
                    (None, None) => None,
                };
                (
                    self.read_data(
                        "client-certificate",
                        user.client_certificate_data.as_deref(),
                        user.client_certificate.as_deref(),
                    )?,
                    self.read_data(
                        "client-key",
                        user.client_key_data.as_deref(),
                        user.client_key.as_deref(),
                    )?,
                    token,
                )
            }
            None => (None, None, None),
        };

        let config = ClusterConfig {
            server: cluster.cluster.server.clone(),
            certificate_authority,
            client_certificate,
            client_key,
            token,
            insecure_skip_tls_verify: cluster.cluster.insecure_skip_tls_verify,
        };
        config.validate()?;
        Ok(config)
    }

    // Inline `*-data` wins over the file reference, as kubectl does.
    fn read_data(
        &self,
        field: &str,
        data: Option<&str>,
        file: Option<&str>,
    ) -> Result<Option<Vec<u8>>, CertError> {
        if let Some(data) = data {
            let decoded = general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| CertError::Config(format!("{}-data is not base64: {}", field, e)))?;
            return Ok(Some(decoded));
        }
        file.map(|file| self.read_file(field, file)).transpose()
    }

    fn read_file(&self, field: &str, file: &str) -> Result<Vec<u8>, CertError> {
        let path = self.resolve_path(file);
        fs::read(&path).map_err(|e| {
            CertError::Config(format!("cannot read {} {}: {}", field, path.display(), e))
        })
    }

    fn resolve_path(&self, file: &str) -> PathBuf {
        let path = PathBuf::from(shellexpand::tilde(file).to_string());
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }
}
