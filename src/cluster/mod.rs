// src/cluster/mod.rs
mod client;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CertError;

pub use client::KubeProxyClient;

pub const DEFAULT_CONTROLLER_NAMESPACE: &str = "kube-system";
pub const DEFAULT_CONTROLLER_NAME: &str = "sealed-secrets-controller";
pub const CERT_PATH: &str = "/v1/cert.pem";

/// A GET to a service through the API server's `services/proxy`
/// subresource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceProxyRequest {
    pub namespace: String,
    pub service: String,
    pub scheme: String,
    // Empty selects the service's first port.
    pub port: String,
    pub path: String,
}

impl ServiceProxyRequest {
    pub fn controller_cert(namespace: &str, service: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            service: service.to_string(),
            scheme: "http".to_string(),
            port: String::new(),
            path: CERT_PATH.to_string(),
        }
    }

    pub fn uri_path(&self) -> String {
        format!(
            "/api/v1/namespaces/{}/services/{}:{}:{}/proxy/{}",
            self.namespace,
            self.scheme,
            self.service,
            self.port,
            self.path.trim_start_matches('/')
        )
    }

    pub fn location(&self) -> String {
        format!("service {}/{}", self.namespace, self.service)
    }
}

/// A proxied GET returning the response body. Implementations map a 404 to
/// [`CertError::NotFound`] and other failures to [`CertError::Network`].
#[async_trait]
pub trait ClusterProxy: Send + Sync {
    async fn proxy_get(&self, request: &ServiceProxyRequest) -> Result<Bytes, CertError>;
}
