// src/cluster/client.rs
use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Certificate, Client, Identity};
use url::Url;

use super::{ClusterProxy, ServiceProxyRequest};
use crate::config::ClusterConfig;
use crate::error::CertError;

/// [`ClusterProxy`] that talks to the API server over HTTPS with the
/// credentials of a [`ClusterConfig`].
#[derive(Clone)]
pub struct KubeProxyClient {
    server: Url,
    http: Client,
    token: Option<String>,
}

impl fmt::Debug for KubeProxyClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KubeProxyClient")
            .field("server", &self.server.as_str())
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish_non_exhaustive()
    }
}

impl KubeProxyClient {
    pub fn new(config: &ClusterConfig) -> Result<Self, CertError> {
        config.validate()?;
        let server = config.server_url()?;

        let mut builder = Client::builder().user_agent(crate::USER_AGENT);
        if let Some(ca) = &config.certificate_authority {
            let roots = Certificate::from_pem_bundle(ca)
                .map_err(|e| CertError::Config(format!("invalid certificate-authority: {}", e)))?;
            for root in roots {
                builder = builder.add_root_certificate(root);
            }
        }
        if let (Some(cert), Some(key)) = (&config.client_certificate, &config.client_key) {
            let mut pem = cert.clone();
            pem.push(b'\n');
            pem.extend_from_slice(key);
            let identity = Identity::from_pem(&pem)
                .map_err(|e| CertError::Config(format!("invalid client certificate: {}", e)))?;
            builder = builder.identity(identity);
        }
        if config.insecure_skip_tls_verify {
            tracing::warn!(server = %server, "TLS verification of the API server is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }
        let http = builder
            .build()
            .map_err(|e| CertError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            server,
            http,
            token: config.token.clone(),
        })
    }

    // Appended rather than `Url::join`ed so a server URL with a path prefix
    // (e.g. behind a gateway) keeps it.
    fn request_url(&self, request: &ServiceProxyRequest) -> Result<Url, CertError> {
        let url = format!(
            "{}{}",
            self.server.as_str().trim_end_matches('/'),
            request.uri_path()
        );
        Url::parse(&url).map_err(|e| CertError::Config(format!("invalid proxy URL {}: {}", url, e)))
    }
}

#[async_trait]
impl ClusterProxy for KubeProxyClient {
    async fn proxy_get(&self, request: &ServiceProxyRequest) -> Result<Bytes, CertError> {
        let location = request.location();
        let url = self.request_url(request)?;
        tracing::debug!(%url, "fetching certificate through service proxy");

        let mut builder = self.http.get(url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| CertError::network(&location, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CertError::from_status(&location, status));
        }
        response
            .bytes()
            .await
            .map_err(|e| CertError::network(&location, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    const PROXY_PATH: &str =
        "/api/v1/namespaces/kube-system/services/http:sealed-secrets-controller:/proxy/v1/cert.pem";

    fn config(server: String) -> ClusterConfig {
        ClusterConfig {
            server,
            token: Some("t0ken".to_string()),
            ..ClusterConfig::default()
        }
    }

    fn request() -> ServiceProxyRequest {
        ServiceProxyRequest::controller_cert("kube-system", "sealed-secrets-controller")
    }

    #[tokio::test]
    async fn test_proxy_get_sends_token() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", PROXY_PATH)
            .match_header("authorization", "Bearer t0ken")
            .with_status(200)
            .with_body("-----BEGIN CERTIFICATE-----\n")
            .create_async()
            .await;

        let client = KubeProxyClient::new(&config(server.url())).unwrap();
        let body = client.proxy_get(&request()).await.unwrap();
        assert_eq!(&body[..], b"-----BEGIN CERTIFICATE-----\n");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_proxy_get_keeps_server_path_prefix() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", format!("/k8s/clusters/c-1{}", PROXY_PATH).as_str())
            .with_status(200)
            .with_body("ok")
            .create_async()
            .await;

        let client = KubeProxyClient::new(&config(format!("{}/k8s/clusters/c-1/", server.url())))
            .unwrap();
        client.proxy_get(&request()).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_proxy_get_404_is_not_found() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", PROXY_PATH)
            .with_status(404)
            .create_async()
            .await;

        let client = KubeProxyClient::new(&config(server.url())).unwrap();
        let err = client.proxy_get(&request()).await.unwrap_err();
        match err {
            CertError::NotFound { location } => {
                assert_eq!(location, "service kube-system/sealed-secrets-controller")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_proxy_get_503_is_network_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", PROXY_PATH)
            .with_status(503)
            .create_async()
            .await;

        let client = KubeProxyClient::new(&config(server.url())).unwrap();
        let err = client.proxy_get(&request()).await.unwrap_err();
        assert!(matches!(err, CertError::Network { .. }));
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = KubeProxyClient::new(&config(format!("http://{}", addr))).unwrap();
        let err = client.proxy_get(&request()).await.unwrap_err();
        assert!(matches!(err, CertError::Network { .. }));
    }

    #[test]
    fn test_client_certificate_without_key() {
        let config = ClusterConfig {
            server: "https://api.example.com".to_string(),
            client_certificate: Some(b"cert".to_vec()),
            ..ClusterConfig::default()
        };
        assert!(matches!(
            KubeProxyClient::new(&config),
            Err(CertError::Config(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = ClusterConfig {
            server: "https://api.example.com".to_string(),
            token: Some("very-secret".to_string()),
            ..ClusterConfig::default()
        };
        let client = KubeProxyClient::new(&config).unwrap();
        let debug = format!("{:?}", client);
        assert!(!debug.contains("very-secret"), "{debug}");
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("https://api.example.com"));
    }
}
