// src/cert/resolver.rs
use std::io;
use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio::fs::File;

use super::key::{read_key, RsaPublicKey};
use super::source::CertificateSource;
use super::stream::CertStream;
use crate::cluster::{ClusterProxy, ServiceProxyRequest};
use crate::context::Context;
use crate::error::CertError;

/// Opens sealing certificates from a file, a URL or the controller service.
///
/// Holds a reusable HTTP client for remote URLs and, optionally, the cluster
/// proxy used when no source is given.
#[derive(Clone)]
pub struct CertResolver {
    http: Client,
    cluster: Option<Arc<dyn ClusterProxy>>,
}

impl std::fmt::Debug for CertResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CertResolver")
            .field("cluster", &self.cluster.is_some())
            .finish()
    }
}

impl CertResolver {
    pub fn new(cluster: Option<Arc<dyn ClusterProxy>>) -> Result<Self, CertError> {
        Ok(Self::with_http_client(default_http_client()?, cluster))
    }

    pub fn with_http_client(http: Client, cluster: Option<Arc<dyn ClusterProxy>>) -> Self {
        Self { http, cluster }
    }

    /// Opens the certificate named by `source`, or the one served by
    /// `service` in `namespace` when `source` is empty.
    pub async fn open(
        &self,
        ctx: &Context,
        source: &str,
        namespace: &str,
        service: &str,
    ) -> Result<CertStream, CertError> {
        let source = CertificateSource::classify(source);
        tracing::debug!(source = %source, "resolving sealing certificate");
        resolve(
            ctx,
            &self.http,
            self.cluster.as_deref(),
            source,
            namespace,
            service,
        )
        .await
    }

    pub async fn fetch_key(
        &self,
        ctx: &Context,
        source: &str,
        namespace: &str,
        service: &str,
    ) -> Result<RsaPublicKey, CertError> {
        let stream = self.open(ctx, source, namespace, service).await?;
        let location = stream.source().to_string();
        read_key(stream, &location).await
    }
}

/// One-shot form of [`CertResolver::open`] with a borrowed cluster proxy.
pub async fn open_cert(
    ctx: &Context,
    cluster: Option<&dyn ClusterProxy>,
    source: &str,
    namespace: &str,
    service: &str,
) -> Result<CertStream, CertError> {
    let http = default_http_client()?;
    let source = CertificateSource::classify(source);
    tracing::debug!(source = %source, "resolving sealing certificate");
    resolve(ctx, &http, cluster, source, namespace, service).await
}

/// Resolves the certificate and extracts its RSA key in one call.
pub async fn fetch_key(
    ctx: &Context,
    cluster: Option<&dyn ClusterProxy>,
    source: &str,
    namespace: &str,
    service: &str,
) -> Result<RsaPublicKey, CertError> {
    let stream = open_cert(ctx, cluster, source, namespace, service).await?;
    let location = stream.source().to_string();
    read_key(stream, &location).await
}

fn default_http_client() -> Result<Client, CertError> {
    Client::builder()
        .user_agent(crate::USER_AGENT)
        .build()
        .map_err(|e| CertError::Config(format!("cannot build HTTP client: {}", e)))
}

async fn resolve(
    ctx: &Context,
    http: &Client,
    cluster: Option<&dyn ClusterProxy>,
    source: CertificateSource,
    namespace: &str,
    service: &str,
) -> Result<CertStream, CertError> {
    match source {
        CertificateSource::Unspecified => {
            let cluster = cluster.ok_or_else(|| {
                CertError::Config(format!(
                    "no certificate source given and no cluster configuration available \
                     to fetch it from service {}/{}",
                    namespace, service
                ))
            })?;
            open_cluster(ctx, cluster, namespace, service).await
        }
        CertificateSource::RemoteUrl(ref url) => {
            let body = open_remote(ctx, http, url, &source.to_string()).await?;
            Ok(CertStream::from_body(source, body))
        }
        CertificateSource::LocalPath(ref path) => {
            let file = open_local(path, &source.to_string()).await?;
            Ok(CertStream::from_file(source, file))
        }
    }
}

async fn open_cluster(
    ctx: &Context,
    cluster: &dyn ClusterProxy,
    namespace: &str,
    service: &str,
) -> Result<CertStream, CertError> {
    let request = ServiceProxyRequest::controller_cert(namespace, service);
    let location = request.location();
    let body = ctx.run(&location, cluster.proxy_get(&request)).await?;
    tracing::debug!(location = %location, bytes = body.len(), "fetched certificate from cluster");
    Ok(CertStream::from_body(CertificateSource::Unspecified, body))
}

// The whole body is read under the context so cancellation also covers a
// stalled transfer, not only the wait for response headers.
async fn open_remote(
    ctx: &Context,
    http: &Client,
    url: &str,
    location: &str,
) -> Result<bytes::Bytes, CertError> {
    ctx.run(location, async {
        let response = http
            .get(url)
            .send()
            .await
            .map_err(|e| CertError::network(location, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CertError::from_status(location, status));
        }
        if response.url().as_str() != url {
            tracing::debug!(final_url = %response.url(), "followed redirect");
        }
        response
            .bytes()
            .await
            .map_err(|e| CertError::network(location, e))
    })
    .await
}

async fn open_local(path: &Path, location: &str) -> Result<File, CertError> {
    File::open(path).await.map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => CertError::not_found(location),
        _ => CertError::Read {
            location: location.to_string(),
            source,
        },
    })
}
