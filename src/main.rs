// src/main.rs
mod types;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use chrono::Utc;
use clap::Parser;
use sealcert::utils::logging::init_logging;
use sealcert::{
    parse_key, CertResolver, CertificateInfo, ClusterConfig, ClusterProxy, Context,
    KubeProxyClient,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use types::{Args, Command, OutputFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref(), args.debug).context("failed to set up logging")?;

    let root = Context::background();
    let ctx = root.with_timeout(Duration::from_secs(args.timeout));
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("interrupted");
            root.cancel();
        }
    });

    // Cluster access is only needed when no explicit source was given.
    let cluster: Option<Arc<dyn ClusterProxy>> = if args.cert.is_empty() {
        let config = ClusterConfig::load(args.kubeconfig.as_deref(), args.context.as_deref())?;
        tracing::debug!(server = %config.server, "using cluster");
        Some(Arc::new(KubeProxyClient::new(&config)?))
    } else {
        None
    };
    let resolver = CertResolver::new(cluster)?;

    let mut stream = resolver
        .open(
            &ctx,
            &args.cert,
            &args.controller_namespace,
            &args.controller_name,
        )
        .await?;

    match args.command {
        Command::FetchCert => {
            let mut data = Vec::new();
            stream
                .read_to_end(&mut data)
                .await
                .with_context(|| format!("reading certificate from {}", stream.source()))?;
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&data).await?;
            stdout.flush().await?;
        }
        Command::Key { output } => {
            let key = parse_key(stream).await?;
            match output {
                OutputFormat::Text => {
                    println!("modulus: {}", key.modulus);
                    println!("exponent: {}", key.exponent);
                    println!("bits: {}", key.bits());
                }
                OutputFormat::Json => {
                    let value = serde_json::json!({
                        "modulus": key.modulus.to_string(),
                        "exponent": key.exponent,
                        "bits": key.bits(),
                    });
                    println!("{}", serde_json::to_string_pretty(&value)?);
                }
            }
        }
        Command::Info { output } => {
            let mut data = Vec::new();
            stream
                .read_to_end(&mut data)
                .await
                .with_context(|| format!("reading certificate from {}", stream.source()))?;
            let info = CertificateInfo::from_pem(&data)?;
            if info.is_expired_at(Utc::now()) {
                tracing::warn!(not_after = %info.not_after, "sealing certificate has expired");
            }
            match output {
                OutputFormat::Text => print_info(&info),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
            }
        }
    }

    Ok(())
}

fn print_info(info: &CertificateInfo) {
    println!("Subject:     {}", info.subject);
    println!("Issuer:      {}", info.issuer);
    println!("Not before:  {}", info.not_before.to_rfc3339());
    println!("Not after:   {}", info.not_after.to_rfc3339());
    println!("Serial:      {}", info.serial);
    println!("SHA-256:     {}", info.fingerprint);
    println!("CA:          {}", info.is_ca);
    match info.key_bits {
        Some(bits) => println!("Public key:  {} ({} bit)", info.key_algorithm, bits),
        None => println!("Public key:  {}", info.key_algorithm),
    }
}
