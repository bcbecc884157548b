// types.rs
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use sealcert::cluster::{DEFAULT_CONTROLLER_NAME, DEFAULT_CONTROLLER_NAMESPACE};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Certificate source: a path, file:// or http(s):// URL. Empty fetches
    /// it from the controller in the cluster.
    #[arg(long = "cert", env = "SEALED_SECRETS_CERT", default_value = "")]
    pub cert: String,

    #[arg(
        long,
        env = "SEALED_SECRETS_CONTROLLER_NAMESPACE",
        default_value = DEFAULT_CONTROLLER_NAMESPACE
    )]
    pub controller_namespace: String,

    #[arg(
        long,
        env = "SEALED_SECRETS_CONTROLLER_NAME",
        default_value = DEFAULT_CONTROLLER_NAME
    )]
    pub controller_name: String,

    /// Path to a kubeconfig file (defaults to $KUBECONFIG, then ~/.kube/config)
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// Kubeconfig context to use instead of current-context
    #[arg(long)]
    pub context: Option<String>,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    // Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the sealing certificate as PEM
    FetchCert,
    /// Print the RSA public key of the sealing certificate
    Key {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
    /// Describe the sealing certificate
    Info {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["sealcert", "fetch-cert"]).unwrap();
        assert_eq!(args.controller_namespace, "kube-system");
        assert_eq!(args.controller_name, "sealed-secrets-controller");
        assert_eq!(args.timeout, 30);
        assert!(matches!(args.command, Command::FetchCert));
    }

    #[test]
    fn test_key_json() {
        let args = Args::try_parse_from([
            "sealcert",
            "--cert",
            "https://example.com/cert.pem",
            "key",
            "--output",
            "json",
        ])
        .unwrap();
        assert_eq!(args.cert, "https://example.com/cert.pem");
        assert!(matches!(
            args.command,
            Command::Key {
                output: OutputFormat::Json
            }
        ));
    }
}
