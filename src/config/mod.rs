// src/config/mod.rs
mod kubeconfig;
mod types;

pub use kubeconfig::{
    ClusterEntry, ContextEntry, KubeConfig, NamedCluster, NamedContext, NamedUser, UserEntry,
};
pub use types::ClusterConfig;
