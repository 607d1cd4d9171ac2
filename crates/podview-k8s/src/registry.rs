use std::path::PathBuf;

use kube::config::Kubeconfig;

use crate::error::{GatewayError, Result};

/// Something that can enumerate the cluster contexts to query
pub trait ContextSource: Send + Sync {
    /// Names of all configured contexts, in configuration order.
    ///
    /// An unreadable configuration yields an empty list.
    fn list_contexts(&self) -> Vec<String>;
}

/// Context registry backed by the local kubeconfig.
///
/// The file is read again on every call; nothing is cached.
#[derive(Clone, Debug, Default)]
pub struct KubeconfigRegistry {
    path: Option<PathBuf>,
}

impl KubeconfigRegistry {
    /// Use the standard lookup (`KUBECONFIG`, then `~/.kube/config`)
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an explicit kubeconfig file
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Load the kubeconfig from its source
    pub fn read(&self) -> Result<Kubeconfig> {
        let kubeconfig = match &self.path {
            Some(path) => Kubeconfig::read_from(path),
            None => Kubeconfig::read(),
        };
        kubeconfig.map_err(|e| {
            GatewayError::Configuration(format!("Failed to read kubeconfig: {}", e))
        })
    }
}

impl ContextSource for KubeconfigRegistry {
    fn list_contexts(&self) -> Vec<String> {
        match self.read() {
            Ok(kubeconfig) => kubeconfig.contexts.into_iter().map(|ctx| ctx.name).collect(),
            Err(e) => {
                tracing::warn!("Error getting contexts: {}", e);
                Vec::new()
            }
        }
    }
}
