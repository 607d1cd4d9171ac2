//! Per-context cluster access

use std::future::Future;

use k8s_openapi::api::core::v1::{Event, Pod};
use kube::Api;
use kube::api::{ListParams, LogParams};
use kube::config::KubeConfigOptions;

use crate::error::{GatewayError, Result};
use crate::registry::KubeconfigRegistry;

/// Read-only operations against a single named context.
///
/// Every call names its context explicitly; implementations hold no notion
/// of a current context, so calls for different contexts are independent.
pub trait ClusterGateway: Send + Sync {
    /// All pods in all namespaces, in one round trip
    fn list_pods(&self, context: &str) -> impl Future<Output = Result<Vec<Pod>>> + Send;

    /// Current log text of the pod's default container
    fn get_logs(
        &self,
        context: &str,
        namespace: &str,
        pod: &str,
    ) -> impl Future<Output = Result<String>> + Send;

    fn describe_pod(
        &self,
        context: &str,
        namespace: &str,
        pod: &str,
    ) -> impl Future<Output = Result<Pod>> + Send;

    /// Events whose involved object is the given pod
    fn list_events(
        &self,
        context: &str,
        namespace: &str,
        pod: &str,
    ) -> impl Future<Output = Result<Vec<Event>>> + Send;
}

/// Gateway talking to real clusters through kube-rs
#[derive(Clone, Debug, Default)]
pub struct KubeGateway {
    registry: KubeconfigRegistry,
}

impl KubeGateway {
    pub fn new(registry: KubeconfigRegistry) -> Self {
        Self { registry }
    }

    /// Create a kube::Client for a specific context
    async fn client_for_context(&self, context_name: &str) -> Result<kube::Client> {
        let kubeconfig = self.registry.read()?;

        let config = kube::Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: Some(context_name.to_string()),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            GatewayError::Configuration(format!(
                "Failed to create config for context {}: {}",
                context_name, e
            ))
        })?;

        kube::Client::try_from(config).map_err(|e| {
            GatewayError::Configuration(format!(
                "Failed to create client for context {}: {}",
                context_name, e
            ))
        })
    }
}

/// Field selector matching events about one pod
fn involved_object_selector(namespace: &str, pod: &str) -> String {
    format!(
        "involvedObject.name={},involvedObject.namespace={}",
        pod, namespace
    )
}

impl ClusterGateway for KubeGateway {
    async fn list_pods(&self, context: &str) -> Result<Vec<Pod>> {
        tracing::debug!(context, "listing pods in all namespaces");
        let client = self.client_for_context(context).await?;
        let pods: Api<Pod> = Api::all(client);
        let list = pods.list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn get_logs(&self, context: &str, namespace: &str, pod: &str) -> Result<String> {
        tracing::debug!(context, namespace, pod, "reading pod logs");
        let client = self.client_for_context(context).await?;
        let pods: Api<Pod> = Api::namespaced(client, namespace);
        Ok(pods.logs(pod, &LogParams::default()).await?)
    }

    async fn describe_pod(&self, context: &str, namespace: &str, pod: &str) -> Result<Pod> {
        tracing::debug!(context, namespace, pod, "reading pod");
        let client = self.client_for_context(context).await?;
        let pods: Api<Pod> = Api::namespaced(client, namespace);
        Ok(pods.get(pod).await?)
    }

    async fn list_events(&self, context: &str, namespace: &str, pod: &str) -> Result<Vec<Event>> {
        tracing::debug!(context, namespace, pod, "listing pod events");
        let client = self.client_for_context(context).await?;
        let events: Api<Event> = Api::namespaced(client, namespace);
        let params = ListParams::default().fields(&involved_object_selector(namespace, pod));
        let list = events.list(&params).await?;
        Ok(list.items)
    }
}
