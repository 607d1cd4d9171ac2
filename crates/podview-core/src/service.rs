//! Fan-out over contexts with per-context failure isolation

use futures::future::join_all;
use k8s_openapi::api::core::v1::Pod;

use podview_k8s::{ClusterGateway, ContextSource, GatewayError};
use podview_types::{ContextSelector, PodDetails, PodSummary, Response, is_system_namespace};

use crate::manifest::normalize;
use crate::summary::summarize;

pub const DETAILS_PERMISSION_DENIED: &str = "Permission denied to access pod details";
pub const LOGS_PERMISSION_DENIED: &str = "Permission denied to access pod logs";

/// Entry point answering listing, log and detail queries across contexts
pub struct AggregationService<R, G> {
    registry: R,
    gateway: G,
}

impl<R, G> AggregationService<R, G>
where
    R: ContextSource,
    G: ClusterGateway,
{
    pub fn new(registry: R, gateway: G) -> Self {
        Self { registry, gateway }
    }

    pub fn list_contexts(&self) -> Vec<String> {
        self.registry.list_contexts()
    }

    /// Summaries of every non-system pod in the selected contexts.
    ///
    /// Contexts are queried concurrently and their results concatenated in
    /// enumeration order. A failing context contributes nothing.
    pub async fn list_all_pods(&self, selector: &ContextSelector) -> Vec<PodSummary> {
        let contexts = match selector {
            ContextSelector::All => self.registry.list_contexts(),
            ContextSelector::Named(name) => vec![name.clone()],
        };

        // join_all yields results in input order, not completion order
        let per_context = join_all(contexts.iter().map(|ctx| self.pods_for_context(ctx))).await;
        per_context.into_iter().flatten().collect()
    }

    async fn pods_for_context(&self, context: &str) -> Vec<PodSummary> {
        match self.gateway.list_pods(context).await {
            Ok(pods) => {
                let summaries: Vec<PodSummary> = pods
                    .iter()
                    .filter(|pod| !in_system_namespace(pod))
                    .map(|pod| summarize(pod, context))
                    .collect();
                tracing::info!(context, "Total pods found: {}", summaries.len());
                summaries
            }
            Err(e) => {
                tracing::warn!(context, "Error getting pods: {}", e);
                Vec::new()
            }
        }
    }

    /// Current log text of one pod
    pub async fn get_logs(
        &self,
        context: &str,
        namespace: &str,
        pod: &str,
    ) -> Result<String, GatewayError> {
        tracing::info!(context, namespace, pod, "Starting log retrieval");
        match self.gateway.get_logs(context, namespace, pod).await {
            Ok(logs) => {
                tracing::info!(pod, "Completed log retrieval, content size: {} bytes", logs.len());
                Ok(logs)
            }
            Err(e) => {
                tracing::warn!(pod, "Failed to retrieve logs: {}", e);
                Err(e)
            }
        }
    }

    /// Details document for one pod.
    ///
    /// Any failure reading the pod or its events is returned as is; nothing
    /// is normalized from partial data.
    pub async fn get_pod_detail(
        &self,
        context: &str,
        namespace: &str,
        pod: &str,
    ) -> Result<PodDetails, GatewayError> {
        let raw = self.gateway.describe_pod(context, namespace, pod).await?;
        let events = self.gateway.list_events(context, namespace, pod).await?;
        Ok(normalize(&raw, &events))
    }

    pub fn contexts_response(&self) -> Response {
        Response::Contexts(self.list_contexts())
    }

    pub async fn pods_response(&self, selector: &ContextSelector) -> Response {
        Response::Pods(self.list_all_pods(selector).await)
    }

    pub async fn logs_response(&self, context: &str, namespace: &str, pod: &str) -> Response {
        match self.get_logs(context, namespace, pod).await {
            Ok(logs) => Response::Logs(logs),
            Err(e) => error_response(e, LOGS_PERMISSION_DENIED),
        }
    }

    pub async fn details_response(&self, context: &str, namespace: &str, pod: &str) -> Response {
        match self.get_pod_detail(context, namespace, pod).await {
            Ok(details) => Response::PodDetails(Box::new(details)),
            Err(e) => error_response(e, DETAILS_PERMISSION_DENIED),
        }
    }
}

fn in_system_namespace(pod: &Pod) -> bool {
    pod.metadata
        .namespace
        .as_deref()
        .is_some_and(is_system_namespace)
}

fn error_response(err: GatewayError, permission_message: &str) -> Response {
    if err.is_permission() {
        Response::error(permission_message)
    } else {
        Response::error(err.to_string())
    }
}
