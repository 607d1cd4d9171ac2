use chrono::SecondsFormat;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;

use podview_types::{MISSING_TIMESTAMP, PodSummary};

/// Canonical text for an optional API timestamp
pub fn timestamp_text(time: Option<&Time>) -> String {
    time.map(|t| t.0.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_else(|| MISSING_TIMESTAMP.to_string())
}

/// Project a raw pod into its listing row
pub fn summarize(pod: &Pod, context: &str) -> PodSummary {
    let status = pod.status.as_ref();

    // Pods that are not running yet have no container statuses
    let total_restart_count = status
        .and_then(|s| s.container_statuses.as_ref())
        .map(|statuses| statuses.iter().map(|cs| i64::from(cs.restart_count)).sum())
        .unwrap_or(0);

    PodSummary {
        name: pod.metadata.name.clone().unwrap_or_default(),
        namespace: pod.metadata.namespace.clone().unwrap_or_default(),
        phase: status.and_then(|s| s.phase.clone()),
        total_restart_count,
        context: context.to_string(),
        creation_timestamp_text: timestamp_text(pod.metadata.creation_timestamp.as_ref()),
    }
}
