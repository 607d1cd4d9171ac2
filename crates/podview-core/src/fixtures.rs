//! Raw API records for tests

use k8s_openapi::api::core::v1::{Event, Pod};
use serde_json::{Value, json};

fn with_type_meta(mut value: Value, kind: &str) -> Value {
    if let Some(object) = value.as_object_mut() {
        object.entry("apiVersion").or_insert_with(|| json!("v1"));
        object.entry("kind").or_insert_with(|| json!(kind));
    }
    value
}

pub fn pod(value: Value) -> Pod {
    serde_json::from_value(with_type_meta(value, "Pod")).unwrap()
}

pub fn event(value: Value) -> Event {
    serde_json::from_value(with_type_meta(value, "Event")).unwrap()
}

/// A running pod in `namespace` with one container that restarted `restarts` times
pub fn running_pod(name: &str, namespace: &str, restarts: i32) -> Pod {
    pod(json!({
        "metadata": {
            "name": name,
            "namespace": namespace,
            "creationTimestamp": "2024-05-10T12:00:00Z"
        },
        "spec": {"containers": [{"name": "main", "image": "app:1"}]},
        "status": {
            "phase": "Running",
            "containerStatuses": [{
                "name": "main",
                "ready": true,
                "restartCount": restarts,
                "image": "app:1",
                "imageID": "sha256:0"
            }]
        }
    }))
}
