//! Pod details normalization
//!
//! Turns a raw pod and its events into the denormalized details document,
//! joining each declared container with its live status by name.

use std::collections::{BTreeMap, HashMap};

use k8s_openapi::api::core::v1::{
    Container, ContainerState, ContainerStatus, EnvVar, Event, Pod, ResourceRequirements, Volume,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use serde::Serialize;

use podview_types::{
    ContainerManifest, ContainerSpecView, ContainerStatusView, EnvVarRecord, EventSource,
    HostPortRecord, MountRecord, PodDetails, PodEvent, PodManifest, PodMetadata, PodSpecView,
    PodStatusView, PortRecord, ResourceRecord, VolumeRecord, VolumeSource,
};

use crate::summary::timestamp_text;

/// Build the details document for a pod and the events about it.
///
/// This is a pure function of its inputs. Missing optional data becomes
/// null or an empty list; it never fails.
pub fn normalize(pod: &Pod, events: &[Event]) -> PodDetails {
    let spec = pod.spec.as_ref();
    let status = pod.status.as_ref();

    let containers: &[Container] = spec.map(|s| s.containers.as_slice()).unwrap_or_default();
    let statuses: &[ContainerStatus] = status
        .and_then(|s| s.container_statuses.as_deref())
        .unwrap_or_default();
    let status_by_name: HashMap<&str, &ContainerStatus> =
        statuses.iter().map(|cs| (cs.name.as_str(), cs)).collect();

    let metadata = PodMetadata {
        name: pod.metadata.name.clone(),
        namespace: pod.metadata.namespace.clone(),
        labels: pod.metadata.labels.clone(),
        annotations: pod.metadata.annotations.clone(),
        creation_timestamp: timestamp_text(pod.metadata.creation_timestamp.as_ref()),
    };

    let spec_view = PodSpecView {
        node_name: spec.and_then(|s| s.node_name.clone()),
        containers: containers
            .iter()
            .map(|c| ContainerSpecView {
                name: c.name.clone(),
                image: c.image.clone(),
                ports: port_records(c),
                resources: c.resources.as_ref().map(resource_record),
            })
            .collect(),
    };

    let status_view = PodStatusView {
        phase: status.and_then(|s| s.phase.clone()),
        pod_ip: status.and_then(|s| s.pod_ip.clone()),
        host_ip: status.and_then(|s| s.host_ip.clone()),
        container_statuses: statuses
            .iter()
            .map(|cs| ContainerStatusView {
                name: cs.name.clone(),
                state: state_text(cs.state.as_ref()),
                ready: cs.ready,
                restart_count: cs.restart_count,
                image: cs.image.clone(),
                image_id: cs.image_id.clone(),
            })
            .collect(),
    };

    let manifest = PodManifest {
        name: pod.metadata.name.clone(),
        namespace: pod.metadata.namespace.clone(),
        priority: spec.and_then(|s| s.priority),
        node: spec.and_then(|s| s.node_name.clone()),
        start_time: status
            .and_then(|s| s.start_time.as_ref())
            .map(|t| timestamp_text(Some(t))),
        labels: pod.metadata.labels.clone(),
        annotations: pod.metadata.annotations.clone(),
        status: status.and_then(|s| s.phase.clone()),
        ip: status.and_then(|s| s.pod_ip.clone()),
        ips: status
            .and_then(|s| s.pod_ips.as_ref())
            .map(|ips| ips.iter().map(|ip| ip.ip.clone()).collect()),
        controlled_by: controlled_by(pod),
        // Spec order is authoritative
        containers: containers
            .iter()
            .map(|c| container_manifest(c, status_by_name.get(c.name.as_str()).copied()))
            .collect(),
        volumes: spec
            .and_then(|s| s.volumes.as_ref())
            .map(|volumes| volumes.iter().map(volume_record).collect())
            .unwrap_or_default(),
    };

    PodDetails {
        metadata,
        spec: spec_view,
        status: status_view,
        events: events.iter().map(event_record).collect(),
        manifest,
    }
}

/// `<Kind>/<Name>` of the first owner reference
fn controlled_by(pod: &Pod) -> Option<String> {
    let owner = pod.metadata.owner_references.as_ref()?.first()?;
    Some(format!("{}/{}", owner.kind, owner.name))
}

fn container_manifest(container: &Container, status: Option<&ContainerStatus>) -> ContainerManifest {
    ContainerManifest {
        name: container.name.clone(),
        container_id: status.and_then(|s| s.container_id.clone()),
        image: container.image.clone(),
        image_id: status.map(|s| s.image_id.clone()),
        ports: port_records(container),
        host_ports: host_port_records(container),
        command: non_empty(container.command.as_ref()),
        args: non_empty(container.args.as_ref()),
        state: status.map(|s| state_text(s.state.as_ref())),
        ready: status.is_some_and(|s| s.ready),
        restart_count: status.map_or(0, |s| s.restart_count),
        environment: container.env.iter().flatten().map(env_record).collect(),
        mounts: container
            .volume_mounts
            .iter()
            .flatten()
            .map(|m| MountRecord {
                name: m.name.clone(),
                mount_path: m.mount_path.clone(),
                read_only: m.read_only,
            })
            .collect(),
        resources: container.resources.as_ref().map(resource_record),
    }
}

fn port_records(container: &Container) -> Vec<PortRecord> {
    container
        .ports
        .iter()
        .flatten()
        .map(|p| PortRecord {
            container_port: p.container_port,
            protocol: p.protocol.clone(),
        })
        .collect()
}

/// Ports that also bind on the node
fn host_port_records(container: &Container) -> Vec<HostPortRecord> {
    container
        .ports
        .iter()
        .flatten()
        .filter_map(|p| {
            p.host_port.map(|host_port| HostPortRecord {
                host_port,
                protocol: p.protocol.clone(),
            })
        })
        .collect()
}

fn non_empty(list: Option<&Vec<String>>) -> Option<Vec<String>> {
    list.filter(|l| !l.is_empty()).cloned()
}

fn env_record(env: &EnvVar) -> EnvVarRecord {
    match &env.value_from {
        Some(source) => EnvVarRecord {
            name: env.name.clone(),
            value: None,
            value_from: Some(render(source)),
        },
        None => EnvVarRecord {
            name: env.name.clone(),
            value: env.value.clone().filter(|v| !v.is_empty()),
            value_from: None,
        },
    }
}

fn resource_record(resources: &ResourceRequirements) -> ResourceRecord {
    fn quantities(map: Option<&BTreeMap<String, Quantity>>) -> Option<BTreeMap<String, String>> {
        map.filter(|m| !m.is_empty()).map(|m| {
            m.iter()
                .map(|(name, quantity)| (name.clone(), quantity.0.clone()))
                .collect()
        })
    }

    ResourceRecord {
        requests: quantities(resources.requests.as_ref()),
        limits: quantities(resources.limits.as_ref()),
    }
}

/// Short human description of a container state
fn state_text(state: Option<&ContainerState>) -> String {
    let Some(state) = state else {
        return "unknown".to_string();
    };

    if let Some(running) = &state.running {
        format!("running (started {})", timestamp_text(running.started_at.as_ref()))
    } else if let Some(waiting) = &state.waiting {
        format!("waiting: {}", waiting.reason.as_deref().unwrap_or("Unknown"))
    } else if let Some(terminated) = &state.terminated {
        format!(
            "terminated: {} (exit code {})",
            terminated.reason.as_deref().unwrap_or("Unknown"),
            terminated.exit_code
        )
    } else {
        "unknown".to_string()
    }
}

/// Compact JSON rendering of an API sub-object
fn render<T: Serialize>(source: &T) -> String {
    serde_json::to_string(source).unwrap_or_default()
}

fn volume_record(volume: &Volume) -> VolumeRecord {
    let source = if let Some(s) = &volume.config_map {
        VolumeSource::ConfigMap(render(s))
    } else if let Some(s) = &volume.secret {
        VolumeSource::Secret(render(s))
    } else if let Some(s) = &volume.empty_dir {
        VolumeSource::EmptyDir(render(s))
    } else if let Some(s) = &volume.persistent_volume_claim {
        VolumeSource::PersistentVolumeClaim(render(s))
    } else if let Some(s) = &volume.host_path {
        VolumeSource::HostPath(render(s))
    } else if let Some(s) = &volume.downward_api {
        VolumeSource::DownwardApi(render(s))
    } else if let Some(s) = &volume.projected {
        VolumeSource::Projected(render(s))
    } else if let Some(s) = &volume.csi {
        VolumeSource::Csi(render(s))
    } else if let Some(s) = &volume.ephemeral {
        VolumeSource::Ephemeral(render(s))
    } else {
        VolumeSource::Other
    };

    VolumeRecord {
        name: volume.name.clone(),
        source,
    }
}

fn event_record(event: &Event) -> PodEvent {
    let source = event.source.as_ref();
    PodEvent {
        event_type: event.type_.clone(),
        reason: event.reason.clone(),
        message: event.message.clone(),
        last_timestamp: timestamp_text(event.last_timestamp.as_ref()),
        count: event.count,
        source: EventSource {
            component: source.and_then(|s| s.component.clone()),
            host: source.and_then(|s| s.host.clone()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{event, pod};
    use serde_json::json;

    fn web_pod() -> Pod {
        pod(json!({
            "metadata": {
                "name": "web-7d9-abcde",
                "namespace": "shop",
                "labels": {"app": "web"},
                "creationTimestamp": "2024-05-10T12:00:00Z",
                "ownerReferences": [
                    {"apiVersion": "apps/v1", "kind": "ReplicaSet", "name": "web-7d9", "uid": "1"},
                    {"apiVersion": "v1", "kind": "Node", "name": "ignored", "uid": "2"}
                ]
            },
            "spec": {
                "nodeName": "node-a",
                "priority": 1000,
                "containers": [
                    {
                        "name": "app",
                        "image": "web:2",
                        "command": ["/bin/web"],
                        "args": [],
                        "ports": [
                            {"containerPort": 8080, "protocol": "TCP"},
                            {"containerPort": 9090, "hostPort": 19090, "protocol": "TCP"}
                        ],
                        "env": [
                            {"name": "MODE", "value": "prod"},
                            {"name": "EMPTY", "value": ""},
                            {"name": "DB_PASSWORD", "valueFrom": {"secretKeyRef": {"name": "db", "key": "password"}}}
                        ],
                        "volumeMounts": [
                            {"name": "config", "mountPath": "/etc/web", "readOnly": true}
                        ],
                        "resources": {
                            "requests": {"cpu": "100m", "memory": "128Mi"},
                            "limits": {}
                        }
                    },
                    {"name": "sidecar", "image": "log:1"}
                ],
                "volumes": [
                    {"name": "config", "configMap": {"name": "web-config"}},
                    {"name": "creds", "secret": {"secretName": "db"}},
                    {"name": "scratch", "emptyDir": {}},
                    {"name": "repo", "gitRepo": {"repository": "https://example.com/r.git"}}
                ]
            },
            "status": {
                "phase": "Running",
                "podIP": "10.0.0.7",
                "hostIP": "192.168.1.4",
                "podIPs": [{"ip": "10.0.0.7"}],
                "startTime": "2024-05-10T12:00:05Z",
                "containerStatuses": [{
                    "name": "app",
                    "ready": true,
                    "restartCount": 4,
                    "image": "web:2",
                    "imageID": "sha256:feed",
                    "containerID": "containerd://abc",
                    "state": {"running": {"startedAt": "2024-05-10T12:00:07Z"}}
                }]
            }
        }))
    }

    #[test]
    fn test_container_without_status_gets_defaults() {
        let details = normalize(&web_pod(), &[]);
        let sidecar = &details.manifest.containers[1];

        assert_eq!(sidecar.name, "sidecar");
        assert!(!sidecar.ready);
        assert_eq!(sidecar.restart_count, 0);
        assert_eq!(sidecar.container_id, None);
        assert_eq!(sidecar.image_id, None);
        assert_eq!(sidecar.state, None);
        assert!(sidecar.mounts.is_empty());
        assert!(sidecar.environment.is_empty());
        assert_eq!(sidecar.resources, None);
    }

    #[test]
    fn test_container_joined_with_status() {
        let details = normalize(&web_pod(), &[]);
        let app = &details.manifest.containers[0];

        assert_eq!(app.container_id.as_deref(), Some("containerd://abc"));
        assert_eq!(app.image_id.as_deref(), Some("sha256:feed"));
        assert_eq!(app.state.as_deref(), Some("running (started 2024-05-10T12:00:07Z)"));
        assert!(app.ready);
        assert_eq!(app.restart_count, 4);
        assert_eq!(app.command, Some(vec!["/bin/web".to_string()]));
        assert_eq!(app.args, None);
    }

    #[test]
    fn test_spec_order_is_kept_when_status_order_differs() {
        let raw = pod(json!({
            "metadata": {"name": "p", "namespace": "ns"},
            "spec": {"containers": [{"name": "first"}, {"name": "second"}]},
            "status": {"containerStatuses": [
                {"name": "second", "ready": true, "restartCount": 2, "image": "b", "imageID": "b"},
                {"name": "first", "ready": false, "restartCount": 1, "image": "a", "imageID": "a"}
            ]}
        }));

        let containers = normalize(&raw, &[]).manifest.containers;
        let names: Vec<_> = containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["first", "second"]);
        assert_eq!(containers[0].restart_count, 1);
        assert_eq!(containers[1].restart_count, 2);
        assert!(containers[1].ready);
    }

    #[test]
    fn test_host_ports_projected_separately() {
        let app = &normalize(&web_pod(), &[]).manifest.containers[0];

        assert_eq!(app.ports.len(), 2);
        assert_eq!(
            app.host_ports,
            vec![HostPortRecord {
                host_port: 19090,
                protocol: Some("TCP".to_string()),
            }]
        );
    }

    #[test]
    fn test_environment_value_or_reference() {
        let app = &normalize(&web_pod(), &[]).manifest.containers[0];
        let env = &app.environment;

        assert_eq!(env[0].value.as_deref(), Some("prod"));
        assert_eq!(env[0].value_from, None);

        assert_eq!(env[1].value, None);
        assert_eq!(env[1].value_from, None);

        assert_eq!(env[2].value, None);
        let reference = env[2].value_from.as_deref().unwrap();
        assert!(reference.contains("secretKeyRef"));
        assert!(reference.contains("password"));
    }

    #[test]
    fn test_resources_drop_empty_maps() {
        let app = &normalize(&web_pod(), &[]).manifest.containers[0];
        let resources = app.resources.as_ref().unwrap();

        let requests = resources.requests.as_ref().unwrap();
        assert_eq!(requests["cpu"], "100m");
        assert_eq!(requests["memory"], "128Mi");
        assert_eq!(resources.limits, None);
    }

    #[test]
    fn test_volumes_carry_one_source_each() {
        let volumes = normalize(&web_pod(), &[]).manifest.volumes;

        assert!(matches!(volumes[0].source, VolumeSource::ConfigMap(_)));
        assert!(matches!(volumes[1].source, VolumeSource::Secret(_)));
        assert_eq!(volumes[2].source, VolumeSource::EmptyDir("{}".to_string()));
        assert_eq!(volumes[3].source, VolumeSource::Other);

        let secret = serde_json::to_value(&volumes[1]).unwrap();
        let populated: Vec<_> = secret
            .as_object()
            .unwrap()
            .iter()
            .filter(|(k, v)| k.as_str() != "name" && !v.is_null())
            .map(|(k, _)| k.as_str())
            .collect();
        assert_eq!(populated, ["secret"]);
    }

    #[test]
    fn test_controlled_by_first_owner() {
        let details = normalize(&web_pod(), &[]);
        assert_eq!(details.manifest.controlled_by.as_deref(), Some("ReplicaSet/web-7d9"));

        let orphan = pod(json!({
            "metadata": {"name": "solo", "namespace": "ns", "ownerReferences": []}
        }));
        assert_eq!(normalize(&orphan, &[]).manifest.controlled_by, None);
    }

    #[test]
    fn test_pod_level_fields() {
        let details = normalize(&web_pod(), &[]);
        let manifest = &details.manifest;

        assert_eq!(manifest.priority, Some(1000));
        assert_eq!(manifest.node.as_deref(), Some("node-a"));
        assert_eq!(manifest.start_time.as_deref(), Some("2024-05-10T12:00:05Z"));
        assert_eq!(manifest.ips, Some(vec!["10.0.0.7".to_string()]));
        assert_eq!(details.status.host_ip.as_deref(), Some("192.168.1.4"));
        assert_eq!(details.metadata.creation_timestamp, "2024-05-10T12:00:00Z");
        assert_eq!(details.spec.containers.len(), 2);
        assert_eq!(details.status.container_statuses.len(), 1);
    }

    #[test]
    fn test_bare_pod_normalizes() {
        let details = normalize(&pod(json!({"metadata": {"name": "bare"}})), &[]);

        assert!(details.manifest.containers.is_empty());
        assert!(details.manifest.volumes.is_empty());
        assert_eq!(details.manifest.start_time, None);
        assert_eq!(details.manifest.ips, None);
        assert_eq!(details.metadata.creation_timestamp, "None");
    }

    #[test]
    fn test_events_attached_in_given_order() {
        let events = vec![
            event(json!({
                "metadata": {"name": "e2"},
                "involvedObject": {"name": "web-7d9-abcde", "namespace": "shop"},
                "type": "Warning",
                "reason": "BackOff",
                "message": "Back-off restarting failed container",
                "count": 3,
                "lastTimestamp": "2024-05-10T12:05:00Z",
                "source": {"component": "kubelet", "host": "node-a"}
            })),
            event(json!({
                "metadata": {"name": "e1"},
                "involvedObject": {"name": "web-7d9-abcde", "namespace": "shop"},
                "type": "Normal",
                "reason": "Scheduled"
            })),
        ];

        let details = normalize(&web_pod(), &events);
        assert_eq!(details.events.len(), 2);
        assert_eq!(details.events[0].reason.as_deref(), Some("BackOff"));
        assert_eq!(details.events[0].count, Some(3));
        assert_eq!(details.events[0].source.component.as_deref(), Some("kubelet"));
        assert_eq!(details.events[1].last_timestamp, "None");
        assert_eq!(details.events[1].source, EventSource::default());
    }

    #[test]
    fn test_state_text_variants() {
        let waiting: ContainerState =
            serde_json::from_value(json!({"waiting": {"reason": "CrashLoopBackOff"}})).unwrap();
        assert_eq!(state_text(Some(&waiting)), "waiting: CrashLoopBackOff");

        let terminated: ContainerState =
            serde_json::from_value(json!({"terminated": {"reason": "OOMKilled", "exitCode": 137}}))
                .unwrap();
        assert_eq!(
            state_text(Some(&terminated)),
            "terminated: OOMKilled (exit code 137)"
        );

        assert_eq!(state_text(None), "unknown");
    }

    #[test]
    fn test_normalize_is_deterministic() {
        let raw = web_pod();
        let first = serde_json::to_string(&normalize(&raw, &[])).unwrap();
        let second = serde_json::to_string(&normalize(&raw, &[])).unwrap();
        assert_eq!(first, second);
    }
}
