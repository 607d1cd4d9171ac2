//! Shared types for podview
//!
//! This crate contains the wire shapes produced by the aggregation layer:
//! flat pod summaries for the listing view, the denormalized pod details
//! document for the detail view, and the response envelopes around them.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Namespaces that never appear in pod listings
pub const SYSTEM_NAMESPACES: [&str; 2] = ["kube-system", "gke-gmp-system"];

/// Text used in place of a timestamp the cluster did not report
pub const MISSING_TIMESTAMP: &str = "None";

/// Whether a namespace is excluded from listings by policy
pub fn is_system_namespace(namespace: &str) -> bool {
    SYSTEM_NAMESPACES.contains(&namespace)
}

// ============================================================================
// Context selection
// ============================================================================

/// Which contexts a listing should cover
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextSelector {
    All,
    Named(String),
}

impl From<&str> for ContextSelector {
    fn from(s: &str) -> Self {
        match s {
            "all" => Self::All,
            name => Self::Named(name.to_string()),
        }
    }
}

// ============================================================================
// Listing view
// ============================================================================

/// One row of the pod listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PodSummary {
    pub name: String,
    pub namespace: String,
    #[serde(rename = "status")]
    pub phase: Option<String>,
    /// Sum of restart counts over all container statuses
    #[serde(rename = "restarts")]
    pub total_restart_count: i64,
    pub context: String,
    #[serde(rename = "age")]
    pub creation_timestamp_text: String,
}

// ============================================================================
// Detail view
// ============================================================================

/// Full detail document for a single pod
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodDetails {
    pub metadata: PodMetadata,
    pub spec: PodSpecView,
    pub status: PodStatusView,
    pub events: Vec<PodEvent>,
    pub manifest: PodManifest,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodMetadata {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,
    pub creation_timestamp: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodSpecView {
    pub node_name: Option<String>,
    pub containers: Vec<ContainerSpecView>,
}

/// Declared container as it appears in the pod spec
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerSpecView {
    pub name: String,
    pub image: Option<String>,
    pub ports: Vec<PortRecord>,
    pub resources: Option<ResourceRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodStatusView {
    pub phase: Option<String>,
    pub pod_ip: Option<String>,
    pub host_ip: Option<String>,
    pub container_statuses: Vec<ContainerStatusView>,
}

/// Live container status as reported by the kubelet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerStatusView {
    pub name: String,
    pub state: String,
    pub ready: bool,
    pub restart_count: i32,
    pub image: String,
    pub image_id: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodEvent {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub reason: Option<String>,
    pub message: Option<String>,
    pub last_timestamp: String,
    pub count: Option<i32>,
    pub source: EventSource,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EventSource {
    pub component: Option<String>,
    pub host: Option<String>,
}

/// The denormalized manifest: metadata, spec and status joined per container
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PodManifest {
    pub name: Option<String>,
    pub namespace: Option<String>,
    pub priority: Option<i32>,
    pub node: Option<String>,
    pub start_time: Option<String>,
    pub labels: Option<BTreeMap<String, String>>,
    pub annotations: Option<BTreeMap<String, String>>,
    pub status: Option<String>,
    pub ip: Option<String>,
    pub ips: Option<Vec<String>>,
    /// `<Kind>/<Name>` of the first owner reference
    pub controlled_by: Option<String>,
    pub containers: Vec<ContainerManifest>,
    pub volumes: Vec<VolumeRecord>,
}

/// A container spec joined with its status by name.
///
/// Status-sourced fields are null (or `false`/`0`) when the container has
/// no status yet.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ContainerManifest {
    pub name: String,
    pub container_id: Option<String>,
    pub image: Option<String>,
    pub image_id: Option<String>,
    pub ports: Vec<PortRecord>,
    pub host_ports: Vec<HostPortRecord>,
    pub command: Option<Vec<String>>,
    pub args: Option<Vec<String>>,
    pub state: Option<String>,
    pub ready: bool,
    pub restart_count: i32,
    pub environment: Vec<EnvVarRecord>,
    pub mounts: Vec<MountRecord>,
    pub resources: Option<ResourceRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortRecord {
    pub container_port: i32,
    pub protocol: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HostPortRecord {
    pub host_port: i32,
    pub protocol: Option<String>,
}

/// Environment variable; at most one of `value` and `value_from` is set
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EnvVarRecord {
    pub name: String,
    pub value: Option<String>,
    pub value_from: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MountRecord {
    pub name: String,
    pub mount_path: String,
    pub read_only: Option<bool>,
}

/// Resource requests and limits keyed by resource name
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceRecord {
    pub requests: Option<BTreeMap<String, String>>,
    pub limits: Option<BTreeMap<String, String>>,
}

// ============================================================================
// Volumes
// ============================================================================

/// Source backing a pod volume, carrying a descriptive rendering of it
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VolumeSource {
    ConfigMap(String),
    Secret(String),
    EmptyDir(String),
    PersistentVolumeClaim(String),
    HostPath(String),
    DownwardApi(String),
    Projected(String),
    Csi(String),
    Ephemeral(String),
    /// Any source type without a wire key of its own
    Other,
}

impl VolumeSource {
    /// Wire keys, one per renderable source type
    pub const KEYS: [&'static str; 9] = [
        "config_map",
        "secret",
        "empty_dir",
        "persistent_volume_claim",
        "host_path",
        "downward_api",
        "projected",
        "csi",
        "ephemeral",
    ];

    /// Wire key for this source, if it is one of the rendered types
    pub fn key(&self) -> Option<&'static str> {
        match self {
            Self::ConfigMap(_) => Some("config_map"),
            Self::Secret(_) => Some("secret"),
            Self::EmptyDir(_) => Some("empty_dir"),
            Self::PersistentVolumeClaim(_) => Some("persistent_volume_claim"),
            Self::HostPath(_) => Some("host_path"),
            Self::DownwardApi(_) => Some("downward_api"),
            Self::Projected(_) => Some("projected"),
            Self::Csi(_) => Some("csi"),
            Self::Ephemeral(_) => Some("ephemeral"),
            Self::Other => None,
        }
    }

    pub fn rendering(&self) -> Option<&str> {
        match self {
            Self::ConfigMap(s)
            | Self::Secret(s)
            | Self::EmptyDir(s)
            | Self::PersistentVolumeClaim(s)
            | Self::HostPath(s)
            | Self::DownwardApi(s)
            | Self::Projected(s)
            | Self::Csi(s)
            | Self::Ephemeral(s) => Some(s),
            Self::Other => None,
        }
    }
}

/// A pod-level volume.
///
/// Serializes to the flat shape `{name, config_map, secret, ...}` where
/// exactly the key matching `source` carries a value and the rest are null.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VolumeRecord {
    pub name: String,
    pub source: VolumeSource,
}

impl Serialize for VolumeRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("VolumeRecord", 10)?;
        state.serialize_field("name", &self.name)?;
        for key in VolumeSource::KEYS {
            let value = if self.source.key() == Some(key) {
                self.source.rendering()
            } else {
                None
            };
            state.serialize_field(key, &value)?;
        }
        state.end()
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Top-level response body.
///
/// Each variant serializes as a single-key object, e.g. `{"pods": [...]}`
/// or `{"error": "..."}`.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Contexts(Vec<String>),
    Pods(Vec<PodSummary>),
    Logs(String),
    PodDetails(Box<PodDetails>),
    Error(String),
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(message.into())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}
