//! Kubernetes access for podview
//!
//! This crate enumerates the contexts configured in the local kubeconfig and
//! performs the read-only pod, log and event calls against any one of them.

mod client;
mod error;
mod registry;

pub use client::{ClusterGateway, KubeGateway};
pub use error::{GatewayError, Result};
pub use registry::{ContextSource, KubeconfigRegistry};

// Re-export the raw records that flow through our public API
pub use k8s_openapi::api::core::v1::{Event, Pod};
