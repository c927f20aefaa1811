// src/cluster/mod.rs

//! Pluggable cluster capability.
//!
//! The orchestrator, pod discovery and the sync engine talk to a
//! [`ClusterClient`] instead of a concrete API binding. Production code uses
//! [`KubectlClient`], which drives `kubectl`; tests provide an in-memory fake
//! that records every call.

pub mod kubectl;

pub use kubectl::KubectlClient;

use std::fmt;
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::Deserialize;

use crate::errors::ClusterError;
use crate::resource::{DeploymentDescriptor, ServiceDescriptor};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
pub type ClusterResult<T> = std::result::Result<T, ClusterError>;

/// Pod lifecycle phase as reported by the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum PodPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    #[serde(other)]
    Unknown,
}

impl PodPhase {
    /// `Succeeded` and `Failed` pods never run again.
    pub fn is_terminal(self) -> bool {
        matches!(self, PodPhase::Succeeded | PodPhase::Failed)
    }
}

impl fmt::Display for PodPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PodPhase::Pending => "Pending",
            PodPhase::Running => "Running",
            PodPhase::Succeeded => "Succeeded",
            PodPhase::Failed => "Failed",
            PodPhase::Unknown => "Unknown",
        };
        f.write_str(s)
    }
}

/// Read-only view of a pod owned by the cluster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PodRef {
    pub name: String,
    pub phase: PodPhase,
}

impl PodRef {
    pub fn new(name: impl Into<String>, phase: PodPhase) -> Self {
        Self {
            name: name.into(),
            phase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageClaim {
    pub name: String,
}

/// Path filters understood by the copy transport.
///
/// Empty `include` means "everything under the source root".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyFilters {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

/// Operations podrun needs from a cluster.
///
/// Every call is a single blocking step from the caller's point of view;
/// implementations must not retry on their own.
pub trait ClusterClient: Send + Sync {
    /// Namespace every call operates in.
    fn namespace(&self) -> &str;

    fn create_service<'a>(
        &'a self,
        service: &'a ServiceDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>>;

    fn create_deployment<'a>(
        &'a self,
        deployment: &'a DeploymentDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>>;

    /// All pods matching `selector`, in any phase.
    fn list_pods<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, ClusterResult<Vec<PodRef>>>;

    /// All persistent volume claims matching `selector`.
    fn list_claims<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, ClusterResult<Vec<StorageClaim>>>;

    /// Run `command` in `container` of `pod`, streaming its stdout and stderr
    /// to our stdout. A non-zero exit is reported as
    /// [`ClusterError::NonZeroExit`].
    fn exec<'a>(
        &'a self,
        pod: &'a str,
        container: &'a str,
        command: &'a [String],
    ) -> BoxFuture<'a, ClusterResult<()>>;

    /// Recursively copy the contents of `local` into `remote` inside the pod.
    fn copy_to_pod<'a>(
        &'a self,
        local: &'a Path,
        pod: &'a str,
        container: &'a str,
        remote: &'a str,
        filters: &'a CopyFilters,
    ) -> BoxFuture<'a, ClusterResult<()>>;
}
