// src/engine/mod.rs

//! Runtime orchestration.
//!
//! One invocation walks these stages in order:
//!
//! ```text
//! resolve-claim -> capture-source -> probe -+-> (reuse) --------------------------+-> sync -> execute
//!                                           +-> create-service -> create-deployment -> await-ready -+
//! ```
//!
//! Any failure stops the walk and is reported with its [`Stage`]. Nothing is
//! rolled back: resources created before the failure stay, so the next run
//! picks them up at the probe.

use std::fmt;
use std::path::PathBuf;

use crate::exec::TaskCommand;
use crate::resource::{DeploymentDescriptor, RuntimeTaskSpec, ServiceDescriptor};
use crate::types::BuildMode;

pub mod orchestrator;

pub use orchestrator::Orchestrator;

/// Step of the runtime flow, used to tag failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    ResolveClaim,
    CaptureSource,
    Probe,
    CreateService,
    CreateDeployment,
    AwaitReady,
    Sync,
    Execute,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::ResolveClaim => "resolve-claim",
            Stage::CaptureSource => "capture-source",
            Stage::Probe => "probe",
            Stage::CreateService => "create-service",
            Stage::CreateDeployment => "create-deployment",
            Stage::AwaitReady => "await-ready",
            Stage::Sync => "sync",
            Stage::Execute => "execute",
        };
        f.write_str(s)
    }
}

/// Input of one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub project_name: String,
    pub mode: BuildMode,
    /// Local tree to sync. `None` means the current working directory.
    pub source_root: Option<PathBuf>,
}

impl RunRequest {
    pub fn new(project_name: impl Into<String>, mode: BuildMode) -> Self {
        Self {
            project_name: project_name.into(),
            mode,
            source_root: None,
        }
    }

    pub fn with_source_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.source_root = Some(root.into());
        self
    }
}

/// What a successful run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub pod_name: String,
    /// `true` if this run created the Service and Deployment (or adopted
    /// them after a conflict); `false` if a running pod was reused.
    pub provisioned: bool,
    pub command: TaskCommand,
}

/// Everything a run would submit, computed without creating anything.
#[derive(Debug, Clone)]
pub struct RuntimePlan {
    pub spec: RuntimeTaskSpec,
    pub service: ServiceDescriptor,
    pub deployment: DeploymentDescriptor,
    pub command: TaskCommand,
}
