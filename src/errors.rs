// src/errors.rs

//! Crate-wide error types.
//!
//! Errors are layered the same way the runtime flow is: the cluster transport
//! reports [`ClusterError`], pod discovery wraps it in [`DiscoveryError`], the
//! sync engine in [`SyncError`], and the orchestrator tags everything with the
//! step that failed in [`PodrunError`].

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::cluster::PodPhase;
use crate::engine::Stage;

/// Failure reported by a [`crate::cluster::ClusterClient`] implementation.
#[derive(Error, Debug)]
pub enum ClusterError {
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    #[error("request rejected by cluster: {0}")]
    Rejected(String),

    #[error("remote command exited with code {code}")]
    NonZeroExit { code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ClusterError {
    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClusterError::AlreadyExists(_))
    }
}

#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("pod '{pod}' matching '{selector}' ended in phase {phase}")]
    PodTerminated {
        selector: String,
        pod: String,
        phase: PodPhase,
    },

    #[error("no pod matching '{selector}' reached phase {phase} within {waited:?}")]
    TimedOut {
        selector: String,
        phase: PodPhase,
        waited: Duration,
    },

    #[error("listing pods matching '{selector}' failed: {source}")]
    Cluster {
        selector: String,
        #[source]
        source: ClusterError,
    },
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("sync target unavailable: {0}")]
    TargetUnavailable(#[source] DiscoveryError),

    #[error("sync precondition failed: could not reset {target} in pod '{pod}': {source}")]
    ResetFailed {
        pod: String,
        target: String,
        #[source]
        source: ClusterError,
    },

    #[error("sync transfer failed: could not copy {local:?} to {pod}:{target}: {source}")]
    TransferFailed {
        local: PathBuf,
        pod: String,
        target: String,
        #[source]
        source: ClusterError,
    },
}

#[derive(Error, Debug)]
pub enum PodrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("unable to get the storage claim: {0}")]
    ClaimLookup(#[source] ClusterError),

    #[error("{} storage claims match '{selector}': {}", .names.len(), .names.join(", "))]
    ClaimAmbiguous { selector: String, names: Vec<String> },

    #[error("unable to determine the source root: {0}")]
    SourceRoot(#[source] std::io::Error),

    #[error("checking for an existing runtime failed: {0}")]
    Probe(#[source] DiscoveryError),

    #[error("unable to create runtime service '{name}': {source}")]
    ServiceCreate {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("unable to create runtime deployment '{name}': {source}")]
    DeploymentCreate {
        name: String,
        #[source]
        source: ClusterError,
    },

    #[error("the runtime container failed to run: {0}")]
    Readiness(#[source] DiscoveryError),

    #[error("unable to sync to the pod: {0}")]
    Sync(#[from] SyncError),

    #[error("unable to exec command {command} in pod '{pod}': {source}")]
    Execute {
        command: String,
        pod: String,
        #[source]
        source: ClusterError,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PodrunError {
    /// Orchestration step this error aborted, if it came from one.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PodrunError::ClaimLookup(_) | PodrunError::ClaimAmbiguous { .. } => {
                Some(Stage::ResolveClaim)
            }
            PodrunError::SourceRoot(_) => Some(Stage::CaptureSource),
            PodrunError::Probe(_) => Some(Stage::Probe),
            PodrunError::ServiceCreate { .. } => Some(Stage::CreateService),
            PodrunError::DeploymentCreate { .. } => Some(Stage::CreateDeployment),
            PodrunError::Readiness(_) => Some(Stage::AwaitReady),
            PodrunError::Sync(_) => Some(Stage::Sync),
            PodrunError::Execute { .. } => Some(Stage::Execute),
            PodrunError::ConfigError(_)
            | PodrunError::IoError(_)
            | PodrunError::TomlError(_)
            | PodrunError::Other(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PodrunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_claims_list_every_name() {
        let err = PodrunError::ClaimAmbiguous {
            selector: "app=idp".into(),
            names: vec!["a".into(), "b".into()],
        };
        assert_eq!(err.to_string(), "2 storage claims match 'app=idp': a, b");
        assert_eq!(err.stage(), Some(Stage::ResolveClaim));
    }

    #[test]
    fn sync_errors_name_the_failed_step() {
        let err = PodrunError::from(SyncError::ResetFailed {
            pod: "p".into(),
            target: "/src".into(),
            source: ClusterError::NonZeroExit { code: 1 },
        });
        let msg = err.to_string();
        assert!(msg.contains("sync precondition failed"), "{msg}");
        assert!(msg.contains("exited with code 1"), "{msg}");
        assert_eq!(err.stage(), Some(Stage::Sync));
    }

    #[test]
    fn config_errors_have_no_stage() {
        assert_eq!(PodrunError::ConfigError("x".into()).stage(), None);
    }
}
