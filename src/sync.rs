// src/sync.rs

//! Source synchronisation into the runtime pod.
//!
//! Always a full wipe-and-recopy: wait for a running pod, reset the target
//! directory, then copy the whole local tree. The reset always comes first,
//! and a failed reset means nothing is copied.

use std::io;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info};

use crate::cluster::{ClusterClient, CopyFilters, PodPhase, PodRef};
use crate::config::DiscoverySection;
use crate::discovery::PodDiscovery;
use crate::errors::{ClusterError, SyncError};
use crate::resource::LabelSelector;

pub struct SyncEngine<'a, C: ?Sized> {
    client: &'a C,
    discovery: PodDiscovery<'a, C>,
    ready_timeout: Option<Duration>,
}

impl<'a, C: ClusterClient + ?Sized> SyncEngine<'a, C> {
    pub fn new(client: &'a C, discovery: &DiscoverySection) -> Self {
        Self {
            client,
            discovery: PodDiscovery::new(client, discovery.poll_interval()),
            ready_timeout: discovery.ready_timeout(),
        }
    }

    /// Replace `target` inside the runtime container with the contents of
    /// `source`. Returns the pod that received the files.
    pub async fn sync(
        &self,
        selector: &LabelSelector,
        source: &Path,
        target: &str,
        container: &str,
    ) -> Result<PodRef, SyncError> {
        if !source.is_dir() {
            return Err(SyncError::TransferFailed {
                local: source.to_path_buf(),
                pod: String::new(),
                target: target.to_string(),
                source: ClusterError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    "source is not a directory",
                )),
            });
        }

        debug!(selector = %selector, "waiting for a running pod before syncing");
        let pod = self
            .discovery
            .wait_for(selector, PodPhase::Running, self.ready_timeout)
            .await
            .map_err(SyncError::TargetUnavailable)?;

        let reset = reset_command(target);
        self.client
            .exec(&pod.name, container, &reset)
            .await
            .map_err(|source| SyncError::ResetFailed {
                pod: pod.name.clone(),
                target: target.to_string(),
                source,
            })?;

        info!(
            pod = %pod.name,
            source = %source.display(),
            target = %target,
            "copying source tree"
        );
        self.client
            .copy_to_pod(source, &pod.name, container, target, &CopyFilters::default())
            .await
            .map_err(|err| SyncError::TransferFailed {
                local: source.to_path_buf(),
                pod: pod.name.clone(),
                target: target.to_string(),
                source: err,
            })?;

        info!(pod = %pod.name, "source synced");
        Ok(pod)
    }
}

/// `rm -rf <target> && mkdir -p <target>` wrapped for `/bin/sh -c`.
pub fn reset_command(target: &str) -> Vec<String> {
    let quoted = shell_quote(target);
    vec![
        "/bin/sh".to_string(),
        "-c".to_string(),
        format!("rm -rf {quoted} && mkdir -p {quoted}"),
    ]
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-'));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
