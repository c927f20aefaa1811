// src/cluster/kubectl.rs

//! [`ClusterClient`] backed by the `kubectl` binary.
//!
//! - Creates submit the JSON descriptor on stdin to `kubectl create -f -`.
//! - Lists use `kubectl get ... -o json` and only decode the fields podrun reads.
//! - Exec streams remote output line by line to our stdout.
//! - Copy pipes a local `tar` archive into `tar -x` running inside the pod.

use std::io;
use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, anyhow};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, trace, warn};

use super::{
    BoxFuture, ClusterClient, ClusterResult, CopyFilters, PodPhase, PodRef, StorageClaim,
};
use crate::config::ClusterSection;
use crate::errors::ClusterError;
use crate::resource::{DeploymentDescriptor, ServiceDescriptor};

const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone)]
pub struct KubectlClient {
    kubectl: String,
    namespace: String,
}

impl KubectlClient {
    pub fn new(kubectl: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            kubectl: kubectl.into(),
            namespace: namespace.into(),
        }
    }

    /// Build a client, resolving the namespace from (in order) the explicit
    /// override, `[cluster].namespace`, and the current kubeconfig context.
    pub async fn connect(
        cluster: &ClusterSection,
        namespace_override: Option<&str>,
    ) -> ClusterResult<Self> {
        let namespace = match namespace_override
            .map(str::to_string)
            .or_else(|| cluster.namespace.clone())
        {
            Some(ns) => ns,
            None => current_namespace(&cluster.kubectl).await?,
        };
        debug!(namespace = %namespace, "using namespace");
        Ok(Self::new(cluster.kubectl.clone(), namespace))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.kubectl);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Run kubectl to completion, returning stdout on success.
    async fn run_captured(&self, args: &[&str], stdin: Option<Vec<u8>>) -> ClusterResult<Vec<u8>> {
        trace!(kubectl = %self.kubectl, ?args, "invoking kubectl");

        let mut cmd = self.command();
        cmd.args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            });

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{}'", self.kubectl))?;

        // Feed stdin while stdout/stderr are collected; kubectl may exit
        // (or block on a full pipe) before it reads everything.
        let pipe = child.stdin.take();
        let feed = async move {
            match (pipe, stdin) {
                (Some(mut pipe), Some(input)) => pipe.write_all(&input).await,
                _ => Ok(()),
            }
        };
        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        let output = output?;

        if !output.status.success() {
            return Err(classify_failure(&output.stderr, output.status.code()));
        }
        match fed {
            Err(err) if err.kind() != io::ErrorKind::BrokenPipe => Err(err.into()),
            _ => Ok(output.stdout),
        }
    }

    async fn create_from_json(&self, body: Vec<u8>) -> ClusterResult<()> {
        self.run_captured(&["create", "-n", self.namespace.as_str(), "-f", "-"], Some(body))
            .await
            .map(|_| ())
    }

    async fn exec_streaming(
        &self,
        pod: &str,
        container: &str,
        command: &[String],
    ) -> ClusterResult<()> {
        let mut cmd = self.command();
        cmd.args(["exec", "-n", self.namespace.as_str(), pod, "-c", container, "--"])
            .args(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning '{} exec' for pod '{pod}'", self.kubectl))?;

        let forwarders: Vec<_> = [
            child.stdout.take().map(|s| tokio::spawn(forward_lines(s))),
            child.stderr.take().map(|s| tokio::spawn(forward_lines(s))),
        ]
        .into_iter()
        .flatten()
        .collect();

        let status = child.wait().await?;
        for handle in forwarders {
            let _ = handle.await;
        }

        if status.success() {
            Ok(())
        } else {
            Err(ClusterError::NonZeroExit {
                code: status.code().unwrap_or(-1),
            })
        }
    }

    async fn copy_archive(
        &self,
        local: &Path,
        pod: &str,
        container: &str,
        remote: &str,
        filters: &CopyFilters,
    ) -> ClusterResult<()> {
        if !local.is_dir() {
            return Err(ClusterError::Io(io::Error::new(
                io::ErrorKind::NotFound,
                format!("source directory {} does not exist", local.display()),
            )));
        }

        let mut pack = Command::new("tar");
        pack.arg("-cf").arg("-");
        for pattern in &filters.exclude {
            pack.arg(format!("--exclude={pattern}"));
        }
        pack.arg("-C").arg(local);
        if filters.include.is_empty() {
            pack.arg(".");
        } else {
            pack.args(&filters.include);
        }
        pack.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut unpack = self.command();
        unpack
            .args(["exec", "-i", "-n", self.namespace.as_str(), pod, "-c", container])
            .args(["--", "tar", "-xf", "-", "-C", remote])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut packer = pack.spawn().context("spawning local tar")?;
        let mut unpacker = unpack
            .spawn()
            .with_context(|| format!("spawning '{} exec -i' for pod '{pod}'", self.kubectl))?;

        let mut archive = packer
            .stdout
            .take()
            .ok_or_else(|| anyhow!("tar stdout was not captured"))?;
        let mut sink = unpacker
            .stdin
            .take()
            .ok_or_else(|| anyhow!("kubectl stdin was not captured"))?;

        // Both ends are closed as soon as the transfer stops, so an early
        // exit on one side unblocks the other instead of leaving it stuck on
        // a full pipe. Stderr of both processes is drained alongside.
        let transfer = async move {
            let copied = tokio::io::copy(&mut archive, &mut sink).await;
            drop(sink);
            drop(archive);
            copied
        };
        let (copied, pack_stderr, unpack_stderr) = tokio::join!(
            transfer,
            read_to_end(packer.stderr.take()),
            read_to_end(unpacker.stderr.take()),
        );
        let (packed, unpacked) = tokio::join!(packer.wait(), unpacker.wait());
        let (packed, unpacked) = (packed?, unpacked?);

        // The remote side failing usually makes the local tar fail too, so
        // its error is the one worth reporting.
        if !unpacked.success() {
            return Err(classify_failure(&unpack_stderr, unpacked.code()));
        }
        if !packed.success() {
            return Err(ClusterError::Rejected(format!(
                "local tar failed: {}",
                String::from_utf8_lossy(&pack_stderr).trim()
            )));
        }

        let bytes = copied?;
        debug!(pod = %pod, remote = %remote, bytes, "archive streamed into pod");
        Ok(())
    }
}

impl ClusterClient for KubectlClient {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn create_service<'a>(
        &'a self,
        service: &'a ServiceDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            let body = serde_json::to_vec(service)?;
            self.create_from_json(body).await
        })
    }

    fn create_deployment<'a>(
        &'a self,
        deployment: &'a DeploymentDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            let body = serde_json::to_vec(deployment)?;
            self.create_from_json(body).await
        })
    }

    fn list_pods<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, ClusterResult<Vec<PodRef>>> {
        Box::pin(async move {
            let out = self
                .run_captured(
                    &["get", "pods", "-n", self.namespace.as_str(), "-l", selector, "-o", "json"],
                    None,
                )
                .await?;
            parse_pods(&out)
        })
    }

    fn list_claims<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, ClusterResult<Vec<StorageClaim>>> {
        Box::pin(async move {
            let out = self
                .run_captured(
                    &["get", "pvc", "-n", self.namespace.as_str(), "-l", selector, "-o", "json"],
                    None,
                )
                .await?;
            parse_claims(&out)
        })
    }

    fn exec<'a>(
        &'a self,
        pod: &'a str,
        container: &'a str,
        command: &'a [String],
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(self.exec_streaming(pod, container, command))
    }

    fn copy_to_pod<'a>(
        &'a self,
        local: &'a Path,
        pod: &'a str,
        container: &'a str,
        remote: &'a str,
        filters: &'a CopyFilters,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(self.copy_archive(local, pod, container, remote, filters))
    }
}

/// Namespace of the current kubeconfig context, or `default` when unset.
async fn current_namespace(kubectl: &str) -> ClusterResult<String> {
    let client = KubectlClient::new(kubectl, DEFAULT_NAMESPACE);
    let out = client
        .run_captured(
            &["config", "view", "--minify", "-o", "jsonpath={..namespace}"],
            None,
        )
        .await?;
    let ns = String::from_utf8_lossy(&out).trim().to_string();
    if ns.is_empty() {
        Ok(DEFAULT_NAMESPACE.to_string())
    } else {
        Ok(ns)
    }
}

/// Forward `reader` to stdout line by line until EOF.
///
/// Lines are decoded lossily: remote tools print whatever bytes they like,
/// and the pipe must keep draining so the remote never sees SIGPIPE.
async fn forward_lines<R>(reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                println!("{}", text.trim_end_matches(['\r', '\n']));
            }
            Err(err) => {
                warn!(error = %err, "stopped forwarding remote output");
                break;
            }
        }
    }
}

async fn read_to_end<R>(pipe: Option<R>) -> Vec<u8>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

fn classify_failure(stderr: &[u8], code: Option<i32>) -> ClusterError {
    let msg = String::from_utf8_lossy(stderr).trim().to_string();
    if msg.contains("AlreadyExists") || msg.contains("already exists") {
        ClusterError::AlreadyExists(msg)
    } else if msg.is_empty() {
        ClusterError::NonZeroExit {
            code: code.unwrap_or(-1),
        }
    } else {
        ClusterError::Rejected(msg)
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct ItemMeta {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PodItem {
    metadata: ItemMeta,
    #[serde(default)]
    status: PodStatus,
}

#[derive(Debug, Default, Deserialize)]
struct PodStatus {
    phase: Option<PodPhase>,
}

#[derive(Debug, Deserialize)]
struct ClaimItem {
    metadata: ItemMeta,
}

fn parse_pods(bytes: &[u8]) -> ClusterResult<Vec<PodRef>> {
    let list: ObjectList<PodItem> = serde_json::from_slice(bytes)?;
    Ok(list
        .items
        .into_iter()
        .map(|p| PodRef::new(p.metadata.name, p.status.phase.unwrap_or(PodPhase::Unknown)))
        .collect())
}

fn parse_claims(bytes: &[u8]) -> ClusterResult<Vec<StorageClaim>> {
    let list: ObjectList<ClaimItem> = serde_json::from_slice(bytes)?;
    Ok(list
        .items
        .into_iter()
        .map(|c| StorageClaim {
            name: c.metadata.name,
        })
        .collect())
}
