// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from `Podrun.toml`.
///
/// ```toml
/// [runtime]
/// image = "docker.io/maysunfaisal/libertymvnjava"
/// mount_path = "/home/default/idp"
///
/// [discovery]
/// probe_timeout_ms = 10000
///
/// [tasks]
/// full_suffix = "/.udo/bin/full-build-and-run.sh"
///
/// [cluster]
/// claim_selector = "app=idp"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub runtime: RuntimeSection,

    #[serde(default)]
    pub discovery: DiscoverySection,

    #[serde(default)]
    pub tasks: TasksSection,

    #[serde(default)]
    pub cluster: ClusterSection,
}

/// Validated configuration.
///
/// Only obtainable through `ConfigFile::try_from(RawConfigFile)` (see
/// `validate.rs`) or [`ConfigFile::default`], whose values are known-good.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub runtime: RuntimeSection,
    pub discovery: DiscoverySection,
    pub tasks: TasksSection,
    pub cluster: ClusterSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            runtime: raw.runtime,
            discovery: raw.discovery,
            tasks: raw.tasks,
            cluster: raw.cluster,
        }
    }
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self::new_unchecked(RawConfigFile::default())
    }
}

/// `[runtime]` section: what the runtime Deployment looks like.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeSection {
    /// Container image carrying the build tools.
    pub image: String,

    /// Name of the container inside the runtime pod.
    pub container_name: String,

    /// Where the shared volume is mounted; source lands in `<mount_path>/src`.
    pub mount_path: String,

    /// Sub-path of the storage claim to mount. Empty mounts the claim root.
    pub sub_path: String,

    pub service_account: String,

    /// Run the runtime container privileged.
    pub privileged: bool,

    /// Ports exposed by the container and the Service.
    pub ports: Vec<u16>,
}

impl Default for RuntimeSection {
    fn default() -> Self {
        Self {
            image: "docker.io/maysunfaisal/libertymvnjava".to_string(),
            container_name: "runtime".to_string(),
            mount_path: "/home/default/idp".to_string(),
            sub_path: String::new(),
            service_account: "default".to_string(),
            privileged: true,
            ports: vec![9080, 9443],
        }
    }
}

/// `[discovery]` section: pod wait timings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoverySection {
    /// How long to look for an already-running runtime before creating one.
    pub probe_timeout_ms: u64,

    /// Delay between two pod listings while waiting.
    pub poll_interval_ms: u64,

    /// Upper bound for the mandatory readiness wait.
    ///
    /// `None` waits until the pod runs or terminally fails.
    pub ready_timeout_ms: Option<u64>,
}

impl DiscoverySection {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for DiscoverySection {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 10_000,
            poll_interval_ms: 1_000,
            ready_timeout_ms: None,
        }
    }
}

/// `[tasks]` section: task scripts appended to `<mount_path>/src`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TasksSection {
    pub full_suffix: String,
    pub incremental_suffix: String,
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            full_suffix: "/.udo/bin/full-build-and-run.sh".to_string(),
            incremental_suffix: "/.udo/bin/incremental-build-and-run.sh".to_string(),
        }
    }
}

/// `[cluster]` section: how to reach the cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClusterSection {
    /// Target namespace. Falls back to the current kubeconfig context.
    pub namespace: Option<String>,

    /// `kubectl` binary to invoke.
    pub kubectl: String,

    /// Label selector identifying the fleet-wide storage claim.
    pub claim_selector: String,

    /// Treat "already exists" on create as success and adopt the resource.
    pub adopt_existing: bool,
}

impl Default for ClusterSection {
    fn default() -> Self {
        Self {
            namespace: None,
            kubectl: "kubectl".to_string(),
            claim_selector: "app=idp".to_string(),
            adopt_existing: true,
        }
    }
}
