// src/resource/spec.rs

//! Runtime naming contract and the per-invocation task spec.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::RuntimeSection;

/// Suffix appended to the lowercased project name.
pub const RUNTIME_SUFFIX: &str = "-runtime";

/// Chart version baked into the `chart` label.
pub const CHART_VERSION: &str = "1.0.0";

/// Longest project name whose runtime name still fits a DNS label.
pub const MAX_PROJECT_NAME_LEN: usize = 63 - RUNTIME_SUFFIX.len();

static DNS_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]{0,61}[a-z0-9])?$").expect("static regex is valid")
});

/// RFC 1123 label check, as used for Kubernetes object names.
pub fn is_dns_label(s: &str) -> bool {
    DNS_LABEL.is_match(s)
}

/// `lowercase(project_name) + "-runtime"`.
pub fn runtime_name(project_name: &str) -> String {
    format!("{}{}", project_name.to_lowercase(), RUNTIME_SUFFIX)
}

/// Label selector shared by the runtime Deployment, its Service and every
/// pod lookup.
///
/// Built from the resource name alone, so creation and discovery can never
/// disagree on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSelector {
    labels: BTreeMap<String, String>,
    rendered: String,
}

impl LabelSelector {
    pub fn for_runtime(name: &str) -> Self {
        let app = format!("{name}-selector");
        let chart = format!("{name}-{CHART_VERSION}");
        let release = name.to_string();

        let rendered = format!("app={app},chart={chart},release={release}");

        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), app);
        labels.insert("chart".to_string(), chart);
        labels.insert("release".to_string(), release);

        Self { labels, rendered }
    }

    /// Label set matched by this selector.
    pub fn labels(&self) -> &BTreeMap<String, String> {
        &self.labels
    }

    pub fn as_str(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}

/// Everything needed to describe and locate the runtime for one invocation.
///
/// Built fresh on every run and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeTaskSpec {
    pub name: String,
    pub image: String,
    pub container_name: String,
    pub mount_path: String,
    pub sub_path: String,
    pub namespace: String,
    pub service_account: String,
    pub privileged: bool,
    pub claim_name: Option<String>,
    pub ports: Vec<u16>,
    pub labels: BTreeMap<String, String>,
    selector: LabelSelector,
}

impl RuntimeTaskSpec {
    pub fn new(
        project_name: &str,
        namespace: impl Into<String>,
        claim_name: Option<String>,
        runtime: &RuntimeSection,
    ) -> Self {
        let name = runtime_name(project_name);
        let selector = LabelSelector::for_runtime(&name);

        Self {
            labels: selector.labels().clone(),
            name,
            image: runtime.image.clone(),
            container_name: runtime.container_name.clone(),
            mount_path: runtime.mount_path.clone(),
            sub_path: runtime.sub_path.clone(),
            namespace: namespace.into(),
            service_account: runtime.service_account.clone(),
            privileged: runtime.privileged,
            claim_name,
            ports: runtime.ports.clone(),
            selector,
        }
    }

    pub fn selector(&self) -> &LabelSelector {
        &self.selector
    }

    /// `<mount_path>/src`: where source is synced and task scripts live.
    pub fn source_dir(&self) -> String {
        format!("{}/src", self.mount_path)
    }
}
