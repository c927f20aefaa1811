use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use podrun::cluster::{
    BoxFuture, ClusterClient, ClusterResult, CopyFilters, PodPhase, PodRef, StorageClaim,
};
use podrun::errors::ClusterError;
use podrun::resource::{DeploymentDescriptor, LabelSelector, ServiceDescriptor};

/// Every call the fake received, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    CreateService {
        name: String,
    },
    CreateDeployment {
        name: String,
    },
    ListPods {
        selector: String,
    },
    ListClaims {
        selector: String,
    },
    Exec {
        pod: String,
        container: String,
        command: Vec<String>,
    },
    Copy {
        local: PathBuf,
        pod: String,
        container: String,
        remote: String,
    },
}

impl Call {
    pub fn is_create(&self) -> bool {
        matches!(self, Call::CreateService { .. } | Call::CreateDeployment { .. })
    }
}

/// Operation selector for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    CreateService,
    CreateDeployment,
    ListPods,
    ListClaims,
    Exec,
    Copy,
}

/// Error to hand back from an injected failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    AlreadyExists,
    Rejected(String),
    NonZeroExit(i32),
}

impl Failure {
    fn to_error(&self, subject: &str) -> ClusterError {
        match self {
            Failure::AlreadyExists => ClusterError::AlreadyExists(subject.to_string()),
            Failure::Rejected(msg) => ClusterError::Rejected(msg.clone()),
            Failure::NonZeroExit(code) => ClusterError::NonZeroExit { code: *code },
        }
    }
}

#[derive(Debug)]
struct FakePod {
    selector: String,
    name: String,
    /// Front is the current phase; it advances once per listing.
    phases: VecDeque<PodPhase>,
}

#[derive(Debug)]
struct State {
    pods: Vec<FakePod>,
    claims: Vec<(String, StorageClaim)>,
    services: Vec<String>,
    deployments: Vec<String>,
    spawn_phases: Vec<PodPhase>,
    failures: HashMap<Op, Failure>,
    exec_failures: Vec<(String, Failure)>,
    calls: Vec<Call>,
}

/// In-memory [`ClusterClient`].
///
/// Clones share state, so a test keeps one handle for assertions and gives
/// another to the orchestrator.
#[derive(Debug, Clone)]
pub struct FakeCluster {
    namespace: String,
    state: Arc<Mutex<State>>,
}

impl FakeCluster {
    pub fn new(namespace: &str) -> Self {
        Self {
            namespace: namespace.to_string(),
            state: Arc::new(Mutex::new(State {
                pods: Vec::new(),
                claims: Vec::new(),
                services: Vec::new(),
                deployments: Vec::new(),
                spawn_phases: vec![PodPhase::Running],
                failures: HashMap::new(),
                exec_failures: Vec::new(),
                calls: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().expect("fake cluster state poisoned")
    }

    /// Add a pod labelled for runtime `runtime_name`.
    pub fn with_pod(self, runtime_name: &str, pod_name: &str, phase: PodPhase) -> Self {
        self.with_pod_phases(runtime_name, pod_name, &[phase])
    }

    /// Add a pod that walks through `phases`, one step per listing, then
    /// stays in the last one.
    pub fn with_pod_phases(self, runtime_name: &str, pod_name: &str, phases: &[PodPhase]) -> Self {
        let selector = LabelSelector::for_runtime(runtime_name).to_string();
        self.lock().pods.push(FakePod {
            selector,
            name: pod_name.to_string(),
            phases: phases.iter().copied().collect(),
        });
        self
    }

    /// Add a storage claim visible under `selector`.
    pub fn with_claim(self, selector: &str, claim_name: &str) -> Self {
        self.lock().claims.push((
            selector.to_string(),
            StorageClaim {
                name: claim_name.to_string(),
            },
        ));
        self
    }

    /// Pretend a Service with this name already exists.
    pub fn with_existing_service(self, name: &str) -> Self {
        self.lock().services.push(name.to_string());
        self
    }

    /// Pretend a Deployment with this name already exists.
    pub fn with_existing_deployment(self, name: &str) -> Self {
        self.lock().deployments.push(name.to_string());
        self
    }

    /// Phases the pod spawned by a created Deployment goes through. An empty
    /// list means the Deployment never produces a pod.
    pub fn spawning(self, phases: &[PodPhase]) -> Self {
        self.lock().spawn_phases = phases.to_vec();
        self
    }

    /// Make every call of `op` fail.
    pub fn failing(self, op: Op, failure: Failure) -> Self {
        self.lock().failures.insert(op, failure);
        self
    }

    /// Make exec calls whose joined command contains `needle` fail.
    pub fn failing_exec_containing(self, needle: &str, failure: Failure) -> Self {
        self.lock().exec_failures.push((needle.to_string(), failure));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    pub fn create_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_create).collect()
    }

    pub fn exec_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Exec { command, .. } => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn copy_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::Copy { .. }))
            .collect()
    }

    pub fn services(&self) -> Vec<String> {
        self.lock().services.clone()
    }

    pub fn deployments(&self) -> Vec<String> {
        self.lock().deployments.clone()
    }

    fn record(&self, call: Call, op: Op, subject: &str) -> ClusterResult<MutexGuard<'_, State>> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some(failure) = state.failures.get(&op).cloned() {
            return Err(failure.to_error(subject));
        }
        Ok(state)
    }
}

impl ClusterClient for FakeCluster {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    fn create_service<'a>(
        &'a self,
        service: &'a ServiceDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            let name = service.metadata.name.clone();
            let mut state = self.record(
                Call::CreateService { name: name.clone() },
                Op::CreateService,
                &name,
            )?;
            if state.services.contains(&name) {
                return Err(ClusterError::AlreadyExists(format!("services \"{name}\"")));
            }
            state.services.push(name);
            Ok(())
        })
    }

    fn create_deployment<'a>(
        &'a self,
        deployment: &'a DeploymentDescriptor,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            let name = deployment.metadata.name.clone();
            let mut state = self.record(
                Call::CreateDeployment { name: name.clone() },
                Op::CreateDeployment,
                &name,
            )?;
            if state.deployments.contains(&name) {
                return Err(ClusterError::AlreadyExists(format!(
                    "deployments.apps \"{name}\""
                )));
            }
            state.deployments.push(name.clone());

            if !state.spawn_phases.is_empty() {
                let pod = FakePod {
                    selector: LabelSelector::for_runtime(&name).to_string(),
                    name: format!("{name}-5d8f9c7b6-x2x4q"),
                    phases: state.spawn_phases.iter().copied().collect(),
                };
                state.pods.push(pod);
            }
            Ok(())
        })
    }

    fn list_pods<'a>(&'a self, selector: &'a str) -> BoxFuture<'a, ClusterResult<Vec<PodRef>>> {
        Box::pin(async move {
            let mut state = self.record(
                Call::ListPods {
                    selector: selector.to_string(),
                },
                Op::ListPods,
                selector,
            )?;
            let mut listed = Vec::new();
            for pod in state.pods.iter_mut().filter(|p| p.selector == selector) {
                let Some(&phase) = pod.phases.front() else {
                    continue;
                };
                listed.push(PodRef::new(pod.name.clone(), phase));
                if pod.phases.len() > 1 {
                    pod.phases.pop_front();
                }
            }
            Ok(listed)
        })
    }

    fn list_claims<'a>(
        &'a self,
        selector: &'a str,
    ) -> BoxFuture<'a, ClusterResult<Vec<StorageClaim>>> {
        Box::pin(async move {
            let state = self.record(
                Call::ListClaims {
                    selector: selector.to_string(),
                },
                Op::ListClaims,
                selector,
            )?;
            Ok(state
                .claims
                .iter()
                .filter(|(s, _)| s == selector)
                .map(|(_, c)| c.clone())
                .collect())
        })
    }

    fn exec<'a>(
        &'a self,
        pod: &'a str,
        container: &'a str,
        command: &'a [String],
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            let state = self.record(
                Call::Exec {
                    pod: pod.to_string(),
                    container: container.to_string(),
                    command: command.to_vec(),
                },
                Op::Exec,
                pod,
            )?;
            let joined = command.join(" ");
            match state
                .exec_failures
                .iter()
                .find(|(needle, _)| joined.contains(needle.as_str()))
            {
                Some((_, failure)) => Err(failure.to_error(pod)),
                None => Ok(()),
            }
        })
    }

    fn copy_to_pod<'a>(
        &'a self,
        local: &'a Path,
        pod: &'a str,
        container: &'a str,
        remote: &'a str,
        _filters: &'a CopyFilters,
    ) -> BoxFuture<'a, ClusterResult<()>> {
        Box::pin(async move {
            self.record(
                Call::Copy {
                    local: local.to_path_buf(),
                    pod: pod.to_string(),
                    container: container.to_string(),
                    remote: remote.to_string(),
                },
                Op::Copy,
                pod,
            )?;
            Ok(())
        })
    }
}
