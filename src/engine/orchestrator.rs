// src/engine/orchestrator.rs

use std::path::PathBuf;

use tracing::{info, warn};

use crate::cluster::{ClusterClient, ClusterResult, PodPhase, PodRef};
use crate::config::ConfigFile;
use crate::discovery::PodDiscovery;
use crate::errors::{PodrunError, Result};
use crate::exec::{TaskCommand, TaskExecutor};
use crate::resource::{RuntimeTaskSpec, build_deployment, build_service};
use crate::sync::SyncEngine;
use crate::types::Matches;

use super::{RunReport, RunRequest, RuntimePlan, Stage};

/// Drives one runtime task: make sure the runtime pod exists, sync the
/// source into it and run the build task.
///
/// Every step is a blocking call into the [`ClusterClient`], executed strictly
/// in sequence. Configuration is injected so tests can shrink timeouts and
/// swap image/paths.
pub struct Orchestrator<C> {
    client: C,
    config: ConfigFile,
}

impl<C: ClusterClient> Orchestrator<C> {
    pub fn new(client: C, config: ConfigFile) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run the full flow for `request`.
    pub async fn run(&self, request: RunRequest) -> Result<RunReport> {
        info!(
            namespace = %self.client.namespace(),
            project = %request.project_name,
            mode = ?request.mode,
            "starting runtime task"
        );

        let claim_name = self.resolve_claim().await?;
        let source_root = resolve_source_root(request.source_root)?;
        info!(source = %source_root.display(), "captured source root");

        let spec = self.build_spec(&request.project_name, claim_name);
        let discovery = PodDiscovery::new(&self.client, self.config.discovery.poll_interval());

        let (pod, provisioned) = match self.probe(&discovery, &spec).await? {
            Some(pod) => {
                info!(pod = %pod.name, "running pod found; reusing runtime");
                (pod, false)
            }
            None => (self.provision(&discovery, &spec).await?, true),
        };
        let pod_name = pod.name;

        let source_dir = spec.source_dir();
        let synced = SyncEngine::new(&self.client, &self.config.discovery)
            .sync(spec.selector(), &source_root, &source_dir, &spec.container_name)
            .await?;
        if synced.name != pod_name {
            warn!(
                recorded = %pod_name,
                synced = %synced.name,
                "source landed in a different pod than the one recorded"
            );
        }

        let command = TaskCommand::resolve(&source_dir, request.mode, &self.config.tasks);
        TaskExecutor::new(&self.client, &spec.container_name)
            .execute(&command, &pod_name)
            .await
            .map_err(|source| PodrunError::Execute {
                command: command.to_string(),
                pod: pod_name.clone(),
                source,
            })?;

        Ok(RunReport {
            pod_name,
            provisioned,
            command,
        })
    }

    /// Compute what [`Orchestrator::run`] would create, without creating it.
    ///
    /// Still reads the storage claims, since they shape the Deployment.
    pub async fn plan(&self, request: &RunRequest) -> Result<RuntimePlan> {
        let claim_name = self.resolve_claim().await?;
        let spec = self.build_spec(&request.project_name, claim_name);
        let command = TaskCommand::resolve(&spec.source_dir(), request.mode, &self.config.tasks);

        Ok(RuntimePlan {
            service: build_service(&spec),
            deployment: build_deployment(&spec),
            spec,
            command,
        })
    }

    fn build_spec(&self, project_name: &str, claim_name: Option<String>) -> RuntimeTaskSpec {
        RuntimeTaskSpec::new(
            project_name,
            self.client.namespace(),
            claim_name,
            &self.config.runtime,
        )
    }

    async fn resolve_claim(&self) -> Result<Option<String>> {
        let selector = &self.config.cluster.claim_selector;
        let claims = self
            .client
            .list_claims(selector)
            .await
            .map_err(PodrunError::ClaimLookup)?;

        match Matches::from_vec(claims) {
            Matches::None => {
                info!(selector = %selector, "no storage claim found; using ephemeral storage");
                Ok(None)
            }
            Matches::One(claim) => {
                info!(claim = %claim.name, "using storage claim");
                Ok(Some(claim.name))
            }
            Matches::Many(claims) => Err(PodrunError::ClaimAmbiguous {
                selector: selector.clone(),
                names: claims.into_iter().map(|c| c.name).collect(),
            }),
        }
    }

    /// Bounded lookup of a running runtime pod.
    ///
    /// A failing pod listing aborts the run with [`PodrunError::Probe`]; it is
    /// never read as "no runtime yet", which would go on to create a second
    /// Deployment against an API that is not answering.
    async fn probe(
        &self,
        discovery: &PodDiscovery<'_, C>,
        spec: &RuntimeTaskSpec,
    ) -> Result<Option<PodRef>> {
        info!(selector = %spec.selector(), "checking if a runtime container is already deployed");
        discovery
            .probe(
                spec.selector(),
                PodPhase::Running,
                self.config.discovery.probe_timeout(),
            )
            .await
            .map_err(PodrunError::Probe)
    }

    /// Create the Service, then the Deployment, then wait for their pod.
    async fn provision(
        &self,
        discovery: &PodDiscovery<'_, C>,
        spec: &RuntimeTaskSpec,
    ) -> Result<PodRef> {
        let service = build_service(spec);
        let deployment = build_deployment(spec);

        info!(name = %spec.name, "deploying runtime");

        let created = self.client.create_service(&service).await;
        self.tolerate_conflict(Stage::CreateService, &spec.name, created)
            .map_err(|source| PodrunError::ServiceCreate {
                name: spec.name.clone(),
                source,
            })?;
        info!(name = %spec.name, "service created");

        let created = self.client.create_deployment(&deployment).await;
        self.tolerate_conflict(Stage::CreateDeployment, &spec.name, created)
            .map_err(|source| PodrunError::DeploymentCreate {
                name: spec.name.clone(),
                source,
            })?;
        info!(name = %spec.name, "deployment created");

        info!(selector = %spec.selector(), "waiting for the runtime pod to run");
        let pod = discovery
            .wait_for(
                spec.selector(),
                PodPhase::Running,
                self.config.discovery.ready_timeout(),
            )
            .await
            .map_err(PodrunError::Readiness)?;

        info!(pod = %pod.name, "runtime pod is up and running");
        Ok(pod)
    }

    /// With `adopt_existing`, "already exists" means another run got there
    /// first; the resource is taken over as if we had created it.
    fn tolerate_conflict(
        &self,
        stage: Stage,
        name: &str,
        result: ClusterResult<()>,
    ) -> ClusterResult<()> {
        match result {
            Err(err) if err.is_already_exists() && self.config.cluster.adopt_existing => {
                warn!(%stage, name = %name, "resource already exists; adopting it");
                Ok(())
            }
            other => other,
        }
    }
}

fn resolve_source_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(root) => Ok(root),
        None => std::env::current_dir().map_err(PodrunError::SourceRoot),
    }
}
