// src/lib.rs

pub mod cli;
pub mod cluster;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod resource;
pub mod sync;
pub mod types;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::cluster::{ClusterClient, KubectlClient};
use crate::config::{default_config_path, load_or_default};
use crate::engine::{Orchestrator, RunRequest, RuntimePlan};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the kubectl-backed cluster client
/// - the orchestrator (or a dry-run plan)
pub async fn run(args: CliArgs) -> Result<()> {
    let (config_path, explicit) = match &args.config {
        Some(path) => (PathBuf::from(path), true),
        None => (default_config_path(), false),
    };
    let cfg = load_or_default(&config_path, explicit)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let client = KubectlClient::connect(&cfg.cluster, args.namespace.as_deref())
        .await
        .context("connecting to the cluster")?;

    let mut request = RunRequest::new(&args.project, args.build_mode);
    if let Some(source) = &args.source {
        request = request.with_source_root(source);
    }

    let orchestrator = Orchestrator::new(client, cfg);

    if args.dry_run {
        let plan = orchestrator.plan(&request).await?;
        print_dry_run(orchestrator.client(), &request, &plan)?;
        return Ok(());
    }

    let report = orchestrator.run(request).await?;
    info!(
        pod = %report.pod_name,
        provisioned = report.provisioned,
        command = %report.command,
        "runtime task complete"
    );
    Ok(())
}

/// Print what a run would create and execute.
fn print_dry_run(
    client: &impl ClusterClient,
    request: &RunRequest,
    plan: &RuntimePlan,
) -> Result<()> {
    println!("podrun dry-run");
    println!("  namespace = {}", client.namespace());
    println!("  name = {}", plan.spec.name);
    println!("  selector = {}", plan.spec.selector());
    match &plan.spec.claim_name {
        Some(claim) => println!("  storage = claim {claim}"),
        None => println!("  storage = ephemeral"),
    }
    match &request.source_root {
        Some(root) => println!("  source = {}", root.display()),
        None => println!("  source = <current directory>"),
    }
    println!("  target = {}", plan.spec.source_dir());
    println!("  command ({:?}) = {}", request.mode, plan.command);
    println!();

    println!("service:");
    println!("{}", serde_json::to_string_pretty(&plan.service)?);
    println!();
    println!("deployment:");
    println!("{}", serde_json::to_string_pretty(&plan.deployment)?);

    debug!("dry-run complete (nothing created)");
    Ok(())
}
