// tests/sync_engine.rs

mod common;
use crate::common::{Call, ConfigBuilder, FakeCluster, Failure, Op, init_tracing, project_tree, with_timeout};

use podrun::cluster::PodPhase;
use podrun::errors::{DiscoveryError, SyncError};
use podrun::resource::LabelSelector;
use podrun::sync::{SyncEngine, reset_command};

const TARGET: &str = "/home/default/idp/src";

fn selector() -> LabelSelector {
    LabelSelector::for_runtime("svc-runtime")
}

#[tokio::test]
async fn sync_resets_target_then_copies_whole_tree() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("svc-runtime", "svc-runtime-1", PodPhase::Running);
    let config = ConfigBuilder::new().build();
    let tree = project_tree();

    let engine = SyncEngine::new(&cluster, &config.discovery);
    let pod = with_timeout(engine.sync(&selector(), tree.path(), TARGET, "runtime"))
        .await
        .unwrap();

    assert_eq!(pod.name, "svc-runtime-1");
    let calls: Vec<Call> = cluster
        .calls()
        .into_iter()
        .filter(|c| !matches!(c, Call::ListPods { .. }))
        .collect();
    assert_eq!(
        calls,
        vec![
            Call::Exec {
                pod: "svc-runtime-1".to_string(),
                container: "runtime".to_string(),
                command: reset_command(TARGET),
            },
            Call::Copy {
                local: tree.path().to_path_buf(),
                pod: "svc-runtime-1".to_string(),
                container: "runtime".to_string(),
                remote: TARGET.to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn repeated_syncs_reset_every_time() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("svc-runtime", "svc-runtime-1", PodPhase::Running);
    let config = ConfigBuilder::new().build();
    let tree = project_tree();
    let engine = SyncEngine::new(&cluster, &config.discovery);

    for _ in 0..2 {
        with_timeout(engine.sync(&selector(), tree.path(), TARGET, "runtime"))
            .await
            .unwrap();
    }

    assert_eq!(
        cluster.exec_calls(),
        vec![reset_command(TARGET), reset_command(TARGET)]
    );
    assert_eq!(cluster.copy_calls().len(), 2);
}

#[tokio::test]
async fn failed_reset_means_nothing_is_copied() {
    init_tracing();
    let cluster = FakeCluster::new("dev")
        .with_pod("svc-runtime", "svc-runtime-1", PodPhase::Running)
        .failing(Op::Exec, Failure::NonZeroExit(1));
    let config = ConfigBuilder::new().build();
    let tree = project_tree();

    let err = with_timeout(
        SyncEngine::new(&cluster, &config.discovery).sync(&selector(), tree.path(), TARGET, "runtime"),
    )
    .await
    .unwrap_err();

    match err {
        SyncError::ResetFailed { pod, target, .. } => {
            assert_eq!(pod, "svc-runtime-1");
            assert_eq!(target, TARGET);
        }
        other => panic!("expected ResetFailed, got {other:?}"),
    }
    assert!(cluster.copy_calls().is_empty());
}

#[tokio::test]
async fn transfer_failure_names_source_and_pod() {
    init_tracing();
    let cluster = FakeCluster::new("dev")
        .with_pod("svc-runtime", "svc-runtime-1", PodPhase::Running)
        .failing(Op::Copy, Failure::Rejected("connection reset".into()));
    let config = ConfigBuilder::new().build();
    let tree = project_tree();

    let err = with_timeout(
        SyncEngine::new(&cluster, &config.discovery).sync(&selector(), tree.path(), TARGET, "runtime"),
    )
    .await
    .unwrap_err();

    let msg = err.to_string();
    assert!(msg.starts_with("sync transfer failed"), "{msg}");
    match err {
        SyncError::TransferFailed { local, pod, .. } => {
            assert_eq!(local, tree.path());
            assert_eq!(pod, "svc-runtime-1");
        }
        other => panic!("expected TransferFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn no_running_pod_is_target_unavailable() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("svc-runtime", "svc-runtime-1", PodPhase::Failed);
    let config = ConfigBuilder::new().build();
    let tree = project_tree();

    let err = with_timeout(
        SyncEngine::new(&cluster, &config.discovery).sync(&selector(), tree.path(), TARGET, "runtime"),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        SyncError::TargetUnavailable(DiscoveryError::PodTerminated { .. })
    ));
    assert!(cluster.exec_calls().is_empty());
}

#[tokio::test]
async fn missing_source_fails_before_any_cluster_call() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("svc-runtime", "svc-runtime-1", PodPhase::Running);
    let config = ConfigBuilder::new().build();
    let tree = project_tree();
    let file = tree.path().join("src/main/App.java");

    let err = with_timeout(
        SyncEngine::new(&cluster, &config.discovery).sync(&selector(), &file, TARGET, "runtime"),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, SyncError::TransferFailed { .. }));
    assert!(cluster.calls().is_empty());
}
