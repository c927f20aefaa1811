// tests/pod_discovery.rs

mod common;
use crate::common::{FakeCluster, Failure, Op, init_tracing, with_timeout};

use std::time::{Duration, Instant};

use podrun::cluster::PodPhase;
use podrun::discovery::PodDiscovery;
use podrun::errors::DiscoveryError;
use podrun::resource::LabelSelector;

const POLL: Duration = Duration::from_millis(5);

fn selector() -> LabelSelector {
    LabelSelector::for_runtime("api-runtime")
}

#[tokio::test]
async fn probe_without_pods_returns_none_after_limit() {
    init_tracing();
    let cluster = FakeCluster::new("dev");
    let discovery = PodDiscovery::new(&cluster, POLL);

    let started = Instant::now();
    let found = with_timeout(discovery.probe(&selector(), PodPhase::Running, Duration::from_millis(40)))
        .await
        .unwrap();

    assert_eq!(found, None);
    assert!(started.elapsed() >= Duration::from_millis(40));
    assert!(cluster.calls().len() > 1, "probe should poll more than once");
}

#[tokio::test]
async fn probe_finds_running_pod() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("api-runtime", "api-runtime-x", PodPhase::Running);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let found = with_timeout(discovery.probe(&selector(), PodPhase::Running, Duration::from_millis(40)))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "api-runtime-x");
}

#[tokio::test]
async fn probe_treats_terminated_pods_as_absent() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("api-runtime", "api-runtime-x", PodPhase::Succeeded);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let found = with_timeout(discovery.probe(&selector(), PodPhase::Running, Duration::from_millis(30)))
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn probe_ignores_pods_of_other_runtimes() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("web-runtime", "web-runtime-x", PodPhase::Running);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let found = with_timeout(discovery.probe(&selector(), PodPhase::Running, Duration::from_millis(30)))
        .await
        .unwrap();
    assert_eq!(found, None);
}

#[tokio::test]
async fn several_running_pods_resolve_to_first_by_name() {
    init_tracing();
    let cluster = FakeCluster::new("dev")
        .with_pod("api-runtime", "api-runtime-b", PodPhase::Running)
        .with_pod("api-runtime", "api-runtime-a", PodPhase::Running);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let pod = with_timeout(discovery.wait_for(&selector(), PodPhase::Running, None))
        .await
        .unwrap();
    assert_eq!(pod.name, "api-runtime-a");
}

#[tokio::test]
async fn wait_follows_pod_through_pending() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod_phases(
        "api-runtime",
        "api-runtime-x",
        &[PodPhase::Pending, PodPhase::Pending, PodPhase::Running],
    );
    let discovery = PodDiscovery::new(&cluster, POLL);

    let pod = with_timeout(discovery.wait_for(&selector(), PodPhase::Running, None))
        .await
        .unwrap();
    assert_eq!(pod.phase, PodPhase::Running);
    assert_eq!(cluster.calls().len(), 3);
}

#[tokio::test]
async fn wait_fails_when_every_pod_terminated() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("api-runtime", "api-runtime-x", PodPhase::Failed);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let err = with_timeout(discovery.wait_for(&selector(), PodPhase::Running, None))
        .await
        .unwrap_err();

    match err {
        DiscoveryError::PodTerminated { pod, phase, selector } => {
            assert_eq!(pod, "api-runtime-x");
            assert_eq!(phase, PodPhase::Failed);
            assert_eq!(
                selector,
                "app=api-runtime-selector,chart=api-runtime-1.0.0,release=api-runtime"
            );
        }
        other => panic!("expected PodTerminated, got {other:?}"),
    }
}

#[tokio::test]
async fn running_pod_wins_over_a_terminated_sibling() {
    init_tracing();
    let cluster = FakeCluster::new("dev")
        .with_pod("api-runtime", "api-runtime-old", PodPhase::Failed)
        .with_pod("api-runtime", "api-runtime-new", PodPhase::Running);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let pod = with_timeout(discovery.wait_for(&selector(), PodPhase::Running, None))
        .await
        .unwrap();
    assert_eq!(pod.name, "api-runtime-new");
}

#[tokio::test]
async fn wait_with_deadline_times_out() {
    init_tracing();
    let cluster = FakeCluster::new("dev").with_pod("api-runtime", "api-runtime-x", PodPhase::Pending);
    let discovery = PodDiscovery::new(&cluster, POLL);

    let err = with_timeout(discovery.wait_for(
        &selector(),
        PodPhase::Running,
        Some(Duration::from_millis(30)),
    ))
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        DiscoveryError::TimedOut { phase: PodPhase::Running, .. }
    ));
}

#[tokio::test]
async fn listing_errors_are_not_swallowed() {
    init_tracing();
    let cluster = FakeCluster::new("dev").failing(Op::ListPods, Failure::Rejected("forbidden".into()));
    let discovery = PodDiscovery::new(&cluster, POLL);

    let probe = with_timeout(discovery.probe(&selector(), PodPhase::Running, Duration::from_millis(30)))
        .await;
    assert!(matches!(probe, Err(DiscoveryError::Cluster { .. })));

    let wait = with_timeout(discovery.wait_for(&selector(), PodPhase::Running, None)).await;
    assert!(matches!(wait, Err(DiscoveryError::Cluster { .. })));
}
