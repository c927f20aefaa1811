// src/discovery.rs

//! Waiting for runtime pods.
//!
//! Two operations with different contracts:
//!
//! - [`PodDiscovery::probe`] is bounded. Not finding a pod before the timeout
//!   is a normal answer (`Ok(None)`), used to decide whether a runtime
//!   already exists.
//! - [`PodDiscovery::wait_for`] is mandatory. It waits until a pod reaches the
//!   phase, and fails if every matching pod has terminated or the optional
//!   deadline passes.
//!
//! Both poll `list_pods` at a fixed interval.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{debug, trace, warn};

use crate::cluster::{ClusterClient, PodPhase, PodRef};
use crate::errors::DiscoveryError;
use crate::resource::LabelSelector;
use crate::types::Matches;

/// What a single listing says about the selector.
#[derive(Debug)]
enum Observation {
    Ready(PodRef),
    /// Pods exist but all of them ended; they will never reach the phase.
    Terminated(PodRef),
    Absent,
}

pub struct PodDiscovery<'a, C: ?Sized> {
    client: &'a C,
    poll_interval: Duration,
}

impl<'a, C: ClusterClient + ?Sized> PodDiscovery<'a, C> {
    pub fn new(client: &'a C, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    /// Look for a pod in `phase` for at most `limit`.
    ///
    /// Terminated pods count as absent here. Only a failing cluster call is
    /// an error.
    pub async fn probe(
        &self,
        selector: &LabelSelector,
        phase: PodPhase,
        limit: Duration,
    ) -> Result<Option<PodRef>, DiscoveryError> {
        match timeout(limit, self.poll_until(selector, phase, false)).await {
            Ok(found) => found.map(Some),
            Err(_) => {
                debug!(selector = %selector, %phase, ?limit, "probe found no pod");
                Ok(None)
            }
        }
    }

    /// Wait until a pod matching `selector` is in `phase`.
    ///
    /// `deadline = None` waits for as long as it takes.
    pub async fn wait_for(
        &self,
        selector: &LabelSelector,
        phase: PodPhase,
        deadline: Option<Duration>,
    ) -> Result<PodRef, DiscoveryError> {
        let wait = self.poll_until(selector, phase, true);
        match deadline {
            None => wait.await,
            Some(limit) => match timeout(limit, wait).await {
                Ok(result) => result,
                Err(_) => Err(DiscoveryError::TimedOut {
                    selector: selector.to_string(),
                    phase,
                    waited: limit,
                }),
            },
        }
    }

    async fn poll_until(
        &self,
        selector: &LabelSelector,
        phase: PodPhase,
        fail_on_terminated: bool,
    ) -> Result<PodRef, DiscoveryError> {
        loop {
            match self.observe(selector, phase).await? {
                Observation::Ready(pod) => {
                    debug!(selector = %selector, pod = %pod.name, %phase, "pod reached phase");
                    return Ok(pod);
                }
                Observation::Terminated(pod) if fail_on_terminated => {
                    return Err(DiscoveryError::PodTerminated {
                        selector: selector.to_string(),
                        pod: pod.name,
                        phase: pod.phase,
                    });
                }
                Observation::Terminated(_) | Observation::Absent => {}
            }

            trace!(selector = %selector, %phase, "no pod in phase yet; polling again");
            sleep(self.poll_interval).await;
        }
    }

    async fn observe(
        &self,
        selector: &LabelSelector,
        phase: PodPhase,
    ) -> Result<Observation, DiscoveryError> {
        let pods = self
            .client
            .list_pods(selector.as_str())
            .await
            .map_err(|source| DiscoveryError::Cluster {
                selector: selector.to_string(),
                source,
            })?;

        let (mut ready, others): (Vec<PodRef>, Vec<PodRef>) =
            pods.into_iter().partition(|p| p.phase == phase);
        ready.sort_by(|a, b| a.name.cmp(&b.name));

        match Matches::from_vec(ready) {
            Matches::One(pod) => return Ok(Observation::Ready(pod)),
            Matches::Many(mut pods) => {
                let chosen = pods.remove(0);
                warn!(
                    selector = %selector,
                    count = pods.len() + 1,
                    chosen = %chosen.name,
                    "several pods match; using the first by name"
                );
                return Ok(Observation::Ready(chosen));
            }
            Matches::None => {}
        }

        if !others.is_empty() && others.iter().all(|p| p.phase.is_terminal()) {
            if let Some(pod) = others.into_iter().next() {
                return Ok(Observation::Terminated(pod));
            }
        }

        Ok(Observation::Absent)
    }
}
