// src/exec/executor.rs

use tracing::{info, warn};

use crate::cluster::{ClusterClient, ClusterResult};

use super::task::TaskCommand;

/// Runs task scripts in the runtime container.
///
/// Output is streamed by the transport as it arrives; nothing is captured.
/// There is no timeout: a long build simply keeps the call open.
pub struct TaskExecutor<'a, C: ?Sized> {
    client: &'a C,
    container: &'a str,
}

impl<'a, C: ClusterClient + ?Sized> TaskExecutor<'a, C> {
    pub fn new(client: &'a C, container: &'a str) -> Self {
        Self { client, container }
    }

    pub async fn execute(&self, command: &TaskCommand, pod: &str) -> ClusterResult<()> {
        info!(
            pod = %pod,
            container = %self.container,
            command = %command,
            mode = ?command.mode(),
            "executing task in runtime container"
        );

        let argv = command.argv();
        match self.client.exec(pod, self.container, &argv).await {
            Ok(()) => {
                info!(pod = %pod, command = %command, "task finished");
                Ok(())
            }
            Err(err) => {
                warn!(pod = %pod, command = %command, error = %err, "task failed");
                Err(err)
            }
        }
    }
}
