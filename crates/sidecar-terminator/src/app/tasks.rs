use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::app::core::Application;
use crate::domain::CommandTransport;
use crate::domain::PodSnapshot;
use crate::domain::RetryPolicy;
use crate::domain::SidecarShutdownHandler;

/// Allowance for the exec calls themselves on top of the retry pauses.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

/// How long shutdown waits for in-flight dispatches.
///
/// Covers a full retry sequence so that no sidecar is abandoned halfway
/// through its attempts.
pub fn shutdown_timeout(retry_policy: &RetryPolicy) -> Duration {
    retry_policy.total_delay() + SHUTDOWN_GRACE
}

/// Task manager, responsible for starting and managing all background tasks
pub struct Tasks {
    pub tasks: Vec<JoinHandle<()>>,
    cancellation_token: CancellationToken,
    shutdown_timeout: Duration,
}

impl Tasks {
    pub fn new(shutdown_timeout: Duration) -> Self {
        Self {
            tasks: Vec::new(),
            cancellation_token: CancellationToken::new(),
            shutdown_timeout,
        }
    }

    /// Start the pod watcher and the event processor
    pub fn spawn_all_tasks(&mut self, app: &Application) {
        let (snapshot_sender, snapshot_receiver) = mpsc::channel::<PodSnapshot>(32);

        let watcher_task = self.spawn_pod_watcher_task(app, snapshot_sender);
        self.tasks.push(watcher_task);

        let processor_task = self.spawn_processor_task(app, snapshot_receiver);
        self.tasks.push(processor_task);
    }

    /// wait for tasks to complete or receive shutdown signal
    pub async fn wait_for_completion(&mut self) -> Result<()> {
        let signal_handler = {
            #[cfg(unix)]
            {
                use tokio::signal::unix::{signal, SignalKind};
                let mut sigterm = signal(SignalKind::terminate())?;
                let mut sigint = signal(SignalKind::interrupt())?;

                tokio::spawn(async move {
                    tokio::select! {
                        _ = sigterm.recv() => {
                            tracing::info!("Received SIGTERM, initiating graceful shutdown");
                        }
                        _ = sigint.recv() => {
                            tracing::info!("Received SIGINT, initiating graceful shutdown");
                        }
                    }
                })
            }
            #[cfg(not(unix))]
            {
                tokio::spawn(async {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        tracing::error!("Failed to listen for Ctrl+C: {e}");
                        return;
                    }
                    tracing::info!("Received Ctrl+C, initiating graceful shutdown");
                })
            }
        };

        tokio::select! {
            _ = signal_handler => {
                tracing::info!("Shutdown signal received, cancelling all tasks");
                self.cancellation_token.cancel();
                self.wait_for_tasks_with_timeout(self.shutdown_timeout).await;
            }
            result = futures::future::select_all(&mut self.tasks) => {
                let (result, _index, _remaining) = result;
                self.cancellation_token.cancel();
                if let Err(e) = result {
                    tracing::error!("Task completed with error: {e}");
                    return Err(e.into());
                }
                tracing::warn!("Task completed unexpectedly");
            }
        }

        Ok(())
    }

    async fn wait_for_tasks_with_timeout(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            for task in &mut self.tasks {
                if let Err(e) = task.await {
                    tracing::error!("Task failed during shutdown: {e}");
                }
            }
        })
        .await
        .unwrap_or_else(|_| {
            tracing::warn!("Task shutdown timed out after {:?}", timeout);
        });
    }

    fn spawn_pod_watcher_task(
        &self,
        app: &Application,
        snapshot_sender: mpsc::Sender<PodSnapshot>,
    ) -> JoinHandle<()> {
        let token = self.cancellation_token.clone();
        let pod_watcher = app.services().pod_watcher.clone();
        tokio::spawn(async move {
            tracing::info!("Starting Kubernetes pod watcher task");
            if let Err(e) = pod_watcher.run(snapshot_sender, token).await {
                tracing::error!("Kubernetes pod watcher failed: {e:?}");
            } else {
                tracing::info!("Kubernetes pod watcher completed");
            }
        })
    }

    fn spawn_processor_task(
        &self,
        app: &Application,
        snapshot_receiver: mpsc::Receiver<PodSnapshot>,
    ) -> JoinHandle<()> {
        let token = self.cancellation_token.clone();
        let handler = app.services().shutdown_handler.clone();
        tokio::spawn(async move {
            tracing::info!("Starting pod event processor task");
            process_pod_events(handler, snapshot_receiver, token).await;
            tracing::info!("Pod event processor completed");
        })
    }
}

/// Hand every observed pod to the shutdown handler on its own task.
///
/// Pods are processed concurrently so that one pod's retries never delay
/// another. Dispatches already in flight are awaited, not aborted, when the
/// processor stops.
pub(crate) async fn process_pod_events<T>(
    handler: Arc<SidecarShutdownHandler<T>>,
    mut snapshot_receiver: mpsc::Receiver<PodSnapshot>,
    cancellation_token: CancellationToken,
) where
    T: CommandTransport + 'static,
{
    let mut in_flight = JoinSet::new();

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                tracing::info!("Pod event processor shutdown requested");
                break;
            }
            Some(result) = in_flight.join_next(), if !in_flight.is_empty() => {
                if let Err(e) = result {
                    tracing::error!("Pod handler task failed: {e}");
                }
            }
            snapshot = snapshot_receiver.recv() => {
                let Some(snapshot) = snapshot else {
                    break;
                };
                let handler = handler.clone();
                in_flight.spawn(async move {
                    handler.on_pod_observed(&snapshot).await;
                });
            }
        }
    }

    while let Some(result) = in_flight.join_next().await {
        if let Err(e) = result {
            tracing::error!("Pod handler task failed: {e}");
        }
    }
}
