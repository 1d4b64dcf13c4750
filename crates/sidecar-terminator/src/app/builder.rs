use std::sync::Arc;

use anyhow::Result;

use crate::app::core::Application;
use crate::app::core::ApplicationServices;
use crate::app::tasks;
use crate::config::DaemonArgs;
use crate::domain::ShutdownDispatcher;
use crate::domain::SidecarShutdownHandler;
use crate::infrastructure::k8s::KubeExecTransport;
use crate::infrastructure::k8s::PodWatcher;
use crate::infrastructure::kube_client;

/// Application builder
pub struct ApplicationBuilder {
    daemon_args: DaemonArgs,
}

impl ApplicationBuilder {
    pub fn new(daemon_args: DaemonArgs) -> Self {
        Self { daemon_args }
    }

    /// Build the application.
    ///
    /// Failing to reach the cluster is fatal; there is nothing useful the
    /// daemon can do without a client.
    pub async fn build(self) -> Result<Application> {
        tracing::info!("Building application components...");

        let client = kube_client::init_kube_client(self.daemon_args.kubeconfig.clone())
            .await
            .map_err(|e| anyhow::anyhow!("{e:?}"))?;

        let retry_policy = self.daemon_args.retry_policy();
        tracing::info!(
            annotation = self.daemon_args.sidecar_annotation().key(),
            max_attempts = retry_policy.max_attempts(),
            delay_sec = retry_policy.delay().as_secs_f32(),
            dry_run = self.daemon_args.dry_run,
            "Shutdown handler configured"
        );

        let transport = Arc::new(KubeExecTransport::new(client.clone()));
        let shutdown_handler = SidecarShutdownHandler::new(
            self.daemon_args.sidecar_annotation(),
            ShutdownDispatcher::new(transport, retry_policy),
        )
        .with_dry_run(self.daemon_args.dry_run);

        let pod_watcher = PodWatcher::new(client, self.daemon_args.watch_scope());

        Ok(Application::new(
            ApplicationServices {
                pod_watcher: Arc::new(pod_watcher),
                shutdown_handler: Arc::new(shutdown_handler),
            },
            tasks::shutdown_timeout(&retry_policy),
        ))
    }
}
