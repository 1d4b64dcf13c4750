use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::app::tasks::Tasks;
use crate::domain::SidecarShutdownHandler;
use crate::infrastructure::k8s::KubeExecTransport;
use crate::infrastructure::k8s::PodWatcher;

pub type ShutdownHandler = SidecarShutdownHandler<KubeExecTransport>;

/// Application dependencies
pub struct ApplicationServices {
    pub pod_watcher: Arc<PodWatcher>,
    pub shutdown_handler: Arc<ShutdownHandler>,
}

/// Application core structure with explicit dependencies
pub struct Application {
    services: ApplicationServices,
    /// how long a shutdown waits for in-flight dispatches
    shutdown_timeout: Duration,
}

impl Application {
    pub fn new(services: ApplicationServices, shutdown_timeout: Duration) -> Self {
        Self {
            services,
            shutdown_timeout,
        }
    }

    pub fn services(&self) -> &ApplicationServices {
        &self.services
    }

    /// Run application, start all tasks and wait for completion
    pub async fn run(&self) -> Result<()> {
        tracing::info!("Starting all application tasks...");

        let mut tasks = Tasks::new(self.shutdown_timeout);
        tasks.spawn_all_tasks(self);

        if let Err(e) = tasks.wait_for_completion().await {
            tracing::error!("Error during task execution: {}", e);
            return Err(e);
        }

        tracing::info!("Application run completed");
        Ok(())
    }
}
