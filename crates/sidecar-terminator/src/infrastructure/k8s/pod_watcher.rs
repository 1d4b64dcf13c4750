use std::time::Duration;

use error_stack::Report;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::watcher::watcher;
use kube::runtime::watcher::Config;
use kube::runtime::WatchStreamExt;
use kube::Api;
use kube::Client;
use tokio::select;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use crate::domain::snapshot::PodSnapshot;
use crate::infrastructure::k8s::types::KubernetesError;

/// Pause before restarting a failed watch.
const WATCH_RESTART_DELAY: Duration = Duration::from_secs(5);

/// Which Pods the watcher observes.
#[derive(Debug, Clone, Default)]
pub struct WatchScope {
    /// `None` watches every namespace
    pub namespace: Option<String>,
    /// restrict to Pods scheduled on this node
    pub node_name: Option<String>,
    pub label_selector: Option<String>,
}

impl WatchScope {
    fn watcher_config(&self) -> Config {
        let mut config = Config::default();
        if let Some(labels) = &self.label_selector {
            config = config.labels(labels);
        }
        if let Some(node_name) = &self.node_name {
            config = config.fields(&format!("spec.nodeName={node_name}"));
        }
        config
    }
}

/// Watches Pods and forwards each applied object as a [`PodSnapshot`].
///
/// Creations and updates are both forwarded; the decision pipeline treats
/// every snapshot as a fresh observation.
pub struct PodWatcher {
    client: Client,
    scope: WatchScope,
}

impl PodWatcher {
    pub fn new(client: Client, scope: WatchScope) -> Self {
        Self { client, scope }
    }

    /// Start watching pods.
    ///
    /// Runs until `cancellation_token` fires. A failed watch stream is
    /// restarted after a short pause.
    #[tracing::instrument(skip_all, fields(namespace = ?self.scope.namespace, node_name = ?self.scope.node_name))]
    pub async fn run(
        &self,
        snapshot_sender: mpsc::Sender<PodSnapshot>,
        cancellation_token: CancellationToken,
    ) -> Result<(), Report<KubernetesError>> {
        info!("Starting pod watcher");
        loop {
            select! {
                _ = cancellation_token.cancelled() => {
                    info!("Pod watcher shutdown requested");
                    break;
                }
                result = self.watch_pods(&snapshot_sender) => {
                    match result {
                        Ok(()) => {
                            warn!("Pod watch stream ended unexpectedly, restarting...");
                        }
                        Err(e) => {
                            error!("Pod watch failed: {e:?}");
                            if !pause_unless_cancelled(&cancellation_token, WATCH_RESTART_DELAY).await {
                                info!("Pod watcher shutdown requested");
                                break;
                            }
                        }
                    }
                }
            }

            if snapshot_sender.is_closed() {
                warn!("Pod event receiver dropped, stopping watcher");
                break;
            }
        }

        Ok(())
    }

    /// Watch pods and forward events.
    ///
    /// # Errors
    ///
    /// - [`KubernetesError::WatchFailed`] if the watch stream reports an error
    async fn watch_pods(
        &self,
        snapshot_sender: &mpsc::Sender<PodSnapshot>,
    ) -> Result<(), Report<KubernetesError>> {
        let api: Api<Pod> = match &self.scope.namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };

        let mut stream = watcher(api, self.scope.watcher_config())
            .applied_objects()
            .boxed();

        while let Some(event) = stream.next().await {
            match event {
                Ok(pod) => {
                    if !forward_pod(pod, snapshot_sender).await {
                        return Ok(());
                    }
                }
                Err(e) => {
                    return Err(Report::new(KubernetesError::WatchFailed {
                        message: format!("Watch stream error: {e}"),
                    }));
                }
            }
        }

        Ok(())
    }
}

/// Fetch a single Pod and convert it.
///
/// # Errors
///
/// - [`KubernetesError::PodNotFound`] if the Pod cannot be read
pub async fn get_pod_snapshot(
    client: Client,
    namespace: &str,
    pod_name: &str,
) -> Result<PodSnapshot, Report<KubernetesError>> {
    let api: Api<Pod> = Api::namespaced(client, namespace);

    let pod = api.get(pod_name).await.map_err(|e| {
        Report::new(KubernetesError::PodNotFound {
            pod_name: pod_name.to_string(),
            namespace: namespace.to_string(),
        })
        .attach_printable(format!("Kubernetes API error: {e}"))
    })?;

    Ok(PodSnapshot::from(pod))
}

/// Convert and send one Pod. Pods being deleted are skipped.
///
/// Returns `false` once the receiver is gone.
/// Sleep for `delay`. Returns `false` if the token fired first.
async fn pause_unless_cancelled(cancellation_token: &CancellationToken, delay: Duration) -> bool {
    select! {
        _ = cancellation_token.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}

async fn forward_pod(pod: Pod, snapshot_sender: &mpsc::Sender<PodSnapshot>) -> bool {
    if pod.metadata.deletion_timestamp.is_some() {
        debug!(pod = ?pod.metadata.name, "Skipping pod being deleted");
        return true;
    }

    if let Err(e) = snapshot_sender.send(PodSnapshot::from(pod)).await {
        warn!("Failed to send pod snapshot: {e}");
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::Pod;
    use k8s_openapi::api::core::v1::PodSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
    use k8s_openapi::chrono::Utc;
    use similar_asserts::assert_eq;
    use tokio::sync::mpsc;

    use super::*;

    fn create_test_pod(name: &str, annotations: BTreeMap<String, String>) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some("default".to_string()),
                annotations: Some(annotations),
                ..Default::default()
            },
            spec: Some(PodSpec::default()),
            status: None,
        }
    }

    #[tokio::test]
    async fn forward_pod_sends_snapshot() {
        let (tx, mut rx) = mpsc::channel(3);
        let mut annotations = BTreeMap::new();
        annotations.insert("otherguy.io/sidecars".to_string(), "proxy".to_string());

        assert!(forward_pod(create_test_pod("test-pod", annotations), &tx).await);

        let snapshot = rx.recv().await.unwrap();
        assert_eq!(snapshot.name, "test-pod");
        assert_eq!(
            snapshot.annotations.get("otherguy.io/sidecars").map(String::as_str),
            Some("proxy")
        );
    }

    #[tokio::test]
    async fn forward_pod_skips_deleted_pods() {
        let (tx, mut rx) = mpsc::channel(3);
        let mut pod = create_test_pod("test-pod", BTreeMap::new());
        pod.metadata.deletion_timestamp = Some(Time(Utc::now()));

        assert!(forward_pod(pod, &tx).await);

        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn forward_pod_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        assert!(!forward_pod(create_test_pod("test-pod", BTreeMap::new()), &tx).await);
    }

    #[test]
    fn watcher_config_applies_selectors() {
        let scope = WatchScope {
            namespace: None,
            node_name: Some("node-a".to_string()),
            label_selector: Some("app=batch".to_string()),
        };

        let config = scope.watcher_config();

        assert_eq!(config.label_selector.as_deref(), Some("app=batch"));
        assert_eq!(config.field_selector.as_deref(), Some("spec.nodeName=node-a"));
    }

    #[test]
    fn watcher_config_defaults_to_everything() {
        let config = WatchScope::default().watcher_config();

        assert_eq!(config.label_selector, None);
        assert_eq!(config.field_selector, None);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pause_ends_early_on_cancellation() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let started = tokio::time::Instant::now();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        assert!(!pause_unless_cancelled(&token, WATCH_RESTART_DELAY).await);
        assert!(started.elapsed() < WATCH_RESTART_DELAY);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_pause_waits_full_delay() {
        let token = CancellationToken::new();
        let started = tokio::time::Instant::now();

        assert!(pause_unless_cancelled(&token, WATCH_RESTART_DELAY).await);
        assert!(started.elapsed() >= WATCH_RESTART_DELAY);
    }
}
