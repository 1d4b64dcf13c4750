use k8s_openapi::api::core::v1 as core_v1;
use k8s_openapi::api::core::v1::Pod;

use crate::domain::snapshot::ContainerStatus;
use crate::domain::snapshot::PodSnapshot;
use crate::domain::snapshot::Termination;

impl From<&core_v1::ContainerStatus> for ContainerStatus {
    fn from(status: &core_v1::ContainerStatus) -> Self {
        let termination = status
            .state
            .as_ref()
            .and_then(|state| state.terminated.as_ref())
            .map(|terminated| Termination {
                reason: terminated.reason.clone(),
                exit_code: terminated.exit_code,
            });

        Self {
            name: status.name.clone(),
            ready: status.ready,
            termination,
        }
    }
}

impl From<Pod> for PodSnapshot {
    fn from(pod: Pod) -> Self {
        let metadata = pod.metadata;
        let status = pod.status.unwrap_or_default();

        Self {
            name: metadata.name.unwrap_or_else(|| "unknown".to_string()),
            namespace: metadata.namespace.unwrap_or_else(|| "default".to_string()),
            node_name: pod.spec.and_then(|spec| spec.node_name),
            phase: status.phase,
            annotations: metadata.annotations.unwrap_or_default(),
            container_statuses: status
                .container_statuses
                .iter()
                .flatten()
                .map(ContainerStatus::from)
                .collect(),
        }
    }
}
