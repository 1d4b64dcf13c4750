//! Statically typed view of a Pod at event time.
//!
//! The watcher converts every `k8s_openapi` Pod into a [`PodSnapshot`] before
//! anything in the decision pipeline sees it.

use std::collections::BTreeMap;

/// Namespaced identity of a Pod.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{namespace}/{name}")]
pub struct PodRef {
    pub namespace: String,
    pub name: String,
}

impl PodRef {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Terminal state reported by the kubelet for a container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Termination {
    /// Short machine readable reason, e.g. `Completed`, `Error`, `OOMKilled`
    pub reason: Option<String>,
    pub exit_code: i32,
}

/// Status of a single container within a Pod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerStatus {
    pub name: String,
    pub ready: bool,
    pub termination: Option<Termination>,
}

impl ContainerStatus {
    /// A container that is not ready and has not terminated.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ready: false,
            termination: None,
        }
    }

    pub fn ready(mut self) -> Self {
        self.ready = true;
        self
    }

    pub fn terminated(mut self, reason: impl Into<String>, exit_code: i32) -> Self {
        self.termination = Some(Termination {
            reason: Some(reason.into()),
            exit_code,
        });
        self
    }

    /// Reason of the terminal state, if the container has terminated with one.
    pub fn termination_reason(&self) -> Option<&str> {
        self.termination.as_ref()?.reason.as_deref()
    }
}

/// Immutable view of one Pod.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PodSnapshot {
    pub name: String,
    pub namespace: String,
    pub node_name: Option<String>,
    pub phase: Option<String>,
    pub annotations: BTreeMap<String, String>,
    pub container_statuses: Vec<ContainerStatus>,
}

impl PodSnapshot {
    pub fn pod_ref(&self) -> PodRef {
        PodRef::new(&self.namespace, &self.name)
    }

    /// Exit codes of the containers that have terminated, keyed by name.
    pub fn exit_codes(&self) -> BTreeMap<&str, i32> {
        self.container_statuses
            .iter()
            .filter_map(|status| {
                let termination = status.termination.as_ref()?;
                Some((status.name.as_str(), termination.exit_code))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn pod_ref_displays_namespace_and_name() {
        let pod = PodSnapshot {
            name: "job-abc".to_string(),
            namespace: "batch".to_string(),
            ..Default::default()
        };

        assert_eq!(pod.pod_ref().to_string(), "batch/job-abc");
    }

    #[test]
    fn termination_reason_requires_terminal_state() {
        assert_eq!(ContainerStatus::new("app").termination_reason(), None);
        assert_eq!(
            ContainerStatus::new("app")
                .terminated("OOMKilled", 137)
                .termination_reason(),
            Some("OOMKilled")
        );
    }

    #[test]
    fn exit_codes_only_cover_terminated_containers() {
        let pod = PodSnapshot {
            container_statuses: vec![
                ContainerStatus::new("app").terminated("Error", 2),
                ContainerStatus::new("proxy").ready(),
                ContainerStatus::new("init-db").terminated("Completed", 0),
                ContainerStatus::new("pending"),
            ],
            ..Default::default()
        };

        assert_eq!(
            pod.exit_codes(),
            BTreeMap::from([("app", 2), ("init-db", 0)])
        );
    }
}
