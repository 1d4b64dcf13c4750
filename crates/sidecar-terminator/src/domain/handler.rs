//! Per-event pipeline: annotation, classification, decision, dispatch.

use std::collections::BTreeSet;

use tracing::debug;
use tracing::info;

use crate::domain::annotations::SidecarAnnotation;
use crate::domain::classifier::classify;
use crate::domain::classifier::ContainerSets;
use crate::domain::dispatcher::CommandTransport;
use crate::domain::dispatcher::ShutdownDispatcher;
use crate::domain::predicate;
use crate::domain::predicate::Decision;
use crate::domain::snapshot::PodSnapshot;

/// Everything derived from one trackable Pod snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub sidecars: BTreeSet<String>,
    pub containers: ContainerSets,
    pub decision: Decision,
}

/// Evaluate a snapshot without side effects.
///
/// Returns `None` when the Pod carries no sidecar annotation, or when the
/// annotation names no containers.
pub fn evaluate(annotation: &SidecarAnnotation, pod: &PodSnapshot) -> Option<Evaluation> {
    let sidecars = annotation.sidecars(&pod.annotations)?;
    if sidecars.is_empty() {
        debug!(key = annotation.key(), "Sidecar annotation lists no containers");
        return None;
    }

    let containers = classify(&pod.container_statuses);
    let decision = predicate::evaluate(&containers, &sidecars);

    Some(Evaluation {
        sidecars,
        containers,
        decision,
    })
}

/// Reacts to observed Pods by stopping their sidecars once the primary
/// containers are done.
pub struct SidecarShutdownHandler<T> {
    annotation: SidecarAnnotation,
    dispatcher: ShutdownDispatcher<T>,
    dry_run: bool,
}

impl<T: CommandTransport> SidecarShutdownHandler<T> {
    pub fn new(annotation: SidecarAnnotation, dispatcher: ShutdownDispatcher<T>) -> Self {
        Self {
            annotation,
            dispatcher,
            dry_run: false,
        }
    }

    /// Log decisions without sending any signal.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn evaluate(&self, pod: &PodSnapshot) -> Option<Evaluation> {
        evaluate(&self.annotation, pod)
    }

    /// Handle one observed Pod. Never fails; outcomes are only logged.
    #[tracing::instrument(skip_all, fields(pod = %pod.name, namespace = %pod.namespace))]
    pub async fn on_pod_observed(&self, pod: &PodSnapshot) {
        let Some(evaluation) = self.evaluate(pod) else {
            return;
        };

        debug!("Pod is trackable");
        info!(
            sidecars = ?evaluation.sidecars,
            node = pod.node_name.as_deref().unwrap_or("<unscheduled>"),
            phase = pod.phase.as_deref().unwrap_or("<unknown>"),
            "Observed pod with sidecars"
        );
        debug!(
            all = ?evaluation.containers.all,
            running = ?evaluation.containers.running,
            completed = ?evaluation.containers.completed,
            indeterminate = ?evaluation.containers.indeterminate(),
            exit_codes = ?pod.exit_codes(),
            decision = %evaluation.decision,
            "Classified containers"
        );

        if !evaluation.decision.should_shutdown() {
            return;
        }

        if self.dry_run {
            info!(sidecars = ?evaluation.sidecars, "Dry run, not sending shutdown signal");
            return;
        }

        self.dispatcher
            .dispatch(&pod.pod_ref(), &evaluation.sidecars)
            .await;
    }
}
