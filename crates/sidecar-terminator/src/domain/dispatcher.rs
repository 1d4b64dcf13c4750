//! Delivers the termination command to every sidecar of a Pod.

use core::error::Error;
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::Report;
use futures::future::join_all;
use tracing::error;
use tracing::info;

use crate::domain::retry::RetryPolicy;
use crate::domain::snapshot::PodRef;

/// Asks the container's init process to shut down gracefully.
pub const SHUTDOWN_COMMAND: [&str; 3] = ["sh", "-c", "kill -s TERM 1"];

/// Errors reported by a [`CommandTransport`].
#[derive(Debug, derive_more::Display)]
pub enum TransportError {
    #[display("Failed to exec into container {container} of pod {pod}")]
    ExecFailed { pod: String, container: String },
    #[display("Command failed in container {container} of pod {pod}: {message}")]
    CommandFailed {
        pod: String,
        container: String,
        message: String,
    },
}

impl Error for TransportError {}

/// Runs a command inside one container of a Pod.
///
/// Connection setup and credentials are the implementor's concern.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &[&str],
    ) -> Result<(), Report<TransportError>>;
}

/// Sends [`SHUTDOWN_COMMAND`] to sidecar containers.
pub struct ShutdownDispatcher<T> {
    transport: Arc<T>,
    retry_policy: RetryPolicy,
}

impl<T: CommandTransport> ShutdownDispatcher<T> {
    pub fn new(transport: Arc<T>, retry_policy: RetryPolicy) -> Self {
        Self {
            transport,
            retry_policy,
        }
    }

    /// Signal each sidecar, concurrently and independently.
    ///
    /// A sidecar whose delivery keeps failing is logged and abandoned; the
    /// others are unaffected. Nothing is reported back to the caller.
    pub async fn dispatch(&self, pod: &PodRef, sidecars: &BTreeSet<String>) {
        info!(pod = %pod, ?sidecars, "Sending shutdown signal to sidecars");

        join_all(
            sidecars
                .iter()
                .map(|container| self.deliver(pod, container)),
        )
        .await;
    }

    async fn deliver(&self, pod: &PodRef, container: &str) {
        let transport = self.transport.as_ref();
        let result = self
            .retry_policy
            .run(move || transport.exec(pod, container, &SHUTDOWN_COMMAND))
            .await;

        match result {
            Ok(()) => info!(pod = %pod, container, "Shutdown signal delivered"),
            Err(e) => error!(
                pod = %pod,
                container,
                "Giving up on shutdown signal: {e:?}"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;
    use test_log::test;

    use super::*;
    use crate::domain::mock::MockTransport;

    fn set(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test(tokio::test)]
    async fn dispatch_sends_shutdown_command_to_each_sidecar() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher = ShutdownDispatcher::new(transport.clone(), RetryPolicy::immediate(5));

        dispatcher
            .dispatch(&PodRef::new("batch", "job-1"), &set(&["logger", "proxy"]))
            .await;

        let mut calls = transport.calls();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                (
                    "batch/job-1".to_string(),
                    "logger".to_string(),
                    "sh -c kill -s TERM 1".to_string()
                ),
                (
                    "batch/job-1".to_string(),
                    "proxy".to_string(),
                    "sh -c kill -s TERM 1".to_string()
                ),
            ]
        );
    }

    #[test(tokio::test)]
    async fn exhausted_sidecar_does_not_block_others() {
        let transport = Arc::new(MockTransport::failing_for(&["proxy"]));
        let dispatcher = ShutdownDispatcher::new(transport.clone(), RetryPolicy::immediate(5));

        dispatcher
            .dispatch(&PodRef::new("batch", "job-1"), &set(&["logger", "proxy"]))
            .await;

        assert_eq!(transport.attempts_for("proxy"), 5);
        assert_eq!(transport.attempts_for("logger"), 1);
        assert_eq!(transport.delivered(), vec!["logger".to_string()]);
    }

    #[test(tokio::test)]
    async fn transient_failure_is_retried() {
        let transport = Arc::new(MockTransport::flaky(2));
        let dispatcher = ShutdownDispatcher::new(transport.clone(), RetryPolicy::immediate(5));

        dispatcher
            .dispatch(&PodRef::new("default", "job-2"), &set(&["proxy"]))
            .await;

        assert_eq!(transport.attempts_for("proxy"), 3);
        assert_eq!(transport.delivered(), vec!["proxy".to_string()]);
    }

    #[test(tokio::test)]
    async fn empty_sidecar_set_sends_nothing() {
        let transport = Arc::new(MockTransport::default());
        let dispatcher = ShutdownDispatcher::new(transport.clone(), RetryPolicy::immediate(5));

        dispatcher
            .dispatch(&PodRef::new("default", "job-3"), &BTreeSet::new())
            .await;

        assert!(transport.calls().is_empty());
    }
}
