//! In-memory [`CommandTransport`] for tests.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use error_stack::Report;

use crate::domain::dispatcher::CommandTransport;
use crate::domain::dispatcher::TransportError;
use crate::domain::snapshot::PodRef;

/// Records every exec and fails on demand.
#[derive(Default)]
pub(crate) struct MockTransport {
    /// containers whose exec always fails
    always_failing: BTreeSet<String>,
    /// number of failures before each container succeeds
    failures_before_success: u32,
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<(String, String, String)>,
    attempts: HashMap<String, u32>,
    delivered: Vec<String>,
}

impl MockTransport {
    pub(crate) fn failing_for(containers: &[&str]) -> Self {
        Self {
            always_failing: containers.iter().map(|c| c.to_string()).collect(),
            ..Default::default()
        }
    }

    pub(crate) fn flaky(failures_before_success: u32) -> Self {
        Self {
            failures_before_success,
            ..Default::default()
        }
    }

    /// `(pod, container, command)` for every attempt, in call order.
    pub(crate) fn calls(&self) -> Vec<(String, String, String)> {
        self.state.lock().expect("mock state").calls.clone()
    }

    pub(crate) fn attempts_for(&self, container: &str) -> u32 {
        self.state
            .lock()
            .expect("mock state")
            .attempts
            .get(container)
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn delivered(&self) -> Vec<String> {
        self.state.lock().expect("mock state").delivered.clone()
    }
}

#[async_trait]
impl CommandTransport for MockTransport {
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &[&str],
    ) -> Result<(), Report<TransportError>> {
        let mut state = self.state.lock().expect("mock state");
        state
            .calls
            .push((pod.to_string(), container.to_string(), command.join(" ")));
        let attempt = {
            let attempts = state.attempts.entry(container.to_string()).or_insert(0);
            *attempts += 1;
            *attempts
        };

        if self.always_failing.contains(container) || attempt <= self.failures_before_success {
            return Err(Report::new(TransportError::ExecFailed {
                pod: pod.to_string(),
                container: container.to_string(),
            }));
        }

        state.delivered.push(container.to_string());
        Ok(())
    }
}
