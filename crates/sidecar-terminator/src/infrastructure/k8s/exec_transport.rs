use async_trait::async_trait;
use error_stack::Report;
use error_stack::ResultExt;
use k8s_openapi::api::core::v1::Pod;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Status;
use kube::api::AttachParams;
use kube::Api;
use kube::Client;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::domain::dispatcher::CommandTransport;
use crate::domain::dispatcher::TransportError;
use crate::domain::snapshot::PodRef;

/// Runs commands through the Pod `exec` subresource.
#[derive(Clone)]
pub struct KubeExecTransport {
    client: Client,
}

impl KubeExecTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandTransport for KubeExecTransport {
    async fn exec(
        &self,
        pod: &PodRef,
        container: &str,
        command: &[&str],
    ) -> Result<(), Report<TransportError>> {
        let exec_failed = || TransportError::ExecFailed {
            pod: pod.to_string(),
            container: container.to_string(),
        };

        let api: Api<Pod> = Api::namespaced(self.client.clone(), &pod.namespace);
        let params = AttachParams::default()
            .container(container)
            .stdin(false)
            .stdout(false)
            .stderr(true);

        debug!(pod = %pod, container, ?command, "Executing command");
        let mut process = api
            .exec(&pod.name, command.to_vec(), &params)
            .await
            .change_context_lazy(exec_failed)?;

        let mut stderr = String::new();
        if let Some(mut reader) = process.stderr() {
            // the stream may be cut short when the init process dies
            if let Err(e) = reader.read_to_string(&mut stderr).await {
                debug!(pod = %pod, container, "Reading stderr stopped: {e}");
            }
        }

        let status = match process.take_status() {
            Some(status) => status.await,
            None => None,
        };
        process.join().await.change_context_lazy(exec_failed)?;

        check_status(pod, container, status, &stderr)
    }
}

/// A session that closes without a status counts as delivered: the target
/// process was the one we asked to stop.
fn check_status(
    pod: &PodRef,
    container: &str,
    status: Option<Status>,
    stderr: &str,
) -> Result<(), Report<TransportError>> {
    match status {
        Some(status) if status.status.as_deref() == Some("Failure") => {
            Err(Report::new(TransportError::CommandFailed {
                pod: pod.to_string(),
                container: container.to_string(),
                message: status
                    .message
                    .unwrap_or_else(|| "unknown failure".to_string()),
            })
            .attach_printable(format!("stderr: {}", stderr.trim())))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(value: &str, message: Option<&str>) -> Status {
        Status {
            status: Some(value.to_string()),
            message: message.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn success_status_is_delivered() {
        let pod = PodRef::new("batch", "job-1");

        assert!(check_status(&pod, "proxy", Some(status("Success", None)), "").is_ok());
    }

    #[test]
    fn missing_status_is_delivered() {
        let pod = PodRef::new("batch", "job-1");

        assert!(check_status(&pod, "proxy", None, "").is_ok());
    }

    #[test]
    fn failure_status_is_an_error() {
        let pod = PodRef::new("batch", "job-1");

        let report = check_status(
            &pod,
            "proxy",
            Some(status("Failure", Some("command terminated with non-zero exit code"))),
            "sh: not found\n",
        )
        .unwrap_err();

        let rendered = format!("{report:?}");
        assert!(rendered.contains("command terminated with non-zero exit code"));
        assert!(rendered.contains("stderr: sh: not found"));
    }
}
