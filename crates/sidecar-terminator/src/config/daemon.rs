use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::annotations::DEFAULT_ANNOTATION_DOMAIN;
use crate::domain::retry;
use crate::domain::retry::RetryPolicy;
use crate::domain::SidecarAnnotation;
use crate::infrastructure::k8s::WatchScope;

#[derive(Parser, Clone, Debug)]
pub struct DaemonArgs {
    #[arg(
        long,
        env = "KUBECONFIG_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to a kubeconfig file, defaults to in-cluster config or ~/.kube/config"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "WATCH_NAMESPACE",
        help = "Only watch pods in this namespace, defaults to all namespaces"
    )]
    pub namespace: Option<String>,

    #[arg(
        long,
        env = "NODE_NAME",
        help = "Only watch pods scheduled on this node"
    )]
    pub node_name: Option<String>,

    #[arg(
        long,
        env = "POD_LABEL_SELECTOR",
        help = "Label selector restricting the watched pods, e.g. app=batch"
    )]
    pub label_selector: Option<String>,

    #[arg(
        long,
        env = "SIDECAR_ANNOTATION_DOMAIN",
        default_value = DEFAULT_ANNOTATION_DOMAIN,
        help = "Domain of the <domain>/sidecars annotation"
    )]
    pub annotation_domain: String,

    #[arg(
        long,
        env = "SIDECAR_RETRY_ATTEMPTS",
        default_value_t = retry::DEFAULT_MAX_ATTEMPTS,
        help = "Attempts to deliver the shutdown signal to each sidecar"
    )]
    pub retry_attempts: u32,

    #[arg(
        long,
        env = "SIDECAR_RETRY_DELAY_SECS",
        default_value_t = retry::DEFAULT_DELAY.as_secs(),
        help = "Seconds to wait between delivery attempts"
    )]
    pub retry_delay_secs: u64,

    #[arg(
        long,
        env = "SIDECAR_DRY_RUN",
        help = "Log shutdown decisions without signalling any container"
    )]
    pub dry_run: bool,
}

impl DaemonArgs {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_attempts,
            Duration::from_secs(self.retry_delay_secs),
        )
    }

    pub fn sidecar_annotation(&self) -> SidecarAnnotation {
        SidecarAnnotation::new(&self.annotation_domain)
    }

    pub fn watch_scope(&self) -> WatchScope {
        WatchScope {
            namespace: self.namespace.clone(),
            node_name: self.node_name.clone(),
            label_selector: self.label_selector.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn defaults_match_fixed_policy() {
        let args = DaemonArgs::try_parse_from(["daemon"]).unwrap();

        assert_eq!(args.retry_policy(), RetryPolicy::default());
        assert_eq!(args.sidecar_annotation().key(), "otherguy.io/sidecars");
        assert!(!args.dry_run);
    }

    #[test]
    fn overrides_from_flags() {
        let args = DaemonArgs::try_parse_from([
            "daemon",
            "--retry-attempts",
            "2",
            "--retry-delay-secs",
            "0",
            "--annotation-domain",
            "example.com",
            "--node-name",
            "node-a",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(args.retry_policy(), RetryPolicy::immediate(2));
        assert_eq!(args.sidecar_annotation().key(), "example.com/sidecars");
        assert_eq!(args.watch_scope().node_name.as_deref(), Some("node-a"));
        assert!(args.dry_run);
    }
}
