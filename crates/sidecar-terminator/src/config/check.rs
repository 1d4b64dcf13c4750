use std::path::PathBuf;

use clap::Parser;

use crate::domain::annotations::DEFAULT_ANNOTATION_DOMAIN;

#[derive(Parser, Clone, Debug)]
pub struct CheckArgs {
    #[arg(help = "Name of the pod to evaluate")]
    pub pod_name: String,

    #[arg(long, short, default_value = "default", help = "Namespace of the pod")]
    pub namespace: String,

    #[arg(
        long,
        env = "KUBECONFIG_PATH",
        value_hint = clap::ValueHint::FilePath,
        help = "Path to a kubeconfig file, defaults to in-cluster config or ~/.kube/config"
    )]
    pub kubeconfig: Option<PathBuf>,

    #[arg(
        long,
        env = "SIDECAR_ANNOTATION_DOMAIN",
        default_value = DEFAULT_ANNOTATION_DOMAIN,
        help = "Domain of the <domain>/sidecars annotation"
    )]
    pub annotation_domain: String,
}
