use std::collections::BTreeSet;

use anyhow::Result;
use clap::Parser;
use sidecar_terminator::app::ApplicationBuilder;
use sidecar_terminator::config::CheckArgs;
use sidecar_terminator::config::Cli;
use sidecar_terminator::config::Commands;
use sidecar_terminator::config::DaemonArgs;
use sidecar_terminator::domain::handler;
use sidecar_terminator::domain::SidecarAnnotation;
use sidecar_terminator::k8s;
use sidecar_terminator::kube_client;
use utils::logging;
use utils::version;

/// Sets up global panic hooks.
fn setup_global_hooks() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        default_hook(panic_info);
        tracing::error!("Thread panicked: {}", panic_info);
    }));
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_global_hooks();

    let cli = Cli::parse();
    logging::init(cli.log_format);

    match cli.command {
        Commands::Daemon(daemon_args) => run_daemon(*daemon_args).await,
        Commands::Check(check_args) => run_check(check_args).await,
    }
}

async fn run_daemon(daemon_args: DaemonArgs) -> Result<()> {
    tracing::info!("Starting sidecar-terminator daemon {}", &**version::VERSION);

    let app = ApplicationBuilder::new(daemon_args).build().await?;

    app.run().await
}

async fn run_check(check_args: CheckArgs) -> Result<()> {
    let client = kube_client::init_kube_client(check_args.kubeconfig.clone())
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let pod = k8s::get_pod_snapshot(client, &check_args.namespace, &check_args.pod_name)
        .await
        .map_err(|e| anyhow::anyhow!("{e:?}"))?;

    let annotation = SidecarAnnotation::new(&check_args.annotation_domain);
    let Some(evaluation) = handler::evaluate(&annotation, &pod) else {
        println!(
            "{}: not tracked, no containers listed in {}",
            pod.pod_ref(),
            annotation.key()
        );
        return Ok(());
    };

    println!("pod       : {}", pod.pod_ref());
    println!("sidecars  : {}", join(&evaluation.sidecars));
    println!("all       : {}", join(&evaluation.containers.all));
    println!("running   : {}", join(&evaluation.containers.running));
    println!("completed : {}", join(&evaluation.containers.completed));
    println!("decision  : {}", evaluation.decision);
    println!("shutdown  : {}", evaluation.decision.should_shutdown());

    Ok(())
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(",")
}
