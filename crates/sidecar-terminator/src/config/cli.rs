use clap::{Parser, Subcommand};
use utils::logging::LogFormat;
use utils::version;

use crate::config::check::CheckArgs;
use crate::config::daemon::DaemonArgs;

#[derive(Parser)]
#[command(about, long_about, version = &**version::VERSION)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Text,
        help = "Log output format"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Watch pods and stop their sidecars once the main containers finish
    Daemon(Box<DaemonArgs>),
    /// Evaluate a single pod and print the decision without signalling
    Check(CheckArgs),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_format_is_global() {
        let cli = Cli::try_parse_from([
            "sidecar-terminator",
            "check",
            "job-1",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(cli.command, Commands::Check(_)));
    }
}
