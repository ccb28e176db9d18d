use std::process;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use gcp_shell::cli::Cli;
use gcp_shell::{launch, Config, GcpShellError, Supervisor};

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr: stdout belongs to the interactive ssh session.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(cli) {
        error!("{err}");
        if matches!(err, GcpShellError::Config(_)) {
            eprintln!("Try 'gcp-shell --help' for usage.");
        }
        process::exit(1);
    }
}

fn run(cli: Cli) -> gcp_shell::Result<()> {
    let config = Config::resolve(cli.zone, cli.local_port, &cli.target)?;
    launch::preflight()?;
    Supervisor::new(config).run()?;
    Ok(())
}
