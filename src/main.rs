mod cli;
mod commands;
mod util;

use anyhow::Result;
use clap::Parser;
use tabrecon::ReconcileConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = ReconcileConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Stitch(args) => commands::stitch::run(args, &config),
        Commands::Signature(args) => commands::signature::run(args),
        Commands::Recognize(args) => commands::recognize::run(args, &config),
        Commands::Learn(args) => commands::learn::run(args, &config),
        Commands::Profiles(args) => commands::profiles::run(args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
