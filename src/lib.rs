pub mod core;

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;

/// Parse arguments, run one command and return the process exit code.
pub fn run() -> i32 {
    let cli = Cli::parse();

    // Logs go to stderr so command output on stdout stays clean.
    let default_filter = if cli.verbose {
        "info,modsync=debug"
    } else {
        "warn,modsync=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {e}");
            return 1;
        }
    };

    match runtime.block_on(commands::dispatch(cli)) {
        Ok(true) => 0,
        Ok(false) => 2,
        Err(e) => {
            tracing::debug!("{:?}", e);
            eprintln!("Error: {e}");
            1
        }
    }
}
