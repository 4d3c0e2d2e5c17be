//! cosfs - filesystem-style CLI for Tencent Cloud COS
//!
//! A command-line interface over a single COS bucket, with paths resolved
//! under an optional root prefix.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cosfs_cli::commands::{self, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG wins; --debug only changes the default level
    let default_level = if cli.debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let exit_code = commands::execute(cli).await;

    std::process::exit(exit_code.as_i32());
}
