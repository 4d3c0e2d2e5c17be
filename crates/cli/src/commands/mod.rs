//! CLI command definitions and execution
//!
//! Every subcommand runs against one [`CosAdapter`] built from the loaded
//! configuration. Paths on the command line are logical paths under the
//! configured prefix.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use cosfs_core::{ConfigManager, CosAdapter};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cat;
mod cp;
mod ls;
mod mkdir;
mod mv;
mod put;
mod rm;
mod rmdir;
mod stat;
mod url;
mod visibility;

/// cosfs - filesystem-style access to a COS bucket
///
/// Reads the bucket, region and credentials from a TOML configuration file.
#[derive(Parser, Debug)]
#[command(name = "cosfs")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to $COSFS_CONFIG, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List files and directories
    Ls(ls::LsArgs),

    /// Print file contents to stdout
    Cat(cat::CatArgs),

    /// Upload a local file (or stdin) to a path
    Put(put::PutArgs),

    /// Remove files
    Rm(rm::RmArgs),

    /// Remove every file directly under a directory
    Rmdir(rmdir::RmdirArgs),

    /// Create a directory marker
    Mkdir(mkdir::MkdirArgs),

    /// Copy a file server-side
    Cp(cp::CpArgs),

    /// Move a file (copy + delete source)
    Mv(mv::MvArgs),

    /// Show file metadata
    Stat(stat::StatArgs),

    /// Show or change file visibility
    #[command(subcommand)]
    Visibility(visibility::VisibilityCommands),

    /// Print a public, CDN or signed URL for a file
    Url(url::UrlArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let adapter = match open_adapter(cli.config.as_deref()).await {
        Ok(adapter) => adapter,
        Err(e) => {
            Formatter::new(output_config).error(&format!("{e:#}"));
            return exit_code_for(&e);
        }
    };

    match cli.command {
        Commands::Ls(args) => ls::execute(args, &adapter, output_config).await,
        Commands::Cat(args) => cat::execute(args, &adapter, output_config).await,
        Commands::Put(args) => put::execute(args, &adapter, output_config).await,
        Commands::Rm(args) => rm::execute(args, &adapter, output_config).await,
        Commands::Rmdir(args) => rmdir::execute(args, &adapter, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, &adapter, output_config).await,
        Commands::Cp(args) => cp::execute(args, &adapter, output_config).await,
        Commands::Mv(args) => mv::execute(args, &adapter, output_config).await,
        Commands::Stat(args) => stat::execute(args, &adapter, output_config).await,
        Commands::Visibility(cmd) => visibility::execute(cmd, &adapter, output_config).await,
        Commands::Url(args) => url::execute(args, &adapter, output_config).await,
    }
}

/// Load the configuration and connect to the bucket
async fn open_adapter(config_path: Option<&Path>) -> anyhow::Result<CosAdapter> {
    let manager = match config_path {
        Some(path) => ConfigManager::with_path(path.to_path_buf()),
        None => ConfigManager::new()?,
    };

    let config = manager.load().with_context(|| {
        format!(
            "Failed to load configuration from {}",
            manager.config_path().display()
        )
    })?;

    tracing::debug!(bucket = %config.full_bucket(), region = %config.region, "connecting");
    let adapter = cosfs_cos::connect(config)
        .await
        .context("Failed to create COS client")?;
    Ok(adapter)
}

/// Exit code for an error raised while setting up
fn exit_code_for(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<cosfs_core::Error>()
        .map(ExitCode::from)
        .unwrap_or(ExitCode::GeneralError)
}

/// Human-readable byte count
pub(crate) fn human_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
