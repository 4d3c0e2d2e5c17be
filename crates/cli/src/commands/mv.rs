//! mv command - Move a file
//!
//! Copies the file, then deletes the source. When the delete fails the file
//! exists at both paths and the command exits with a conflict.

use clap::Args;
use cosfs_core::CosAdapter;

use super::cp::report;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Move a file
#[derive(Args, Debug)]
pub struct MvArgs {
    /// Source path
    pub source: String,

    /// Destination path
    pub target: String,
}

/// Execute the mv command
pub async fn execute(args: MvArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match adapter.rename(&args.source, &args.target).await {
        Ok(()) => {
            report(&formatter, args.source, args.target);
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Failed to move {}", args.source), &e),
    }
}
