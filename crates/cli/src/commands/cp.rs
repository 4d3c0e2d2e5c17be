//! cp command - Copy a file
//!
//! Server-side copy within the bucket; the data never passes through the client.

use clap::Args;
use cosfs_core::CosAdapter;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Copy a file server-side
#[derive(Args, Debug)]
pub struct CpArgs {
    /// Source path
    pub source: String,

    /// Destination path
    pub target: String,
}

#[derive(Debug, Serialize)]
pub(super) struct TransferOutput {
    pub status: &'static str,
    pub source: String,
    pub target: String,
}

/// Execute the cp command
pub async fn execute(args: CpArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match adapter.copy(&args.source, &args.target).await {
        Ok(()) => {
            report(&formatter, args.source, args.target);
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Failed to copy {}", args.source), &e),
    }
}

/// Print a completed `source -> target` transfer
pub(super) fn report(formatter: &Formatter, source: String, target: String) {
    if formatter.is_json() {
        formatter.json(&TransferOutput {
            status: "success",
            source,
            target,
        });
    } else {
        formatter.println(&format!("{source} -> {target}"));
    }
}
