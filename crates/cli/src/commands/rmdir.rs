//! rmdir command - Remove a directory's files
//!
//! Deletes every file directly under the directory in one batch request.
//! Nested directories are left in place.

use clap::Args;
use cosfs_core::{CosAdapter, Error};
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove every file directly under a directory
#[derive(Args, Debug)]
pub struct RmdirArgs {
    /// Directory path
    pub path: String,
}

#[derive(Debug, Serialize)]
struct RmdirOutput {
    status: &'static str,
    directory: String,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
}

/// Execute the rmdir command
pub async fn execute(
    args: RmdirArgs,
    adapter: &CosAdapter,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let (deleted, failed, exit_code) = match adapter.delete_dir(&args.path).await {
        Ok(outcome) => (outcome.deleted, outcome.failed, ExitCode::Success),
        Err(Error::PartialBatchFailure { deleted, failed }) => {
            formatter.error(&format!(
                "Failed to delete {} of {} file(s) under {}",
                failed.len(),
                failed.len() + deleted.len(),
                args.path
            ));
            (deleted, failed, ExitCode::Conflict)
        }
        Err(e) => return formatter.fail(&format!("Failed to remove {}", args.path), &e),
    };

    if formatter.is_json() {
        let output = RmdirOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            directory: args.path,
            deleted,
            failed,
        };
        formatter.json(&output);
    } else if exit_code == ExitCode::Success {
        formatter.success(&format!(
            "Removed {} file(s) under {}",
            deleted.len(),
            args.path
        ));
    }

    exit_code
}
