//! rm command - Remove files
//!
//! Removes one or more files. Directories go through `rmdir`.

use clap::Args;
use cosfs_core::CosAdapter;
use serde::Serialize;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Remove files
#[derive(Args, Debug)]
pub struct RmArgs {
    /// File path(s) to remove
    #[arg(required = true)]
    pub paths: Vec<String>,

    /// Ignore files that do not exist
    #[arg(short, long)]
    pub force: bool,

    /// Only show what would be deleted (dry run)
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    status: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    would_remove: Vec<String>,
    deleted: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    failed: Vec<String>,
    total: usize,
}

/// Execute the rm command
pub async fn execute(args: RmArgs, adapter: &CosAdapter, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let mut would_remove = Vec::new();
    let mut deleted = Vec::new();
    let mut failed = Vec::new();
    let mut exit_code = ExitCode::Success;

    for path in &args.paths {
        if path.trim_matches('/').is_empty() || path.ends_with('/') {
            formatter.error(&format!("{path} is a directory; use rmdir"));
            return ExitCode::UsageError;
        }

        if args.dry_run {
            if !formatter.is_json() {
                formatter.println(&format!("Would remove: {path}"));
            }
            would_remove.push(path.clone());
            continue;
        }

        match adapter.delete(path).await {
            Ok(()) => {
                if !formatter.is_json() {
                    formatter.println(&format!("Removed: {path}"));
                }
                deleted.push(path.clone());
            }
            Err(e) if e.is_not_found() && args.force => {}
            Err(e) => {
                formatter.error(&format!("Failed to remove {path}: {e}"));
                exit_code = ExitCode::from(&e);
                failed.push(path.clone());
            }
        }
    }

    if formatter.is_json() {
        let output = RmOutput {
            status: if failed.is_empty() { "success" } else { "partial" },
            dry_run: args.dry_run,
            total: deleted.len(),
            would_remove,
            deleted,
            failed,
        };
        formatter.json(&output);
    }

    exit_code
}
