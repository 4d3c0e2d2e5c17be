//! mkdir command - Create a directory marker

use clap::Args;
use cosfs_core::{CosAdapter, WriteOptions};

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Create a directory marker
#[derive(Args, Debug)]
pub struct MkdirArgs {
    /// Directory path
    pub path: String,
}

/// Execute the mkdir command
pub async fn execute(
    args: MkdirArgs,
    adapter: &CosAdapter,
    output_config: OutputConfig,
) -> ExitCode {
    let formatter = Formatter::new(output_config);

    match adapter.create_dir(&args.path, WriteOptions::default()).await {
        Ok(()) => {
            if formatter.is_json() {
                formatter.json(&serde_json::json!({
                    "status": "success",
                    "directory": args.path,
                }));
            } else {
                formatter.success(&format!("Created {}", args.path));
            }
            ExitCode::Success
        }
        Err(e) => formatter.fail(&format!("Failed to create {}", args.path), &e),
    }
}
